//! Error taxonomy shared by the parser, PathGuard, handlers and the executor.
//!
//! Nothing here ever reaches the IPC caller as a fault: every variant is
//! turned into a [`CommandResult`](crate::exec::CommandResult) at the
//! handler or backend boundary, using [`ShellError::exit_code`].

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    /// Malformed IPC payload or oversize input.
    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    #[error("Unsafe protocol: {0}. Only http: and https: are allowed")]
    UnsafeProtocol(String),

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// A file, response body or pipeline exceeded one of the fixed limits.
    #[error("{what} exceeds {limit} {unit} limit")]
    ResourceLimit {
        what: String,
        limit: usize,
        unit: &'static str,
    },

    #[error("Operation aborted")]
    Aborted,

    #[error("{op}: {source}")]
    Io {
        op: String,
        #[source]
        source: io::Error,
    },

    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),
}

impl ShellError {
    /// Wrap an I/O error with the operation that produced it.
    pub fn io(op: impl Into<String>, source: io::Error) -> Self {
        ShellError::Io {
            op: op.into(),
            source,
        }
    }

    /// Byte-denominated [`ShellError::ResourceLimit`].
    pub fn too_large(what: impl Into<String>, limit: usize) -> Self {
        ShellError::ResourceLimit {
            what: what.into(),
            limit,
            unit: "bytes",
        }
    }

    /// Shell exit status for this error: 127 for unknown commands, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::CommandNotFound(_) => 127,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_127() {
        assert_eq!(ShellError::CommandNotFound("x".into()).exit_code(), 127);
    }

    #[test]
    fn everything_else_is_1() {
        assert_eq!(ShellError::Aborted.exit_code(), 1);
        assert_eq!(ShellError::InvalidUrl.exit_code(), 1);
        assert_eq!(ShellError::too_large("file", 10).exit_code(), 1);
    }

    #[test]
    fn limit_message_names_the_limit() {
        let e = ShellError::too_large("Response body", 51200);
        assert_eq!(e.to_string(), "Response body exceeds 51200 bytes limit");
    }

    #[test]
    fn io_message_keeps_cause() {
        let e = ShellError::io(
            "read a.txt",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(e.to_string(), "read a.txt: gone");
    }
}
