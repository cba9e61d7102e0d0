use serde::Serialize;

use crate::error::ShellError;

/// Outcome of a stage or of a whole pipeline. Plain value, no identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// Empty success: what a no-op input returns.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Failure whose stderr is `<prefix>: <error>` and whose exit code
    /// follows the error class.
    pub fn from_error(prefix: &str, err: &ShellError) -> Self {
        Self::failure(err.exit_code(), format!("{prefix}: {err}"))
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_ipc_field_names() {
        let json = serde_json::to_value(CommandResult::failure(127, "nope")).unwrap();
        assert_eq!(json["exitCode"], 127);
        assert_eq!(json["stderr"], "nope");
        assert_eq!(json["stdout"], "");
    }

    #[test]
    fn from_error_prefixes_and_maps_code() {
        let r = CommandResult::from_error("cat", &ShellError::Aborted);
        assert_eq!(r.stderr, "cat: Operation aborted");
        assert_eq!(r.exit_code, 1);
    }
}
