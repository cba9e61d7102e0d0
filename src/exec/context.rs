use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ShellError;
use crate::jobs::JobManager;
use crate::limits::MAX_FILE_READ_BYTES;
use crate::security::resolve_safe_path;

/// Coarse permission classification. A heuristic, not an OS boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Admin,
    Standard,
}

impl PermissionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Admin => "admin",
            PermissionLevel::Standard => "standard",
        }
    }

    pub fn is_admin(self) -> bool {
        self == PermissionLevel::Admin
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(PermissionLevel::Admin),
            "standard" => Ok(PermissionLevel::Standard),
            other => Err(format!("unknown permission level: {other}")),
        }
    }
}

/// Cooperative cancellation flag shared between a job and whoever kills it.
///
/// Cloning shares the flag. Long-running operations call [`check`](Self::check)
/// at each suspension point and bail out with [`ShellError::Aborted`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), ShellError> {
        if self.is_cancelled() {
            Err(ShellError::Aborted)
        } else {
            Ok(())
        }
    }
}

/// Per-invocation execution state.
///
/// A foreground invocation gets a context seeded from the session; a
/// background job gets its own snapshot. `working_directory` is updated in
/// place by `cd` so later stages see the change.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub permission_level: PermissionLevel,
    /// Always absolute.
    pub working_directory: PathBuf,
    /// Input for the stage currently running, if any.
    pub stdin: Option<String>,
    pub cancel: CancellationToken,
    pub jobs: Arc<JobManager>,
}

impl ExecutionContext {
    pub fn new(
        permission_level: PermissionLevel,
        working_directory: PathBuf,
        jobs: Arc<JobManager>,
    ) -> Self {
        Self {
            permission_level,
            working_directory,
            stdin: None,
            cancel: CancellationToken::new(),
            jobs,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn check_cancelled(&self) -> Result<(), ShellError> {
        self.cancel.check()
    }

    /// [`resolve_safe_path`] against this context's working directory.
    pub fn resolve(&self, target: Option<&str>) -> Result<PathBuf, ShellError> {
        resolve_safe_path(target, &self.working_directory)
    }

    /// Read a text file, refusing directories and anything over
    /// [`MAX_FILE_READ_BYTES`]. Checks for cancellation between chunks.
    pub fn read_capped_file(&self, target: &str) -> Result<String, ShellError> {
        self.check_cancelled()?;
        let path = self.resolve(Some(target))?;
        let meta = std::fs::metadata(&path).map_err(|e| ShellError::io("stat", e))?;
        if meta.is_dir() {
            return Err(ShellError::io(
                "read",
                io::Error::from(io::ErrorKind::IsADirectory),
            ));
        }
        if meta.len() > MAX_FILE_READ_BYTES {
            return Err(ShellError::too_large(
                format!("File {target}"),
                MAX_FILE_READ_BYTES as usize,
            ));
        }

        let file = File::open(&path).map_err(|e| ShellError::io("open", e))?;
        // The file may have grown since the stat; read one byte past the limit to notice.
        let mut reader = file.take(MAX_FILE_READ_BYTES + 1);
        let mut data = Vec::with_capacity(meta.len() as usize);
        let mut chunk = [0u8; 8192];
        loop {
            self.check_cancelled()?;
            let n = reader
                .read(&mut chunk)
                .map_err(|e| ShellError::io("read", e))?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
        }
        if data.len() as u64 > MAX_FILE_READ_BYTES {
            return Err(ShellError::too_large(
                format!("File {target}"),
                MAX_FILE_READ_BYTES as usize,
            ));
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
