//! Fixed resource ceilings. These are not part of the
//! runtime configuration.

/// Largest file any handler (or `<` redirection) will read.
pub const MAX_FILE_READ_BYTES: u64 = 50 * 1024;

/// Largest HTTP response body `fetch` will buffer.
pub const MAX_FETCH_BODY_BYTES: usize = 50 * 1024;

/// Largest payload a single `>` / `>>` redirection may write.
pub const MAX_FILE_WRITE_BYTES: usize = 100 * 1024;

/// Maximum number of stages in one pipeline.
pub const MAX_PIPELINE_STAGES: usize = 50;

/// Completed/failed jobs kept for `jobs` before the oldest are pruned.
pub const MAX_COMPLETED_JOBS: usize = 20;

/// Maximum raw input length, in characters, accepted at the IPC boundary.
pub const MAX_INPUT_CHARS: usize = 10_000;
