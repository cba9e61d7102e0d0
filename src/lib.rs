//! nexshell: the backend of a constrained command shell.
//!
//! Input lines are tokenized, parsed into a pipeline of stages, and run
//! against a fixed whitelist of built-in commands. Nothing is ever handed to
//! a system shell. Paths are confined by [`security`], sizes by [`limits`],
//! and background pipelines are tracked by [`jobs`].
//!
//! # Architecture
//!
//! - **[`parse`]**: tokenizer, parser and the pipeline AST.
//! - **[`exec`]**: execution context, command registry, pipeline executor.
//! - **[`commands`]**: the built-in handlers (cd, ls, cat, grep, fetch, nexus, ...).
//! - **[`jobs`]**: background job table with bounded retention.
//! - **[`security`]**: safe path resolution, URL and IPC payload validation.
//! - **[`backend`]**: the session facade used by the IPC layer.
//! - **[`ipc`]**: JSON-lines request routing for the binary.
//! - **[`config`]**: embedded defaults + user overlay.
//! - **[`logging`]**: file logger and per-command records.

/// Session facade: execute, background jobs, host info.
pub mod backend;
/// Built-in command handlers.
pub mod commands;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error taxonomy.
pub mod error;
/// Execution context, registry and pipeline executor.
pub mod exec;
/// Host introspection.
pub mod host;
/// JSON-lines IPC routing.
pub mod ipc;
/// Background job table.
pub mod jobs;
/// Fixed resource ceilings.
pub mod limits;
/// File-based logging.
pub mod logging;
/// Tokenizer, parser and pipeline types.
pub mod parse;
/// Path, URL and payload validation.
pub mod security;

use backend::Backend;
use exec::CommandResult;

/// Run one input line in a fresh session using the default configuration.
///
/// Convenient for tests and one-shot use; the session (working directory,
/// jobs) is discarded afterwards. Long-lived callers should keep a
/// [`Backend`].
pub fn execute(input: &str) -> CommandResult {
    Backend::new(&config::Config::default_config()).execute(input)
}
