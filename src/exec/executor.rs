//! Pipeline execution.
//!
//! Stages run strictly in order on the calling thread. stdout of stage N is
//! stdin of stage N+1; stderr from every stage is accumulated. A failing
//! non-final stage aborts the pipeline; a failing final stage is simply the
//! result.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use super::{CommandRegistry, CommandResult, ExecutionContext};
use crate::error::ShellError;
use crate::limits::{MAX_FILE_WRITE_BYTES, MAX_PIPELINE_STAGES};
use crate::parse::{CommandStage, OutputMode, ParsedCommand};

/// Execute a parsed command against `registry`.
///
/// `ctx.working_directory` is updated in place when a `cd` stage succeeds,
/// so the caller can persist it. `ctx.stdin`, if set, feeds stage 0 when
/// that stage has no `<` redirection.
pub fn execute_parsed_command(
    registry: &CommandRegistry,
    parsed: &ParsedCommand,
    ctx: &mut ExecutionContext,
) -> CommandResult {
    if parsed.stages.is_empty() {
        return CommandResult::empty();
    }

    if parsed.stages.len() > MAX_PIPELINE_STAGES {
        log::warn!(
            "refusing pipeline of {} stages (max {MAX_PIPELINE_STAGES})",
            parsed.stages.len()
        );
        return CommandResult::failure(
            1,
            format!("Pipeline too long: maximum {MAX_PIPELINE_STAGES} stages allowed"),
        );
    }

    let last = parsed.stages.len() - 1;
    let mut stdin = ctx.stdin.take();
    let mut stderr_log: Vec<String> = Vec::new();
    let mut result = CommandResult::empty();

    for (i, stage) in parsed.stages.iter().enumerate() {
        log::debug!("stage {}/{}: {}", i + 1, last + 1, stage.to_command_line());
        result = execute_stage(registry, stage, i, stdin.take(), ctx);

        if !result.stderr.is_empty() {
            stderr_log.push(result.stderr.clone());
        }

        if !result.is_success() && i < last {
            log::debug!(
                "pipeline aborted at stage {} with exit {}",
                i + 1,
                result.exit_code
            );
            let stderr = if stderr_log.is_empty() {
                format!("Pipeline failed at stage {}: {}", i + 1, stage.command_name)
            } else {
                stderr_log.join("\n")
            };
            return CommandResult::failure(result.exit_code, stderr);
        }

        if i < last {
            stdin = Some(std::mem::take(&mut result.stdout));
        }
    }

    let stderr = if stderr_log.is_empty() {
        result.stderr
    } else {
        stderr_log.join("\n")
    };
    CommandResult {
        stdout: result.stdout,
        stderr,
        exit_code: result.exit_code,
    }
}

fn execute_stage(
    registry: &CommandRegistry,
    stage: &CommandStage,
    index: usize,
    piped: Option<String>,
    ctx: &mut ExecutionContext,
) -> CommandResult {
    if let Err(e) = ctx.check_cancelled() {
        return CommandResult::failure(e.exit_code(), e.to_string());
    }

    let Some(def) = registry.get(&stage.command_name) else {
        let err = ShellError::CommandNotFound(stage.command_name.clone());
        return CommandResult::failure(err.exit_code(), err.to_string());
    };

    if def.requires_admin && !ctx.permission_level.is_admin() {
        return CommandResult::failure(
            1,
            format!("{}: admin permission required", stage.command_name),
        );
    }

    // Pipe input wins over a stage-local `<` for every stage after the first.
    let stdin = match stage.input_file() {
        Some(file) if index == 0 => match ctx.read_capped_file(file) {
            Ok(data) => Some(data),
            Err(ShellError::ResourceLimit { .. }) => {
                return CommandResult::failure(1, format!("Input file too large: {file}"));
            }
            Err(e) => {
                return CommandResult::failure(1, format!("Cannot read input file {file}: {e}"));
            }
        },
        Some(file) => {
            log::debug!("stage {}: ignoring < {file}, input is piped", index + 1);
            piped
        }
        None => piped,
    };

    ctx.stdin = if def.supports_stdin { stdin } else { None };
    let result = def.handler().run(&stage.args, ctx);
    ctx.stdin = None;

    if def.sets_working_directory && result.is_success() && !result.stdout.is_empty() {
        log::debug!("working directory -> {}", result.stdout);
        ctx.working_directory = PathBuf::from(&result.stdout);
    }

    let Some(target) = stage.output_file() else {
        return result;
    };
    let append = matches!(stage.output, OutputMode::Append(_));
    match write_redirect(ctx, target, &result.stdout, append) {
        Ok(()) => CommandResult {
            stdout: if append {
                format!("Output appended to {target}")
            } else {
                format!("Output written to {target}")
            },
            stderr: result.stderr,
            exit_code: result.exit_code,
        },
        Err(ShellError::ResourceLimit { .. }) => {
            CommandResult::failure(1, format!("Output too large to write to {target}"))
        }
        Err(e) => CommandResult::failure(1, format!("Cannot write output file {target}: {e}")),
    }
}

/// Write (or append) a stage's stdout to `target`. Nothing is written when
/// the payload is over [`MAX_FILE_WRITE_BYTES`].
fn write_redirect(
    ctx: &ExecutionContext,
    target: &str,
    data: &str,
    append: bool,
) -> Result<(), ShellError> {
    ctx.check_cancelled()?;
    let path = ctx.resolve(Some(target))?;
    if data.len() > MAX_FILE_WRITE_BYTES {
        return Err(ShellError::too_large(
            format!("Output for {target}"),
            MAX_FILE_WRITE_BYTES,
        ));
    }
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&path)
        .map_err(|e| ShellError::io(format!("open {target}"), e))?;
    file.write_all(data.as_bytes())
        .map_err(|e| ShellError::io(format!("write {target}"), e))
}
