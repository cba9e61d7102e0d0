use crate::error::ShellError;
use crate::exec::{CommandResult, ExecutionContext};

/// `cd <path>`. On success stdout is the resolved absolute directory, which
/// the executor adopts as the new working directory.
pub fn cd(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let Some(target) = args.first() else {
        return CommandResult::failure(1, "cd: path required");
    };
    match change_dir(target, ctx) {
        Ok(r) => r,
        Err(e) => CommandResult::from_error("cd", &e),
    }
}

fn change_dir(target: &str, ctx: &ExecutionContext) -> Result<CommandResult, ShellError> {
    ctx.check_cancelled()?;
    let path = ctx.resolve(Some(target))?;
    let meta = std::fs::metadata(&path).map_err(|e| ShellError::io(target, e))?;
    if !meta.is_dir() {
        return Ok(CommandResult::failure(
            1,
            format!("cd: not a directory: {}", path.display()),
        ));
    }
    Ok(CommandResult::success(path.to_string_lossy()))
}

pub fn pwd(_args: &[String], ctx: &ExecutionContext) -> CommandResult {
    CommandResult::success(ctx.working_directory.to_string_lossy())
}
