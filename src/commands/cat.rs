use crate::exec::{CommandResult, ExecutionContext};

/// `cat [file...]`
///
/// With no files, passes stdin through. With files, concatenates them; if
/// any file cannot be read the stage fails with one error line per bad file
/// and prints nothing.
pub fn cat(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.stdin.as_deref() {
            Some(stdin) if !stdin.is_empty() => CommandResult::success(stdin),
            _ => CommandResult::failure(1, "cat: file required or stdin expected"),
        };
    }

    let mut out = String::new();
    let mut errors = Vec::new();
    for file in args {
        match ctx.read_capped_file(file) {
            Ok(data) => out.push_str(&data),
            Err(e) => errors.push(format!("cat: {file}: {e}")),
        }
    }

    if errors.is_empty() {
        CommandResult::success(out)
    } else {
        CommandResult::failure(1, errors.join("\n"))
    }
}
