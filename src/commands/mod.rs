//! Built-in command handlers.
//!
//! Every command is a [`CommandHandler`]: plain functions qualify through the
//! blanket impl, stateful commands (like `help`) implement the trait
//! directly. Capability flags live on the [`CommandDef`] in
//! [`register_builtins`], not in the handlers.

/// `cat`: concatenate files or pass stdin through.
pub mod cat;
/// `cd` and `pwd`: working directory.
pub mod dir;
/// `fetch`: HTTP(S) GET or local file read.
pub mod fetch;
/// `help`: the command reference.
pub mod help;
/// `jobs` and `killjobs`: background job introspection.
pub mod jobs;
/// `ls`: directory listing.
pub mod ls;
/// `nexus`: admin-only host diagnostics.
pub mod nexus;
/// `grep`, `sort`, `unique`: line filters.
pub mod text;

use crate::error::ShellError;
use crate::exec::{CommandDef, CommandRegistry, CommandResult, ExecutionContext};

/// A command implementation.
///
/// Handlers never fail out-of-band: every error becomes a [`CommandResult`]
/// with a `<name>: ` prefixed stderr.
pub trait CommandHandler: Send + Sync {
    fn run(&self, args: &[String], ctx: &ExecutionContext) -> CommandResult;
}

impl<F> CommandHandler for F
where
    F: Fn(&[String], &ExecutionContext) -> CommandResult + Send + Sync,
{
    fn run(&self, args: &[String], ctx: &ExecutionContext) -> CommandResult {
        self(args, ctx)
    }
}

/// Register the fixed whitelist. `help` goes last so it can list the rest.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(
        CommandDef::new("cd", "Change working directory", dir::cd).changes_directory(),
    );
    registry.register(CommandDef::new("pwd", "Print working directory", dir::pwd));
    registry.register(CommandDef::new("ls", "List directory contents", ls::ls));
    registry.register(
        CommandDef::new("cat", "Concatenate and display file contents", cat::cat).stdin(),
    );
    registry.register(
        CommandDef::new("grep", "Search file for pattern matches", text::grep).stdin(),
    );
    registry.register(
        CommandDef::new("sort", "Sort file lines lexicographically", text::sort).stdin(),
    );
    registry.register(
        CommandDef::new("unique", "Print unique lines from file", text::unique).stdin(),
    );
    registry.register(CommandDef::new(
        "fetch",
        "Fetch remote resource or read local file",
        fetch::fetch,
    ));
    registry.register(CommandDef::new(
        "jobs",
        "List tracked background jobs",
        jobs::jobs,
    ));
    registry.register(CommandDef::new(
        "killjobs",
        "Terminate a background job",
        jobs::killjobs,
    ));
    registry.register(
        CommandDef::new("nexus", "Admin-only privileged operations", nexus::nexus).admin(),
    );
    let help = help::HelpCommand::from_registry(registry);
    registry.register(CommandDef::new(help::NAME, help::DESCRIPTION, help));
}

/// Text a line filter operates on: non-empty stdin if present, else the
/// file named by `file_arg`.
///
/// `Ok(None)` means there was neither.
pub(crate) fn input_text(
    ctx: &ExecutionContext,
    file_arg: Option<&String>,
) -> Result<Option<String>, ShellError> {
    if let Some(stdin) = ctx.stdin.as_deref()
        && !stdin.is_empty()
    {
        return Ok(Some(stdin.to_string()));
    }
    match file_arg {
        Some(file) => ctx.read_capped_file(file).map(Some),
        None => Ok(None),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{args, ctx};
    use super::*;

    #[test]
    fn closures_are_handlers() {
        let greeting = String::from("hi");
        let handler = move |_: &[String], _: &ExecutionContext| CommandResult::success(greeting.clone());
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(handler.run(&[], &ctx(dir.path())).stdout, "hi");
    }

    #[test]
    fn stdin_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "file").unwrap();
        let c = ctx(dir.path()).with_stdin("piped");
        let words = args(&["f.txt"]);
        assert_eq!(input_text(&c, words.first()).unwrap().as_deref(), Some("piped"));
    }

    #[test]
    fn empty_stdin_falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "file").unwrap();
        let c = ctx(dir.path()).with_stdin("");
        let words = args(&["f.txt"]);
        assert_eq!(input_text(&c, words.first()).unwrap().as_deref(), Some("file"));
    }

    #[test]
    fn no_input_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(input_text(&ctx(dir.path()), None).unwrap().is_none());
    }
}
