use super::CommandHandler;
use crate::exec::{CommandRegistry, CommandResult, ExecutionContext};

pub const NAME: &str = "help";
pub const DESCRIPTION: &str = "Show command reference";

/// `help`: the command reference, rendered once from the registry.
pub struct HelpCommand {
    text: String,
}

impl HelpCommand {
    /// Build the reference from every command registered so far, plus
    /// `help` itself.
    pub fn from_registry(registry: &CommandRegistry) -> Self {
        let mut entries: Vec<(&str, &str, bool)> = registry
            .iter()
            .map(|d| (d.name.as_str(), d.description.as_str(), d.requires_admin))
            .collect();
        if !registry.contains(NAME) {
            entries.push((NAME, DESCRIPTION, false));
            entries.sort_by_key(|(name, _, _)| *name);
        }
        Self {
            text: render(&entries),
        }
    }
}

fn render(entries: &[(&str, &str, bool)]) -> String {
    let heavy = "=".repeat(60);
    let light = "-".repeat(60);
    let mut out = format!("NexShell Command Reference\n{heavy}\n\nCore Commands:\n{light}\n");
    for (name, desc, _) in entries.iter().filter(|(_, _, admin)| !admin) {
        out.push_str(&format!("  {name:<18} {desc}\n"));
    }

    let admin: Vec<_> = entries.iter().filter(|(_, _, admin)| *admin).collect();
    if !admin.is_empty() {
        out.push_str(&format!("\nAdmin Commands:\n{light}\n"));
        for (name, desc, _) in admin {
            out.push_str(&format!("  {name:<18} {desc}\n"));
        }
    }

    out.push_str(&format!("\n{heavy}\n"));
    out.push_str("Use pipes (|) to chain commands: cat file.txt | grep pattern\n");
    out.push_str("Use redirection: ls > output.txt, ls >> output.txt, cat < input.txt\n");
    out.push_str("Background jobs: command &\n");
    out
}

impl CommandHandler for HelpCommand {
    fn run(&self, _args: &[String], _ctx: &ExecutionContext) -> CommandResult {
        CommandResult::success(self.text.clone())
    }
}
