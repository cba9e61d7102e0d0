pub mod context;
pub mod executor;
pub mod result;

pub use context::{CancellationToken, ExecutionContext, PermissionLevel};
pub use executor::execute_parsed_command;
pub use result::CommandResult;

use std::collections::BTreeMap;
use std::fmt;

use crate::commands::CommandHandler;

/// A registered command: its handler plus the capability flags the
/// executor consults before dispatching.
pub struct CommandDef {
    pub name: String,
    pub description: String,
    /// Refused unless the context is [`PermissionLevel::Admin`].
    pub requires_admin: bool,
    /// Receives piped or redirected stdin. Other commands run without it.
    pub supports_stdin: bool,
    /// On success, stdout is the new working directory (`cd`).
    pub sets_working_directory: bool,
    handler: Box<dyn CommandHandler>,
}

impl CommandDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            description: description.into(),
            requires_admin: false,
            supports_stdin: false,
            sets_working_directory: false,
            handler: Box::new(handler),
        }
    }

    pub fn admin(mut self) -> Self {
        self.requires_admin = true;
        self
    }

    pub fn stdin(mut self) -> Self {
        self.supports_stdin = true;
        self
    }

    pub fn changes_directory(mut self) -> Self {
        self.sets_working_directory = true;
        self
    }

    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("requires_admin", &self.requires_admin)
            .field("supports_stdin", &self.supports_stdin)
            .finish_non_exhaustive()
    }
}

/// Name → command lookup. Names are case-insensitive.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDef>,
}

impl CommandRegistry {
    /// An empty registry. Mostly useful for tests with stub handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed whitelist of built-in commands.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtins(&mut registry);
        registry
    }

    /// Add or replace a command.
    pub fn register(&mut self, def: CommandDef) {
        self.commands.insert(def.name.clone(), def);
    }

    /// Look up a command, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CommandDef> {
        self.commands.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All commands, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDef> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
