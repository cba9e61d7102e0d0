pub mod shell;
pub mod tokenize;
pub mod types;

pub use shell::parse_command;
pub use tokenize::{Token, lex, tokenize};
pub use types::{CommandKind, CommandStage, InputMode, OutputMode, ParsedCommand};
