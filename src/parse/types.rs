//! Pipeline AST produced by the parser and consumed by the executor.

/// Whether the input was a lone command or a `|` pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Single,
    Pipeline,
}

/// Where a stage reads its stdin from.
///
/// The redirect target lives inside the variant, so a file name is present
/// exactly when the mode is a redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// No explicit source: stage 0 of a pipeline, or a single command.
    Inherit,
    /// Previous stage's stdout.
    Pipe,
    /// `< file`
    Redirect(String),
}

/// Where a stage's stdout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Returned to the next stage or the caller.
    Inherit,
    /// `> file` (truncate)
    Redirect(String),
    /// `>> file`
    Append(String),
}

/// One command within a pipeline. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStage {
    /// First non-redirection word. Empty for an empty pipeline segment (`a | | b`).
    pub command_name: String,
    pub args: Vec<String>,
    pub input: InputMode,
    pub output: OutputMode,
}

impl CommandStage {
    pub fn input_file(&self) -> Option<&str> {
        match &self.input {
            InputMode::Redirect(f) => Some(f),
            _ => None,
        }
    }

    pub fn output_file(&self) -> Option<&str> {
        match &self.output {
            OutputMode::Redirect(f) | OutputMode::Append(f) => Some(f),
            OutputMode::Inherit => None,
        }
    }

    /// Render the stage back to shell text, quoting words with shlex.
    ///
    /// Pipe input is implied by position and is not rendered.
    pub fn to_command_line(&self) -> String {
        let mut words: Vec<&str> = Vec::with_capacity(self.args.len() + 3);
        words.push(&self.command_name);
        words.extend(self.args.iter().map(String::as_str));
        let mut line = quote_words(&words);
        if let InputMode::Redirect(f) = &self.input {
            line.push_str(" < ");
            line.push_str(&quote_words(&[f]));
        }
        match &self.output {
            OutputMode::Redirect(f) => {
                line.push_str(" > ");
                line.push_str(&quote_words(&[f]));
            }
            OutputMode::Append(f) => {
                line.push_str(" >> ");
                line.push_str(&quote_words(&[f]));
            }
            OutputMode::Inherit => {}
        }
        line
    }
}

fn quote_words(words: &[&str]) -> String {
    shlex::try_join(words.iter().copied()).unwrap_or_else(|_| words.join(" "))
}

/// A fully parsed input line.
///
/// Zero stages means the input was empty, whitespace, or a bare `&`;
/// callers must short-circuit such a command as a successful no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    pub stages: Vec<CommandStage>,
    pub background: bool,
    /// The raw input exactly as received.
    pub original_input: String,
}

impl ParsedCommand {
    pub(crate) fn empty(background: bool, original_input: &str) -> Self {
        Self {
            kind: CommandKind::Single,
            stages: Vec::new(),
            background,
            original_input: original_input.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The command text with surrounding whitespace and any trailing `&`
    /// removed. This is what a background job is labelled with.
    pub fn command_text(&self) -> &str {
        let trimmed = self.original_input.trim();
        if self.background {
            trimmed
                .strip_suffix('&')
                .map(str::trim_end)
                .unwrap_or(trimmed)
        } else {
            trimmed
        }
    }

    /// Normalised shell text for the whole pipeline.
    pub fn to_command_line(&self) -> String {
        self.stages
            .iter()
            .map(CommandStage::to_command_line)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
