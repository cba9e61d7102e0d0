use super::tokenize::{Token, lex};
use super::types::{CommandKind, CommandStage, InputMode, OutputMode, ParsedCommand};
use crate::error::ShellError;

/// Parse one input line into a pipeline AST.
///
/// Pure and deterministic. Steps: trim, strip a trailing `&` (background),
/// tokenize, split on `|`, then parse each group into a [`CommandStage`].
/// An empty, whitespace-only or bare-`&` line yields zero stages.
///
/// The only failure is a heredoc (`<<`), which is not supported.
pub fn parse_command(input: &str) -> Result<ParsedCommand, ShellError> {
    let trimmed = input.trim();
    let (background, command_line) = match trimmed.strip_suffix('&') {
        Some(rest) => (true, rest.trim()),
        None => (false, trimmed),
    };

    let tokens = lex(command_line);
    if tokens.is_empty() {
        return Ok(ParsedCommand::empty(background, input));
    }

    if tokens.contains(&Token::Heredoc) {
        return Err(ShellError::UnsupportedOperator("<<".into()));
    }

    let groups: Vec<&[Token]> = tokens.split(|t| *t == Token::Pipe).collect();
    let kind = if groups.len() > 1 {
        CommandKind::Pipeline
    } else {
        CommandKind::Single
    };

    let stages = groups
        .iter()
        .enumerate()
        .map(|(i, group)| parse_stage(group, i > 0))
        .collect();

    Ok(ParsedCommand {
        kind,
        stages,
        background,
        original_input: input.to_string(),
    })
}

/// Parse one `|`-delimited token group.
///
/// A redirection operator with nothing after it is dropped silently, for
/// compatibility with the lenient behaviour users already rely on.
fn parse_stage(tokens: &[Token], piped: bool) -> CommandStage {
    let mut command_name: Option<String> = None;
    let mut args = Vec::new();
    let mut input = if piped {
        InputMode::Pipe
    } else {
        InputMode::Inherit
    };
    let mut output = OutputMode::Inherit;

    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        match token {
            Token::RedirectIn | Token::RedirectOut | Token::Append => {
                let Some(Token::Word(target)) = iter.peek() else {
                    continue;
                };
                let target = target.clone();
                iter.next();
                match token {
                    Token::RedirectIn => input = InputMode::Redirect(target),
                    Token::RedirectOut => output = OutputMode::Redirect(target),
                    _ => output = OutputMode::Append(target),
                }
            }
            Token::Word(word) => {
                if command_name.is_none() {
                    command_name = Some(word.clone());
                } else {
                    args.push(word.clone());
                }
            }
            // Pipes were consumed by the split, heredocs rejected earlier.
            Token::Pipe | Token::Heredoc => {}
        }
    }

    CommandStage {
        command_name: command_name.unwrap_or_default(),
        args,
        input,
        output,
    }
}
