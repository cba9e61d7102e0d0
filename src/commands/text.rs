//! Line filters. Each reads non-empty stdin if it has any, otherwise the
//! file argument, capped at the usual read limit.

use std::collections::HashSet;

use regex::RegexBuilder;

use super::input_text;
use crate::error::ShellError;
use crate::exec::{CommandResult, ExecutionContext};

/// `grep <pattern> [file]`: case-insensitive regex match per line.
/// No matches is still success, printed as `(no matches)`.
pub fn grep(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let Some(pattern) = args.first() else {
        return CommandResult::failure(1, "grep: pattern required");
    };
    match grep_lines(pattern, args.get(1), ctx) {
        Ok(Some(out)) => CommandResult::success(out),
        Ok(None) => CommandResult::failure(1, "grep: file required or stdin expected"),
        Err(e) => CommandResult::from_error("grep", &e),
    }
}

fn grep_lines(
    pattern: &str,
    file: Option<&String>,
    ctx: &ExecutionContext,
) -> Result<Option<String>, ShellError> {
    let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    let Some(text) = input_text(ctx, file)? else {
        return Ok(None);
    };
    let matches: Vec<&str> = text.lines().filter(|l| re.is_match(l)).collect();
    if matches.is_empty() {
        return Ok(Some("(no matches)".to_string()));
    }
    Ok(Some(matches.join("\n")))
}

/// `sort [file]`: drops empty lines, case-insensitive order.
pub fn sort(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    filter("sort", args.first(), ctx, |text| {
        let mut lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        lines.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        lines.join("\n")
    })
}

/// `unique [file]`: first occurrence of each line, original order.
pub fn unique(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    filter("unique", args.first(), ctx, |text| {
        let mut seen = HashSet::new();
        text.lines()
            .filter(|l| seen.insert(*l))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn filter(
    name: &str,
    file: Option<&String>,
    ctx: &ExecutionContext,
    f: impl FnOnce(&str) -> String,
) -> CommandResult {
    match input_text(ctx, file) {
        Ok(Some(text)) => CommandResult::success(f(&text)),
        Ok(None) => CommandResult::failure(1, format!("{name}: file required or stdin expected")),
        Err(e) => CommandResult::from_error(name, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{args, ctx};
    use super::*;

    #[test]
    fn grep_is_case_insensitive_regex() {
        let dir = tempfile::tempdir().unwrap();
        let c = ctx(dir.path()).with_stdin("Error: disk\ninfo: ok\nERROR: net");
        let r = grep(&args(&["^error"]), &c);
        assert_eq!(r.stdout, "Error: disk\nERROR: net");
    }

    #[test]
    fn grep_no_matches_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let c = ctx(dir.path()).with_stdin("alpha\nbeta");
        let r = grep(&args(&["gamma"]), &c);
        assert_eq!(r, CommandResult::success("(no matches)"));
    }

    #[test]
    fn grep_reads_file_argument() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log.txt"), "a\nfoo bar\nb\n").unwrap();
        let r = grep(&args(&["foo", "log.txt"]), &ctx(dir.path()));
        assert_eq!(r.stdout, "foo bar");
    }

    #[test]
    fn grep_usage_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(grep(&[], &ctx(dir.path())).stderr, "grep: pattern required");
        assert_eq!(
            grep(&args(&["x"]), &ctx(dir.path())).stderr,
            "grep: file required or stdin expected"
        );
    }

    #[test]
    fn grep_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let c = ctx(dir.path()).with_stdin("x");
        let r = grep(&args(&["("]), &c);
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.starts_with("grep: invalid pattern"));
    }

    #[test]
    fn sort_drops_blank_lines_and_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let c = ctx(dir.path()).with_stdin("pear\n\nApple\nbanana\n");
        assert_eq!(sort(&[], &c).stdout, "Apple\nbanana\npear");
    }

    #[test]
    fn sort_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("n.txt"), "c\na\nb\n").unwrap();
        assert_eq!(sort(&args(&["n.txt"]), &ctx(dir.path())).stdout, "a\nb\nc");
    }

    #[test]
    fn sort_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let r = sort(&args(&["nope.txt"]), &ctx(dir.path()));
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.starts_with("sort: "));
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let c = ctx(dir.path()).with_stdin("b\na\nb\nc\na");
        assert_eq!(unique(&[], &c).stdout, "b\na\nc");
    }

    #[test]
    fn unique_without_input() {
        let dir = tempfile::tempdir().unwrap();
        let r = unique(&[], &ctx(dir.path()));
        assert_eq!(r.stderr, "unique: file required or stdin expected");
    }
}
