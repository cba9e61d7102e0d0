//! Log initialisation and per-command records.
//!
//! stdout belongs to the IPC protocol, so logs always go to a file.
//! Everything here is best-effort: logging must never block the shell.

use std::fs::OpenOptions;
use std::time::Duration;

use simplelog::WriteLogger;

use crate::config::LoggingConfig;
use crate::exec::CommandResult;

/// Longest input echoed into a command record.
const MAX_LOGGED_INPUT_CHARS: usize = 200;

/// Install the file logger described by `config`. Returns whether a logger
/// is now active.
pub fn init(config: &LoggingConfig) -> bool {
    if !config.enabled {
        return false;
    }
    let Some(path) = config.file() else {
        return false;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return false;
    };
    WriteLogger::init(config.level_filter(), simplelog::Config::default(), file).is_ok()
}

/// Record one top-level invocation.
pub fn log_command(input: &str, result: &CommandResult, elapsed: Duration) {
    log::info!("{}", command_record(input, result, elapsed));
}

/// Compact single-line form: exit code, duration, input, stderr.
fn command_record(input: &str, result: &CommandResult, elapsed: Duration) -> String {
    let input: String = oneline(input).chars().take(MAX_LOGGED_INPUT_CHARS).collect();
    format!(
        "exit={}\t{}ms\t{input}\t{stderr}",
        result.exit_code,
        elapsed.as_millis(),
        stderr = oneline(&result.stderr),
    )
}

fn oneline(s: &str) -> String {
    s.trim_end().replace('\n', "; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_one_line() {
        let result = CommandResult::failure(1, "first\nsecond\n");
        let line = command_record("cat a\nb", &result, Duration::from_millis(12));
        assert_eq!(line, "exit=1\t12ms\tcat a; b\tfirst; second");
    }

    #[test]
    fn long_input_truncated() {
        let input = "x".repeat(500);
        let line = command_record(&input, &CommandResult::empty(), Duration::ZERO);
        let logged = line.split('\t').nth(2).unwrap();
        assert_eq!(logged.chars().count(), MAX_LOGGED_INPUT_CHARS);
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let config = LoggingConfig::default();
        assert!(!init(&config));
    }
}
