//! `nexus <subcommand>`: read-only host diagnostics for admins.

use crate::exec::{CommandResult, ExecutionContext};
use crate::host;
use crate::limits::{
    MAX_COMPLETED_JOBS, MAX_FETCH_BODY_BYTES, MAX_FILE_READ_BYTES, MAX_FILE_WRITE_BYTES,
    MAX_INPUT_CHARS, MAX_PIPELINE_STAGES,
};

type Subcommand = fn(&[String], &ExecutionContext) -> CommandResult;

const SUBCOMMANDS: &[(&str, &str, Subcommand)] = &[
    ("status", "Show system status and information", status),
    ("system", "Display detailed system information", system),
    ("network", "Show network interface information", network),
    ("users", "Display user information", users),
    ("env", "Show environment variables (optionally filtered)", env),
    ("clear", "Clear terminal output", clear),
    ("version", "Show NexShell version information", version),
    ("config", "Display NexShell configuration", config),
];

/// Environment keys shown by a bare `nexus env`.
const SAFE_ENV_KEYS: &[&str] = &["HOME", "LANG", "PATH", "PWD", "SHELL", "TEMP", "TMP", "USER"];

pub fn nexus(args: &[String], ctx: &ExecutionContext) -> CommandResult {
    // The registry already gates on admin; a handler reached some other way must not leak.
    if !ctx.permission_level.is_admin() {
        return CommandResult::failure(
            1,
            "nexus: admin permission required to execute nexus operations.",
        );
    }
    let Some(sub) = args.first() else {
        return CommandResult::success(listing());
    };
    let sub = sub.to_ascii_lowercase();
    match SUBCOMMANDS.iter().find(|(name, _, _)| *name == sub) {
        Some((_, _, run)) => run(&args[1..], ctx),
        None => CommandResult::failure(
            1,
            format!("nexus: unknown subcommand '{sub}'. Use 'nexus' to see available commands."),
        ),
    }
}

fn listing() -> String {
    let mut lines = vec!["Nexus Admin Commands:".to_string(), "=".repeat(50)];
    lines.extend(
        SUBCOMMANDS
            .iter()
            .map(|(name, desc, _)| format!("  nexus {name:<12} {desc}")),
    );
    lines.push(String::new());
    lines.push("Usage: nexus <subcommand> [args...]".to_string());
    lines.push("Example: nexus status, nexus system, nexus network".to_string());
    lines.join("\n")
}

fn uptime_text() -> String {
    match host::uptime_secs() {
        Some(secs) => format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60),
        None => "unknown".to_string(),
    }
}

fn status(_args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let (sysname, release) = host::os_release();
    let mut lines = vec![
        format!("System: {sysname} {release}"),
        format!("Hostname: {}", host::hostname()),
        format!("Architecture: {}", std::env::consts::ARCH),
        format!("Platform: {}", std::env::consts::OS),
        format!("Uptime: {}", uptime_text()),
        format!("CPU Cores: {}", host::cpu_count()),
    ];
    if let Some(mem) = host::memory() {
        lines.push(format!("Total Memory: {}", host::format_gb(mem.total)));
        lines.push(format!("Free Memory: {}", host::format_gb(mem.free)));
    }
    lines.push(format!(
        "Working Directory: {}",
        ctx.working_directory.display()
    ));
    lines.push(format!("Permission Level: {}", ctx.permission_level));
    CommandResult::success(lines.join("\n"))
}

fn system(_args: &[String], _ctx: &ExecutionContext) -> CommandResult {
    let (sysname, release) = host::os_release();
    let mut lines = vec![
        "=== System Information ===".to_string(),
        format!("OS: {sysname} {release}"),
        format!("Architecture: {}", std::env::consts::ARCH),
        format!("CPU: {}", host::cpu_model()),
        format!("CPU Cores: {}", host::cpu_count()),
    ];
    if let Some(mem) = host::memory() {
        lines.push(format!("Total Memory: {}", host::format_gb(mem.total)));
        lines.push(format!(
            "Used Memory: {} ({:.1}%)",
            host::format_gb(mem.used()),
            mem.used_percent()
        ));
        lines.push(format!("Free Memory: {}", host::format_gb(mem.free)));
    }
    let home = host::home_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "N/A".to_string());
    lines.push(format!("Home Directory: {home}"));
    lines.push(format!("Temp Directory: {}", std::env::temp_dir().display()));
    lines.push(format!("NexShell Version: {}", env!("CARGO_PKG_VERSION")));
    lines.push(format!("Platform: {}", std::env::consts::OS));
    CommandResult::success(lines.join("\n"))
}

fn network(_args: &[String], _ctx: &ExecutionContext) -> CommandResult {
    let mut lines = vec!["=== Network Interfaces ===".to_string()];
    let mut current: Option<String> = None;
    for entry in host::interfaces() {
        if current.as_deref() != Some(entry.interface.as_str()) {
            lines.push(format!("\n{}:", entry.interface));
            current = Some(entry.interface.clone());
        }
        let family = if entry.addr.is_ipv4() { "IPv4" } else { "IPv6" };
        let scope = if entry.internal { "internal" } else { "external" };
        lines.push(format!("  {family}: {} ({scope})", entry.addr));
    }
    CommandResult::success(lines.join("\n"))
}

fn users(_args: &[String], _ctx: &ExecutionContext) -> CommandResult {
    let info = host::user_info();
    let na = || "N/A".to_string();
    let lines = [
        "=== User Information ===".to_string(),
        format!("Username: {}", info.username),
        format!("UID: {}", info.uid.map(|u| u.to_string()).unwrap_or_else(na)),
        format!("GID: {}", info.gid.map(|g| g.to_string()).unwrap_or_else(na)),
        format!(
            "Home: {}",
            info.home
                .map(|h| h.display().to_string())
                .unwrap_or_else(na)
        ),
        format!("Shell: {}", info.shell.unwrap_or_else(na)),
    ];
    CommandResult::success(lines.join("\n"))
}

fn env(args: &[String], _ctx: &ExecutionContext) -> CommandResult {
    let mut vars: Vec<String> = match args.first() {
        Some(filter) => {
            let filter = filter.to_lowercase();
            std::env::vars()
                .filter(|(k, _)| k.to_lowercase().contains(&filter))
                .map(|(k, v)| format!("{k}={v}"))
                .collect()
        }
        None => SAFE_ENV_KEYS
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| format!("{k}={v}")))
            .collect(),
    };
    if vars.is_empty() {
        return CommandResult::failure(1, "nexus env: No matching environment variables found");
    }
    vars.sort();
    CommandResult::success(vars.join("\n"))
}

fn clear(_args: &[String], _ctx: &ExecutionContext) -> CommandResult {
    CommandResult::success("Terminal cleared (use Ctrl+L or refresh to clear UI)")
}

fn version(_args: &[String], _ctx: &ExecutionContext) -> CommandResult {
    let lines = [
        format!("NexShell v{}", env!("CARGO_PKG_VERSION")),
        format!(
            "Platform: {} {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
    ];
    CommandResult::success(lines.join("\n"))
}

fn config(_args: &[String], ctx: &ExecutionContext) -> CommandResult {
    let kb = |bytes: usize| bytes / 1024;
    let lines = [
        "=== NexShell Configuration ===".to_string(),
        format!("Working Directory: {}", ctx.working_directory.display()),
        format!("Permission Level: {}", ctx.permission_level),
        format!("Max File Read: {} KB", kb(MAX_FILE_READ_BYTES as usize)),
        format!("Max Fetch Size: {} KB", kb(MAX_FETCH_BODY_BYTES)),
        format!("Max File Write: {} KB", kb(MAX_FILE_WRITE_BYTES)),
        format!("Max Pipeline Stages: {MAX_PIPELINE_STAGES}"),
        format!("Max Retained Jobs: {MAX_COMPLETED_JOBS}"),
        format!("Max Input Length: {MAX_INPUT_CHARS} characters"),
        "Path Traversal Protection: Enabled".to_string(),
        "IPC Validation: Enabled".to_string(),
    ];
    CommandResult::success(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{admin_ctx, args, ctx};
    use super::*;

    fn run(words: &[&str]) -> CommandResult {
        let dir = tempfile::tempdir().unwrap();
        nexus(&args(words), &admin_ctx(dir.path()))
    }

    #[test]
    fn standard_user_refused() {
        let dir = tempfile::tempdir().unwrap();
        let r = nexus(&args(&["status"]), &ctx(dir.path()));
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.starts_with("nexus: admin permission required"));
    }

    #[test]
    fn bare_nexus_lists_subcommands() {
        let r = run(&[]);
        assert_eq!(r.exit_code, 0);
        for (name, _, _) in SUBCOMMANDS {
            assert!(r.stdout.contains(&format!("nexus {name}")), "missing {name}");
        }
    }

    #[test]
    fn unknown_subcommand() {
        let r = run(&["reboot"]);
        assert_eq!(r.exit_code, 1);
        assert_eq!(
            r.stderr,
            "nexus: unknown subcommand 'reboot'. Use 'nexus' to see available commands."
        );
    }

    #[test]
    fn subcommand_is_case_insensitive() {
        assert!(run(&["VERSION"]).stdout.starts_with("NexShell v"));
    }

    #[test]
    fn status_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let r = nexus(&args(&["status"]), &admin_ctx(dir.path()));
        assert!(r.stdout.contains(&format!("Working Directory: {}", dir.path().display())));
        assert!(r.stdout.contains("Permission Level: admin"));
        assert!(r.stdout.contains("CPU Cores: "));
    }

    #[test]
    fn every_subcommand_succeeds() {
        for sub in ["status", "system", "network", "users", "version", "config", "clear"] {
            assert_eq!(run(&[sub]).exit_code, 0, "{sub}");
        }
    }

    #[test]
    fn config_lists_fixed_limits() {
        let out = run(&["config"]).stdout;
        assert!(out.contains("Max File Read: 50 KB"));
        assert!(out.contains("Max Pipeline Stages: 50"));
        assert!(out.contains("Max File Write: 100 KB"));
    }

    #[test]
    fn env_filter_without_match_fails() {
        let r = run(&["env", "zz_no_such_variable_zz"]);
        assert_eq!(r.exit_code, 1);
        assert_eq!(r.stderr, "nexus env: No matching environment variables found");
    }

    #[test]
    fn env_filter_is_case_insensitive() {
        if std::env::var_os("PATH").is_none() {
            return;
        }
        let r = run(&["env", "path"]);
        assert!(r.stdout.lines().any(|l| l.starts_with("PATH=")));
    }
}
