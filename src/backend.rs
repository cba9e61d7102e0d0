//! The session facade: one raw input line in, one [`CommandResult`] out.
//!
//! A [`Backend`] owns the session working directory, the job table and the
//! command registry. Foreground pipelines run on the caller's thread and
//! write `cd` changes back to the session. Background pipelines run on their
//! own thread against a snapshot of the session taken when they start.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::exec::{
    CommandRegistry, CommandResult, ExecutionContext, PermissionLevel, execute_parsed_command,
};
use crate::jobs::{JobManager, JobRecord};
use crate::parse::{ParsedCommand, parse_command};
use crate::security::validate_execute_payload;
use crate::{host, logging};

/// Answer to `getHostInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub hostname: String,
    pub cwd: String,
    pub permission_level: PermissionLevel,
}

#[derive(Debug)]
pub struct Backend {
    registry: Arc<CommandRegistry>,
    jobs: Arc<JobManager>,
    working_directory: RwLock<PathBuf>,
    permission_level: PermissionLevel,
}

impl Backend {
    /// A backend with the built-in commands, configured from `config`.
    pub fn new(config: &Config) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let working_directory = match config.settings.start_dir() {
            Some(dir) => {
                let dir = cwd.join(dir);
                if dir.is_dir() {
                    dir
                } else {
                    log::warn!("start_dir {} is not a directory, using {}", dir.display(), cwd.display());
                    cwd
                }
            }
            None => cwd,
        };
        Self::with_registry(
            CommandRegistry::builtin(),
            working_directory,
            config.settings.permission_level.resolve(),
        )
    }

    pub fn with_registry(
        registry: CommandRegistry,
        working_directory: PathBuf,
        permission_level: PermissionLevel,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            jobs: Arc::new(JobManager::new()),
            working_directory: RwLock::new(working_directory),
            permission_level,
        }
    }

    /// Execute one line of input. Never panics and never fails: every
    /// problem, including a panicking handler, comes back as a result.
    pub fn execute(&self, raw_input: &str) -> CommandResult {
        let started = Instant::now();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(raw_input))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("panic while executing {raw_input:?}: {message}");
                CommandResult::failure(1, format!("Internal error: {message}"))
            }
        };
        logging::log_command(raw_input, &result, started.elapsed());
        result
    }

    /// `nexshell:executeCommand`: validate the payload, then execute its input.
    pub fn execute_payload(&self, payload: &Value) -> CommandResult {
        match validate_execute_payload(payload) {
            Ok(input) => self.execute(input),
            Err(e) => {
                log::warn!("rejected payload: {e}");
                CommandResult::failure(1, format!("IPC error: {e}"))
            }
        }
    }

    pub fn host_info(&self) -> HostInfo {
        HostInfo {
            hostname: host::hostname(),
            cwd: self.working_directory().to_string_lossy().into_owned(),
            permission_level: self.permission_level,
        }
    }

    pub fn working_directory(&self) -> PathBuf {
        self.working_directory
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn permission_level(&self) -> PermissionLevel {
        self.permission_level
    }

    pub fn jobs(&self) -> &Arc<JobManager> {
        &self.jobs
    }

    fn set_working_directory(&self, dir: PathBuf) {
        let mut current = self
            .working_directory
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if *current != dir {
            log::debug!("session directory -> {}", dir.display());
            *current = dir;
        }
    }

    fn context(&self) -> ExecutionContext {
        ExecutionContext::new(
            self.permission_level,
            self.working_directory(),
            self.jobs.clone(),
        )
    }

    fn dispatch(&self, raw_input: &str) -> CommandResult {
        let parsed = match parse_command(raw_input) {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::failure(e.exit_code(), format!("parse error: {e}")),
        };
        if parsed.is_empty() {
            return CommandResult::empty();
        }
        if parsed.background {
            return self.spawn_background(parsed);
        }

        let mut ctx = self.context();
        let start_dir = ctx.working_directory.clone();
        let result = execute_parsed_command(&self.registry, &parsed, &mut ctx);
        // Leave the session alone unless this pipeline moved it.
        if ctx.working_directory != start_dir {
            self.set_working_directory(ctx.working_directory);
        }
        result
    }

    /// Start `parsed` as a job and return the confirmation immediately.
    fn spawn_background(&self, parsed: ParsedCommand) -> CommandResult {
        let command = parsed.command_text().to_string();
        let job = self.jobs.create(command.clone());
        let id = job.id;
        let ctx = self.context().with_cancel(job.cancel.clone());
        let registry = self.registry.clone();
        let jobs = self.jobs.clone();
        let record = job.clone();

        let spawned = thread::Builder::new()
            .name(format!("nexshell-job-{id}"))
            .spawn(move || run_job(&registry, &jobs, record, &parsed, ctx));
        if let Err(e) = spawned {
            log::error!("could not start job #{id}: {e}");
            self.jobs.update(job.fail(format!("could not start job: {e}")));
            return CommandResult::failure(1, format!("Failed to start job #{id}: {e}"));
        }
        CommandResult::success(format!("Started job #{id}: {command}"))
    }
}

/// Body of a job thread. The result is written back only if the job is
/// still running in the table; a kill that got there first wins.
fn run_job(
    registry: &CommandRegistry,
    jobs: &JobManager,
    job: JobRecord,
    parsed: &ParsedCommand,
    mut ctx: ExecutionContext,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        execute_parsed_command(registry, parsed, &mut ctx)
    }));
    let finished = match outcome {
        Ok(result) => job.complete(result),
        Err(payload) => job.fail(format!("Internal error: {}", panic_message(payload.as_ref()))),
    };
    let id = finished.id;
    if !jobs.update(finished) {
        log::debug!("job #{id} result discarded");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::exec::CommandDef;
    use crate::jobs::JobStatus;

    fn backend_in(dir: &std::path::Path, level: PermissionLevel) -> Backend {
        Backend::with_registry(CommandRegistry::builtin(), dir.to_path_buf(), level)
    }

    fn wait_for_status(backend: &Backend, id: u64, status: JobStatus) -> JobRecord {
        for _ in 0..500 {
            if let Some(job) = backend.jobs().get(id)
                && job.status == status
            {
                return job;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("job #{id} never reached {status:?}");
    }

    #[test]
    fn empty_and_bare_ampersand_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        for input in ["", "   ", "&", "  &  "] {
            assert_eq!(b.execute(input), CommandResult::empty(), "{input:?}");
        }
        assert!(b.jobs().is_empty());
    }

    #[test]
    fn cd_persists_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("proj")).unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        let r = b.execute("cd proj");
        assert_eq!(r.exit_code, 0);
        assert_eq!(b.working_directory(), dir.path().join("proj"));
        assert_eq!(b.execute("pwd").stdout, dir.path().join("proj").to_string_lossy());
    }

    #[test]
    fn failed_cd_keeps_directory() {
        let dir = tempfile::tempdir().unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        assert_eq!(b.execute("cd missing").exit_code, 1);
        assert_eq!(b.working_directory(), dir.path());
    }

    #[test]
    fn heredoc_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        let r = b.execute("cat << EOF");
        assert_eq!(r.exit_code, 1);
        assert_eq!(r.stderr, "parse error: unsupported operator '<<'");
    }

    #[test]
    fn payload_validation() {
        let dir = tempfile::tempdir().unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        let r = b.execute_payload(&serde_json::json!({"input": 42}));
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.starts_with("IPC error: Invalid payload"));
        let r = b.execute_payload(&serde_json::json!({"input": "pwd"}));
        assert_eq!(r.stdout, dir.path().to_string_lossy());
    }

    #[test]
    fn host_info_reflects_session() {
        let dir = tempfile::tempdir().unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Admin);
        let info = b.host_info();
        assert_eq!(info.cwd, dir.path().to_string_lossy());
        assert_eq!(info.permission_level, PermissionLevel::Admin);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["permissionLevel"], "admin");
    }

    #[test]
    fn panicking_handler_is_contained() {
        fn boom(_: &[String], _: &ExecutionContext) -> CommandResult {
            panic!("handler exploded")
        }
        let mut registry = CommandRegistry::new();
        registry.register(CommandDef::new("boom", "panics", boom));
        let dir = tempfile::tempdir().unwrap();
        let b = Backend::with_registry(registry, dir.path().to_path_buf(), PermissionLevel::Standard);
        let r = b.execute("boom");
        assert_eq!(r.exit_code, 1);
        assert_eq!(r.stderr, "Internal error: handler exploded");

        let started = b.execute("boom &");
        assert_eq!(started.stdout, "Started job #1: boom");
        let job = wait_for_status(&b, 1, JobStatus::Failed);
        assert_eq!(job.stderr.as_deref(), Some("Internal error: handler exploded"));
    }

    #[test]
    fn background_job_completes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "b\na\n").unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        let r = b.execute("sort a.txt &");
        assert_eq!(r, CommandResult::success("Started job #1: sort a.txt"));
        let job = wait_for_status(&b, 1, JobStatus::Completed);
        assert_eq!(job.stdout.as_deref(), Some("a\nb"));
        assert_eq!(job.exit_code, Some(0));
    }

    #[test]
    fn background_cd_does_not_touch_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let b = backend_in(dir.path(), PermissionLevel::Standard);
        b.execute("cd sub &");
        wait_for_status(&b, 1, JobStatus::Completed);
        assert_eq!(b.working_directory(), dir.path());
    }

    #[test]
    fn killed_job_stays_gone() {
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let entered_tx = std::sync::Mutex::new(entered_tx);
        let release_rx = std::sync::Mutex::new(release_rx);
        let gate = move |_: &[String], _: &ExecutionContext| {
            let _ = entered_tx.lock().unwrap().send(());
            let _ = release_rx.lock().unwrap().recv();
            CommandResult::success("finished anyway")
        };

        let mut registry = CommandRegistry::builtin();
        registry.register(CommandDef::new("gate", "blocks until released", gate));
        let dir = tempfile::tempdir().unwrap();
        let b = Backend::with_registry(registry, dir.path().to_path_buf(), PermissionLevel::Standard);

        assert_eq!(b.execute("gate &").stdout, "Started job #1: gate");
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(b.execute("killjobs 1").stdout, "Terminated job #1");
        release_tx.send(()).unwrap();

        // Give the worker time to try its write-back.
        thread::sleep(Duration::from_millis(100));
        assert!(b.jobs().get(1).is_none());
        assert_eq!(b.execute("jobs").stdout, "No background jobs tracked.");
    }

    #[test]
    fn slow_command_keeps_concurrent_cd() {
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let entered_tx = std::sync::Mutex::new(entered_tx);
        let release_rx = std::sync::Mutex::new(release_rx);
        let slow = move |_: &[String], _: &ExecutionContext| {
            let _ = entered_tx.lock().unwrap().send(());
            let _ = release_rx.lock().unwrap().recv();
            CommandResult::success("done")
        };

        let mut registry = CommandRegistry::builtin();
        registry.register(CommandDef::new("slow", "blocks until released", slow));
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let b = Backend::with_registry(registry, dir.path().to_path_buf(), PermissionLevel::Standard);

        thread::scope(|s| {
            let worker = s.spawn(|| b.execute("slow"));
            entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(b.execute("cd sub").exit_code, 0);
            release_tx.send(()).unwrap();
            assert_eq!(worker.join().unwrap().stdout, "done");
        });
        assert_eq!(b.working_directory(), dir.path().join("sub"));
    }

    #[test]
    fn panic_messages() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
