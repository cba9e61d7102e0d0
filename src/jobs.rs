//! Background job table.
//!
//! A [`JobManager`] owns every [`JobRecord`]. The worker thread running a
//! job holds only a copy of its record and writes results back through
//! [`JobManager::update`], which refuses to resurrect a job that was killed
//! (or otherwise finished) in the meantime.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::exec::{CancellationToken, CommandResult};
use crate::limits::MAX_COMPLETED_JOBS;

/// Exit code recorded for a job terminated with `killjobs`.
pub const KILLED_EXIT_CODE: i32 = 143;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Killed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Killed => "killed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != JobStatus::Running
    }
}

/// One tracked background pipeline. Times are milliseconds since the epoch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: u64,
    pub command: String,
    pub status: JobStatus,
    pub started_at: u64,
    pub ended_at: Option<u64>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i32>,
    #[serde(skip)]
    pub cancel: CancellationToken,
}

impl JobRecord {
    /// Mark the job completed with the pipeline's result.
    ///
    /// A nonzero exit code is still `completed`: the pipeline ran to the end.
    pub fn complete(mut self, result: CommandResult) -> Self {
        self.status = JobStatus::Completed;
        self.ended_at = Some(now_millis());
        self.stdout = Some(result.stdout);
        self.stderr = Some(result.stderr);
        self.exit_code = Some(result.exit_code);
        self
    }

    /// Mark the job failed: the pipeline itself blew up.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.ended_at = Some(now_millis());
        self.stderr = Some(message.into());
        self.exit_code = Some(1);
        self
    }

    /// Elapsed time in milliseconds, up to now for a running job.
    pub fn duration_ms(&self) -> u64 {
        self.ended_at
            .unwrap_or_else(now_millis)
            .saturating_sub(self.started_at)
    }
}

#[derive(Debug, Default)]
struct JobTable {
    jobs: BTreeMap<u64, JobRecord>,
    counter: u64,
}

impl JobTable {
    /// Drop the oldest finished jobs beyond [`MAX_COMPLETED_JOBS`].
    /// Running jobs are never candidates.
    fn prune(&mut self) {
        let mut finished: Vec<(u64, u64)> = self
            .jobs
            .values()
            .filter(|j| j.status.is_terminal())
            .map(|j| (j.ended_at.unwrap_or(0), j.id))
            .collect();
        if finished.len() <= MAX_COMPLETED_JOBS {
            return;
        }
        finished.sort_unstable();
        let excess = finished.len() - MAX_COMPLETED_JOBS;
        for (_, id) in finished.into_iter().take(excess) {
            log::debug!("pruning job #{id}");
            self.jobs.remove(&id);
        }
    }
}

/// Thread-safe job table shared by the backend, its worker threads and the
/// `jobs`/`killjobs` commands.
#[derive(Debug, Default)]
pub struct JobManager {
    inner: Mutex<JobTable>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, JobTable> {
        // A panicking job thread must not take the whole table down with it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new running job and return a copy of its record.
    pub fn create(&self, command: impl Into<String>) -> JobRecord {
        let mut table = self.table();
        table.counter += 1;
        let job = JobRecord {
            id: table.counter,
            command: command.into(),
            status: JobStatus::Running,
            started_at: now_millis(),
            ended_at: None,
            stdout: None,
            stderr: None,
            exit_code: None,
            cancel: CancellationToken::new(),
        };
        log::info!("job #{} started: {}", job.id, job.command);
        table.jobs.insert(job.id, job.clone());
        table.prune();
        job
    }

    pub fn get(&self, id: u64) -> Option<JobRecord> {
        self.table().jobs.get(&id).cloned()
    }

    /// Every tracked job, ordered by id.
    pub fn get_all(&self) -> Vec<JobRecord> {
        self.table().jobs.values().cloned().collect()
    }

    /// Terminate a job and forget it.
    ///
    /// A running job is marked killed and its cancellation token fired
    /// before removal. Returns `false` only when the id is unknown.
    pub fn kill(&self, id: u64) -> bool {
        let mut table = self.table();
        let Some(mut job) = table.jobs.remove(&id) else {
            return false;
        };
        if job.status == JobStatus::Running {
            job.status = JobStatus::Killed;
            job.ended_at = Some(now_millis());
            job.exit_code = Some(KILLED_EXIT_CODE);
            job.stderr = Some("Job killed by user.".into());
            job.cancel.cancel();
            log::info!("job #{id} killed after {}ms", job.duration_ms());
        } else {
            log::debug!("job #{id} removed ({})", job.status.as_str());
        }
        true
    }

    /// Store a finished record from a worker.
    ///
    /// Only applies if the job is still tracked and still running; returns
    /// whether the record was stored.
    pub fn update(&self, job: JobRecord) -> bool {
        let mut table = self.table();
        match table.jobs.get(&job.id) {
            Some(current) if current.status == JobStatus::Running => {}
            Some(current) => {
                log::debug!(
                    "discarding update for job #{}: already {}",
                    job.id,
                    current.status.as_str()
                );
                return false;
            }
            None => {
                log::debug!("discarding update for job #{}: no longer tracked", job.id);
                return false;
            }
        }
        log::info!(
            "job #{} {} (exit {:?})",
            job.id,
            job.status.as_str(),
            job.exit_code
        );
        table.jobs.insert(job.id, job);
        table.prune();
        true
    }

    pub fn len(&self) -> usize {
        self.table().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
