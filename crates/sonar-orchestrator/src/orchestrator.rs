//! Scan orchestrator for admitting, running and cancelling scan jobs.
//!
//! Each admitted job lives in the active set until its terminal status has
//! been written to the store. The active set is both the concurrency budget
//! and the place where status transitions of live jobs are decided. It is
//! only held while a transition is decided, never across store I/O.
//!
//! Every transition bumps the job's write version. Writes for one job are
//! serialized on a per-job lock and a write older than one already stored is
//! skipped, so a late Running write can never overwrite Cancelled.

use crate::health::HealthStatus;
use chrono::Utc;
use sonar_core::{
    ExecutionContext, Job, JobParameters, JobSummary, Result, ScanDefaults, ScanError, ScanResult,
};
use sonar_executor::ScanExecutor;
use sonar_store::JobStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Concurrency budget used unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT_SCANS: usize = 5;

/// Write version of a job's first record.
const FIRST_VERSION: u64 = 1;

/// A job that has been admitted and whose terminal record is not yet stored.
struct ActiveJob {
    job: Job,
    cancel: CancellationToken,
    version: u64,
    /// Highest version written to the store
    written: Arc<Mutex<u64>>,
}

impl ActiveJob {
    fn new(job: Job, cancel: CancellationToken) -> Self {
        Self {
            job,
            cancel,
            version: 0,
            written: Arc::new(Mutex::new(0)),
        }
    }

    /// Snapshot the job after a transition.
    fn stage(&mut self) -> StagedWrite {
        self.version += 1;
        StagedWrite {
            job: self.job.clone(),
            version: self.version,
            written: self.written.clone(),
        }
    }
}

/// A job snapshot waiting to be written outside the active-set lock.
struct StagedWrite {
    job: Job,
    version: u64,
    written: Arc<Mutex<u64>>,
}

/// How an execution ended, decided before the active set is locked again.
enum Finish {
    Complete(String),
    Fail(String),
    Cancel,
}

/// Coordinates scan execution and persistence.
#[derive(Clone)]
pub struct ScanOrchestrator {
    /// Runs the external tool
    executor: Arc<dyn ScanExecutor>,
    /// Persists jobs and results
    store: Arc<dyn JobStore>,
    /// Pending and running jobs by id
    active: Arc<Mutex<HashMap<String, ActiveJob>>>,
    /// Maximum size of the active set
    max_concurrent_scans: usize,
    /// Defaults applied to incoming parameters
    defaults: ScanDefaults,
    /// Parent of every job's cancellation token
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ScanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("max_concurrent_scans", &self.max_concurrent_scans)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ScanOrchestrator {
    /// Create a new orchestrator.
    #[must_use]
    pub fn new(executor: Arc<dyn ScanExecutor>, store: Arc<dyn JobStore>) -> Self {
        Self {
            executor,
            store,
            active: Arc::new(Mutex::new(HashMap::new())),
            max_concurrent_scans: DEFAULT_MAX_CONCURRENT_SCANS,
            defaults: ScanDefaults::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Set the maximum number of concurrent scans.
    #[must_use]
    pub fn with_max_concurrent_scans(mut self, max: usize) -> Self {
        self.max_concurrent_scans = max;
        self
    }

    /// Set the defaults applied while normalizing parameters.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ScanDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Derive job cancellation from `token`, so cancelling it tears down
    /// every running scan.
    #[must_use]
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Validate, admit and persist a new scan, then start it in the
    /// background.
    ///
    /// Returns the job as persisted, still Pending.
    ///
    /// # Errors
    /// - `ScanError::InvalidInput` if the target is empty
    /// - `ScanError::ResourceExhausted` if the concurrency budget is spent
    /// - `ScanError::Internal` if the job cannot be persisted
    pub async fn start_scan(&self, user_id: &str, params: JobParameters) -> Result<Job> {
        let params = params.normalized(&self.defaults)?;
        let job = Job::new(user_id, params);
        let token = self.shutdown.child_token();

        let staged = {
            let mut active = self.active.lock().await;
            if active.len() >= self.max_concurrent_scans {
                warn!(
                    user_id = %user_id,
                    active = active.len(),
                    max = self.max_concurrent_scans,
                    "rejected scan: concurrency budget exhausted"
                );
                return Err(ScanError::ResourceExhausted(
                    "maximum concurrent scans reached".to_string(),
                ));
            }

            let mut entry = ActiveJob::new(job.clone(), token.clone());
            let staged = entry.stage();
            active.insert(job.id.clone(), entry);
            staged
        };

        if let Err(e) = self.write(&staged).await {
            error!(job_id = %job.id, error = %e, "failed to save new scan");
            self.active.lock().await.remove(&job.id);
            return Err(ScanError::internal_with("failed to save scan", e));
        }

        info!(
            job_id = %job.id,
            user_id = %job.user_id,
            scan_target = %job.options.target,
            "scan queued"
        );

        let orchestrator = self.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            orchestrator.run_job(job_id, token).await;
        });

        Ok(job)
    }

    /// Drive one admitted job from Pending to a terminal status.
    async fn run_job(self, job_id: String, token: CancellationToken) {
        let (params, user_id, staged) = {
            let mut active = self.active.lock().await;
            let Some(entry) = active.get_mut(&job_id) else {
                debug!(job_id = %job_id, "scan cancelled before it started");
                return;
            };
            if entry.job.mark_running(Utc::now()).is_err() {
                debug!(job_id = %job_id, status = %entry.job.status, "scan ended before it started");
                return;
            }
            (
                entry.job.options.clone(),
                entry.job.user_id.clone(),
                entry.stage(),
            )
        };
        let _ = self.write(&staged).await;

        info!(job_id = %job_id, scan_target = %params.target, "scan started");

        let ctx = ExecutionContext::new(token, params.timeout);
        let finish = match self.executor.execute_scan(&ctx, &params).await {
            Ok(result) => self.record_result(&job_id, &user_id, result).await,
            Err(ScanError::Canceled(_)) => Finish::Cancel,
            Err(e) => Finish::Fail(e.to_string()),
        };

        let staged = {
            let mut active = self.active.lock().await;
            match active.get_mut(&job_id) {
                Some(entry) if !entry.job.status.is_terminal() => {
                    let now = Utc::now();
                    let transition = match &finish {
                        Finish::Complete(result_id) => entry.job.complete(result_id.clone(), now),
                        Finish::Fail(message) => entry.job.fail(message.clone(), now),
                        Finish::Cancel => entry.job.cancel(now),
                    };
                    if let Err(e) = transition {
                        error!(job_id = %job_id, error = %e, "invalid scan transition");
                    }
                    Some(entry.stage())
                }
                _ => None,
            }
        };

        let Some(staged) = staged else {
            // Already cancelled; cancel_job owns the record.
            debug!(job_id = %job_id, "discarding outcome of cancelled scan");
            if let Finish::Complete(result_id) = finish {
                let _ = self.store.delete_result(&result_id).await;
            }
            return;
        };

        let _ = self.write(&staged).await;
        self.active.lock().await.remove(&job_id);

        let job = &staged.job;
        match &job.error {
            Some(err) => warn!(job_id = %job_id, status = %job.status, error = %err, "scan finished"),
            None => info!(job_id = %job_id, status = %job.status, "scan finished"),
        }
    }

    /// Tag and persist a successful result. A result that cannot be saved
    /// fails the job instead.
    async fn record_result(&self, job_id: &str, user_id: &str, mut result: ScanResult) -> Finish {
        result.scan_id = job_id.to_string();
        result.user_id = user_id.to_string();

        match self.store.save_result(&result).await {
            Ok(()) => Finish::Complete(result.id),
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to save scan result");
                Finish::Fail(format!("failed to save scan result: {e}"))
            }
        }
    }

    /// Write a staged snapshot unless a newer one for the same job is
    /// already stored.
    async fn write(&self, staged: &StagedWrite) -> Result<()> {
        let mut written = staged.written.lock().await;
        if *written >= staged.version {
            debug!(job_id = %staged.job.id, version = staged.version, "skipping stale scan write");
            return Ok(());
        }

        if staged.version == FIRST_VERSION {
            self.store.save_job(&staged.job).await?;
        } else {
            self.persist(&staged.job).await?;
        }
        *written = staged.version;
        Ok(())
    }

    /// Write `job` back to the store, inserting it if the update misses.
    async fn persist(&self, job: &Job) -> Result<()> {
        let Err(update_err) = self.store.update_job(job).await else {
            return Ok(());
        };
        warn!(job_id = %job.id, error = %update_err, "scan update failed, saving instead");

        self.store.save_job(job).await.map_err(|e| {
            error!(job_id = %job.id, status = %job.status, error = %e, "failed to persist scan");
            ScanError::internal_with("failed to persist scan", e)
        })
    }

    /// Fetch a job, preferring the live copy of an active one.
    pub async fn get_job(&self, id: &str) -> Result<Job> {
        if let Some(entry) = self.active.lock().await.get(id) {
            return Ok(entry.job.clone());
        }
        self.store.get_job(id).await
    }

    /// List jobs newest first. An empty `user_id` lists every owner.
    pub async fn list_jobs(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<Job>> {
        self.store.list_jobs(user_id, limit, offset).await
    }

    /// Cancel a pending or running job.
    ///
    /// The job is marked Cancelled immediately; a running invocation is torn
    /// down through its cancellation token and its outcome discarded.
    ///
    /// If the cancellation cannot be written, the invocation is still torn
    /// down and the job leaves the active set, but the store keeps the last
    /// status it recorded and `Internal` is returned. Cancelling again once
    /// the store recovers records the cancellation.
    ///
    /// # Errors
    /// - `ScanError::NotFound` if the job does not exist
    /// - `ScanError::InvalidState` if the job is already terminal
    /// - `ScanError::Internal` if the cancellation cannot be persisted
    pub async fn cancel_job(&self, id: &str) -> Result<()> {
        let staged = {
            let mut active = self.active.lock().await;
            match active.get_mut(id) {
                Some(entry) => {
                    if entry.job.status.is_terminal() {
                        return Err(not_cancellable());
                    }
                    entry.job.cancel(Utc::now())?;
                    entry.cancel.cancel();
                    Some(entry.stage())
                }
                None => None,
            }
        };

        if let Some(staged) = staged {
            let written = self.write(&staged).await;
            self.active.lock().await.remove(id);
            match &written {
                Ok(()) => info!(job_id = %id, user_id = %staged.job.user_id, "scan cancelled"),
                Err(e) => error!(job_id = %id, error = %e, "scan cancelled but not recorded"),
            }
            return written;
        }

        let mut job = self.store.get_job(id).await?;
        if job.status.is_terminal() {
            return Err(not_cancellable());
        }
        job.cancel(Utc::now())?;
        self.store
            .update_job(&job)
            .await
            .map_err(|e| ScanError::internal_with("failed to update scan", e))?;

        info!(job_id = %id, user_id = %job.user_id, "scan cancelled");
        Ok(())
    }

    /// Fetch a result by id.
    pub async fn get_result(&self, id: &str) -> Result<ScanResult> {
        self.store.get_result(id).await
    }

    /// Counting summary of a job and, when it has one, its result.
    pub async fn summarize(&self, job_id: &str) -> Result<JobSummary> {
        let job = self.get_job(job_id).await?;
        let result = match &job.result_id {
            Some(result_id) => match self.store.get_result(result_id).await {
                Ok(result) => Some(result),
                Err(ScanError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        Ok(JobSummary::new(&job, result.as_ref()))
    }

    /// Probe the external tool.
    pub async fn health(&self) -> HealthStatus {
        match self.executor.version().await {
            Ok(version) => HealthStatus::healthy(version),
            Err(e) => HealthStatus::unhealthy(e.to_string()),
        }
    }

    /// Check that the external tool can be invoked.
    ///
    /// # Errors
    /// Returns `ScanError::Unavailable` if it cannot.
    pub async fn validate_tool(&self) -> Result<()> {
        if self.executor.is_available().await {
            Ok(())
        } else {
            Err(ScanError::Unavailable(
                "scan tool is not available".to_string(),
            ))
        }
    }

    /// Version reported by the external tool.
    pub async fn tool_version(&self) -> Result<String> {
        self.executor.version().await
    }

    /// Number of jobs counting against the concurrency budget.
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Tear down every running scan.
    ///
    /// Running jobs end Cancelled. The orchestrator keeps accepting calls,
    /// but scans started afterwards are cancelled as soon as they run.
    pub fn shutdown(&self) {
        info!("cancelling in-flight scans");
        self.shutdown.cancel();
    }
}

fn not_cancellable() -> ScanError {
    ScanError::InvalidState("scan is not running or pending".to_string())
}
