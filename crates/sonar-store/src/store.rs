//! Persistence capability consumed by the orchestrator.

use async_trait::async_trait;
use sonar_core::{Job, Result, ScanResult};

/// CRUD access to jobs and results.
///
/// Implementations must be safe to share across tasks and must hand out and
/// accept only independent copies: mutating a returned value never changes
/// stored state.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace a job.
    async fn save_job(&self, job: &Job) -> Result<()>;

    /// Replace an existing job.
    ///
    /// # Errors
    /// Returns `ScanError::NotFound` if no job with that id exists.
    async fn update_job(&self, job: &Job) -> Result<()>;

    /// Fetch a job by id.
    async fn get_job(&self, id: &str) -> Result<Job>;

    /// List jobs newest first, filtered by owner (empty `user_id` means all),
    /// skipping `offset` and returning at most `limit`.
    async fn list_jobs(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<Job>>;

    /// Remove a job.
    async fn delete_job(&self, id: &str) -> Result<()>;

    /// Insert or replace a result.
    async fn save_result(&self, result: &ScanResult) -> Result<()>;

    /// Fetch a result by id.
    async fn get_result(&self, id: &str) -> Result<ScanResult>;

    /// Remove a result.
    async fn delete_result(&self, id: &str) -> Result<()>;
}
