//! Scan capability consumed by the orchestrator.

use async_trait::async_trait;
use sonar_core::{ExecutionContext, JobParameters, Result, ScanResult};

/// Performs one external scan and normalizes its output.
///
/// Implementations hold no job state and never touch persistence, so one
/// instance is shared by every running job.
#[async_trait]
pub trait ScanExecutor: Send + Sync {
    /// Run a scan bounded by `ctx`.
    ///
    /// The returned result carries a fresh id; its `scan_id` and `user_id`
    /// are left empty for the caller to fill in.
    ///
    /// # Errors
    /// Returns `ScanError::Canceled` or `ScanError::Timeout` when `ctx` ends
    /// first, and `ScanError::Internal` if the tool fails or its report
    /// cannot be read.
    async fn execute_scan(&self, ctx: &ExecutionContext, params: &JobParameters)
        -> Result<ScanResult>;

    /// Whether the external tool can be invoked.
    async fn is_available(&self) -> bool;

    /// Version string reported by the external tool.
    ///
    /// # Errors
    /// Returns `ScanError::Unavailable` if the tool cannot be invoked.
    async fn version(&self) -> Result<String>;
}
