//! In-memory implementation of [`JobStore`].

use crate::store::JobStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sonar_core::{Job, Result, ScanError, ScanResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Counts of records removed by one purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Jobs created before the cutoff
    pub jobs: usize,
    /// Results removed together with their expired job
    pub results: usize,
    /// Results whose job no longer existed
    pub orphans: usize,
}

/// Process-memory job and result store.
///
/// Jobs and results live in separate maps, each behind its own fair
/// read/write lock. Anything that locks both takes the jobs lock first.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
    results: RwLock<HashMap<String, ScanResult>>,
}

impl MemoryJobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Number of stored results.
    pub async fn result_count(&self) -> usize {
        self.results.read().await.len()
    }

    /// Delete every job created before `cutoff` along with its result, then
    /// every result whose job no longer exists.
    pub async fn purge_expired(&self, cutoff: DateTime<Utc>) -> PurgeStats {
        let mut jobs = self.jobs.write().await;
        let mut results = self.results.write().await;
        let mut stats = PurgeStats::default();

        jobs.retain(|id, job| {
            if job.created_at >= cutoff {
                return true;
            }
            if let Some(result_id) = &job.result_id {
                if results.remove(result_id).is_some() {
                    stats.results += 1;
                }
            }
            debug!(scan_id = %id, created_at = %job.created_at, "purged expired scan");
            stats.jobs += 1;
            false
        });

        results.retain(|id, result| {
            if result.scan_id.is_empty() || jobs.contains_key(&result.scan_id) {
                return true;
            }
            debug!(result_id = %id, scan_id = %result.scan_id, "purged orphaned scan result");
            stats.orphans += 1;
            false
        });

        stats
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn save_job(&self, job: &Job) -> Result<()> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        debug!(scan_id = %job.id, user_id = %job.user_id, "saved scan");
        Ok(())
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let Some(stored) = jobs.get_mut(&job.id) else {
            return Err(job_not_found(&job.id));
        };
        stored.clone_from(job);
        debug!(scan_id = %job.id, status = %job.status, "updated scan");
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| job_not_found(id))
    }

    async fn list_jobs(&self, user_id: &str, limit: usize, offset: usize) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| user_id.is_empty() || job.user_id == user_id)
            .cloned()
            .collect();

        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(jobs.into_iter().skip(offset).take(limit).collect())
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        if self.jobs.write().await.remove(id).is_none() {
            return Err(job_not_found(id));
        }
        debug!(scan_id = %id, "deleted scan");
        Ok(())
    }

    async fn save_result(&self, result: &ScanResult) -> Result<()> {
        self.results
            .write()
            .await
            .insert(result.id.clone(), result.clone());
        debug!(result_id = %result.id, scan_id = %result.scan_id, "saved scan result");
        Ok(())
    }

    async fn get_result(&self, id: &str) -> Result<ScanResult> {
        self.results
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| result_not_found(id))
    }

    async fn delete_result(&self, id: &str) -> Result<()> {
        if self.results.write().await.remove(id).is_none() {
            return Err(result_not_found(id));
        }
        debug!(result_id = %id, "deleted scan result");
        Ok(())
    }
}

fn job_not_found(id: &str) -> ScanError {
    ScanError::NotFound(format!("scan with ID {id} not found"))
}

fn result_not_found(id: &str) -> ScanError {
    ScanError::NotFound(format!("scan result with ID {id} not found"))
}
