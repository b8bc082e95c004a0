//! Background eviction of expired jobs and results.

use crate::memory::{MemoryJobStore, PurgeStats};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default time between reaper runs.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Periodically purges records older than the retention window.
///
/// The reaper goes through the store's normal write locks, so it is
/// just another writer from the point of view of concurrent readers.
#[derive(Debug, Clone)]
pub struct Reaper {
    store: Arc<MemoryJobStore>,
    retention: Duration,
    interval: Duration,
}

impl Reaper {
    /// Create a reaper for `store` keeping records for `retention`.
    #[must_use]
    pub fn new(store: Arc<MemoryJobStore>, retention: Duration) -> Self {
        Self {
            store,
            retention,
            interval: DEFAULT_REAP_INTERVAL,
        }
    }

    /// Set the time between runs.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Oldest creation time that survives a purge started now.
    #[must_use]
    pub fn cutoff(&self) -> DateTime<Utc> {
        let now = Utc::now();
        TimeDelta::from_std(self.retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Run one purge immediately.
    pub async fn run_once(&self) -> PurgeStats {
        let stats = self.store.purge_expired(self.cutoff()).await;
        if stats == PurgeStats::default() {
            debug!("reaper found nothing to purge");
        } else {
            info!(
                jobs = stats.jobs,
                results = stats.results,
                orphans = stats.orphans,
                "purged expired scans"
            );
        }
        stats
    }

    /// Run on a fixed interval until `shutdown` is cancelled.
    ///
    /// The first purge happens one interval after spawning.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + self.interval,
                self.interval,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                retention_secs = self.retention.as_secs(),
                interval_secs = self.interval.as_secs(),
                "reaper started"
            );

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                }
            }

            info!("reaper stopped");
        })
    }
}
