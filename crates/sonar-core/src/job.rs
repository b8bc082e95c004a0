//! Scan jobs and their lifecycle.
//!
//! A [`Job`] moves along a small state machine:
//!
//! ```text
//! Pending ──► Running ──► Completed
//!    │           ├──────► Failed
//!    │           └──────► Cancelled
//!    ├──────────────────► Failed
//!    └──────────────────► Cancelled
//! ```
//!
//! The transition methods on [`Job`] are the only way the orchestrator moves
//! a job, so the record invariants (`result_id` iff Completed, `completed_at`
//! iff terminal, progress 100 only when Completed) hold by construction.

use crate::error::{Result, ScanError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Port range scanned when the caller does not specify one.
pub const DEFAULT_PORTS: &str = "1-1000";

/// Timing template used when the caller's value is absent or out of range.
pub const DEFAULT_TIMING_TEMPLATE: i32 = 3;

/// Scan timeout used when the caller passes zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Slowest (paranoid) timing template.
pub const MIN_TIMING_TEMPLATE: i32 = 0;

/// Fastest (insane) timing template.
pub const MAX_TIMING_TEMPLATE: i32 = 5;

/// Lifecycle status of a scan job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Admitted and persisted, execution not yet started
    #[serde(alias = "Pending")]
    Pending,
    /// External tool invocation in progress
    #[serde(alias = "Running")]
    Running,
    /// Finished successfully; a result is attached
    #[serde(alias = "Completed")]
    Completed,
    /// Finished with an error recorded on the job
    #[serde(alias = "Failed")]
    Failed,
    /// Cancelled by a caller
    #[serde(alias = "Cancelled")]
    Cancelled,
}

impl JobStatus {
    /// Whether no further transitions are permitted.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Failed | Self::Cancelled)
                | (Self::Running, Self::Completed | Self::Failed | Self::Cancelled)
        )
    }

    /// Wire representation of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan technique requested from the external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanType {
    /// TCP SYN scan
    Syn,
    /// TCP connect scan
    Connect,
    /// UDP scan
    Udp,
    /// Service version detection
    Version,
    /// Default script scan
    Script,
    /// Aggressive scan (version, scripts, OS, traceroute)
    All,
}

impl ScanType {
    /// Command-line flag selecting this scan technique.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Syn => "-sS",
            Self::Connect => "-sT",
            Self::Udp => "-sU",
            Self::Version => "-sV",
            Self::Script => "-sC",
            Self::All => "-A",
        }
    }
}

/// Defaults applied while normalizing [`JobParameters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDefaults {
    /// Port specification used when none is given
    pub ports: String,
    /// Timeout used when zero is given
    pub timeout: Duration,
    /// Timing template used when the given one is out of range
    pub timing_template: i32,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            timing_template: DEFAULT_TIMING_TEMPLATE,
        }
    }
}

/// Input parameters of a scan job. Immutable once the job is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct JobParameters {
    /// Target host(s) or network
    pub target: String,
    /// Port specification, e.g. `22,80,443` or `1-1000`
    #[serde(default)]
    pub ports: String,
    /// Scan technique; the tool's own default when absent
    #[serde(default)]
    pub scan_type: Option<ScanType>,
    /// Timing aggressiveness, 0 (paranoid) to 5 (insane)
    #[serde(default = "default_timing_template")]
    pub timing_template: i32,
    /// Enable service/version detection
    #[serde(default)]
    pub service_detection: bool,
    /// Enable OS detection
    #[serde(default)]
    pub os_detection: bool,
    /// Enable default script scanning
    #[serde(default)]
    pub script_scan: bool,
    /// Extra command-line arguments, appended verbatim
    #[serde(default)]
    pub extra_options: Vec<String>,
    /// Scan timeout, serialized in whole seconds
    #[serde(default, with = "duration_secs", alias = "timeout_seconds")]
    pub timeout: Duration,
}

fn default_timing_template() -> i32 {
    DEFAULT_TIMING_TEMPLATE
}

impl JobParameters {
    /// Create parameters for `target` with every other field left to defaults.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ports: String::new(),
            scan_type: None,
            timing_template: DEFAULT_TIMING_TEMPLATE,
            service_detection: false,
            os_detection: false,
            script_scan: false,
            extra_options: Vec::new(),
            timeout: Duration::ZERO,
        }
    }

    /// Set the port specification.
    #[must_use]
    pub fn with_ports(mut self, ports: impl Into<String>) -> Self {
        self.ports = ports.into();
        self
    }

    /// Set the scan technique.
    #[must_use]
    pub fn with_scan_type(mut self, scan_type: ScanType) -> Self {
        self.scan_type = Some(scan_type);
        self
    }

    /// Set the timing template.
    #[must_use]
    pub fn with_timing_template(mut self, timing_template: i32) -> Self {
        self.timing_template = timing_template;
        self
    }

    /// Set the scan timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append an extra command-line argument.
    #[must_use]
    pub fn with_extra_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }

    /// Validate the parameters and fill in defaults.
    ///
    /// An empty target is rejected; everything else is repaired rather than
    /// refused: empty ports, out-of-range timing and a zero timeout are
    /// replaced by the values in `defaults`.
    ///
    /// # Errors
    /// Returns `ScanError::InvalidInput` if the target is empty.
    pub fn normalized(mut self, defaults: &ScanDefaults) -> Result<Self> {
        if self.target.trim().is_empty() {
            return Err(ScanError::InvalidInput("target is required".to_string()));
        }
        if self.ports.trim().is_empty() {
            self.ports.clone_from(&defaults.ports);
        }
        if !(MIN_TIMING_TEMPLATE..=MAX_TIMING_TEMPLATE).contains(&self.timing_template) {
            self.timing_template = defaults.timing_template;
        }
        if self.timeout.is_zero() {
            self.timeout = defaults.timeout;
        }
        Ok(self)
    }
}

/// A requested, trackable unit of scan work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owner of the job
    pub user_id: String,
    /// Scan parameters
    pub options: JobParameters,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When execution started
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message if the job failed
    pub error: Option<String>,
    /// Result reference, set once completed
    pub result_id: Option<String>,
}

impl Job {
    /// Create a new pending job with a fresh identifier.
    #[must_use]
    pub fn new(user_id: impl Into<String>, options: JobParameters) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            options,
            status: JobStatus::Pending,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            result_id: None,
        }
    }

    /// Whether the job still counts against the concurrency budget.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Move the job to Running.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(now);
        self.progress = 0;
        Ok(())
    }

    /// Move the job to Completed, attaching its result.
    pub fn complete(&mut self, result_id: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Completed)?;
        self.progress = 100;
        self.result_id = Some(result_id.into());
        self.completed_at = Some(now);
        Ok(())
    }

    /// Move the job to Failed, recording the error. Progress is left as is.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error.into());
        self.completed_at = Some(now);
        Ok(())
    }

    /// Move the job to Cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(JobStatus::Cancelled)?;
        self.completed_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ScanError::InvalidState(format!(
                "scan {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
