//! Reachability of the external scanning tool.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one health probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    /// Whether the tool answered
    pub available: bool,
    /// Version line reported by the tool
    pub version: Option<String>,
    /// Why the probe failed
    pub error: Option<String>,
    /// When the probe ran
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    /// A successful probe.
    #[must_use]
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            available: true,
            version: Some(version.into()),
            error: None,
            checked_at: Utc::now(),
        }
    }

    /// A failed probe.
    #[must_use]
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            available: false,
            version: None,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }
}
