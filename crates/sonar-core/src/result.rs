//! Normalized scan results.

use crate::job::{Job, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Script output marker counted as a vulnerability finding.
const VULNERABLE_MARKER: &str = "VULNERABLE";

/// Outcome of one external-tool invocation, normalized into the domain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Job that produced this result
    pub scan_id: String,
    /// Owner of the originating job
    pub user_id: String,
    /// When the invocation started
    pub start_time: DateTime<Utc>,
    /// When the tool reported the run finished
    pub end_time: DateTime<Utc>,
    /// Elapsed seconds, as reported by the tool
    pub duration: f64,
    /// Literal command line, for audit
    pub command: String,
    /// Human-readable summary reported by the tool
    pub summary: String,
    /// Hosts the tool scanned
    pub total_hosts: u32,
    /// Hosts the tool reported up
    pub up_hosts: u32,
    /// Hosts that were up
    pub hosts: Vec<Host>,
}

impl ScanResult {
    /// Number of ports in state `open` across all hosts.
    #[must_use]
    pub fn open_port_count(&self) -> usize {
        self.hosts
            .iter()
            .flat_map(|host| &host.ports)
            .filter(|port| port.state == "open")
            .count()
    }

    /// Number of script outputs flagging a vulnerability.
    #[must_use]
    pub fn vulnerability_count(&self) -> usize {
        self.hosts
            .iter()
            .flat_map(|host| &host.scripts)
            .filter(|script| script.output.contains(VULNERABLE_MARKER))
            .count()
    }
}

/// A host reported up by the scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// IPv4 address
    pub ip: String,
    /// Resolved hostnames
    pub hostnames: Vec<String>,
    /// Host status reported by the tool
    pub status: String,
    /// Best OS guess
    pub os: Option<String>,
    /// Scanned ports
    pub ports: Vec<Port>,
    /// Script results
    pub scripts: Vec<Script>,
    /// Additional fingerprinting data
    pub metadata: HostMetadata,
}

/// A scanned port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port number
    pub port: u16,
    /// Protocol (tcp/udp)
    pub protocol: String,
    /// Port state (open/closed/filtered)
    pub state: String,
    /// Service name
    pub service: String,
    /// Product name
    pub product: String,
    /// Version information
    pub version: String,
    /// Extra information
    pub extra_info: String,
}

/// Output of one script run against a port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Script identifier
    pub id: String,
    /// Raw script output
    pub output: String,
    /// Structured data (not populated yet)
    pub data: BTreeMap<String, String>,
}

/// Optional fingerprinting data about a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMetadata {
    /// Network distance in hops
    pub distance: u32,
    /// System uptime in seconds
    pub uptime: f64,
    /// Last boot time
    pub last_boot: Option<DateTime<Utc>>,
    /// TCP sequence prediction difficulty
    pub tcp_sequence: String,
    /// IP ID sequence generation class
    pub ip_id_sequence: String,
}

/// Counting summary of a job and its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job identifier
    pub id: String,
    /// Owner of the job
    pub user_id: String,
    /// Scanned target
    pub target: String,
    /// Current status
    pub status: JobStatus,
    /// When execution started
    pub start_time: Option<DateTime<Utc>>,
    /// When the job reached a terminal status
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and end, 0 when either is missing
    pub duration: f64,
    /// Hosts scanned
    pub total_hosts: u32,
    /// Hosts up
    pub up_hosts: u32,
    /// Open ports found
    pub open_ports: usize,
    /// Script outputs flagged vulnerable
    pub vuln_count: usize,
    /// Whether a result is attached
    pub has_results: bool,
}

impl JobSummary {
    /// Summarize a job and, when available, its result.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(job: &Job, result: Option<&ScanResult>) -> Self {
        let duration = match (job.started_at, job.completed_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        Self {
            id: job.id.clone(),
            user_id: job.user_id.clone(),
            target: job.options.target.clone(),
            status: job.status,
            start_time: job.started_at,
            end_time: job.completed_at,
            duration,
            total_hosts: result.map_or(0, |r| r.total_hosts),
            up_hosts: result.map_or(0, |r| r.up_hosts),
            open_ports: result.map_or(0, ScanResult::open_port_count),
            vuln_count: result.map_or(0, ScanResult::vulnerability_count),
            has_results: result.is_some(),
        }
    }
}
