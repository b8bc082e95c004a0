//! [`ScanExecutor`] backed by the nmap binary.

use crate::args::{build_args, command_line};
use crate::executor::ScanExecutor;
use crate::mapping::map_report;
use crate::report::parse_report;
use async_trait::async_trait;
use chrono::Utc;
use sonar_core::{ExecutionContext, JobParameters, Result, ScanError, ScanResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Binary used when no path is configured.
pub const DEFAULT_NMAP_PATH: &str = "nmap";

/// Upper bound on `nmap --version`.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs scans by invoking nmap with XML output to a temporary file.
#[derive(Debug, Clone)]
pub struct NmapExecutor {
    binary: String,
}

impl NmapExecutor {
    /// Create an executor for `binary`, a path or a name looked up on `PATH`.
    ///
    /// An empty value selects [`DEFAULT_NMAP_PATH`].
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        let binary = binary.into();
        Self {
            binary: if binary.trim().is_empty() {
                DEFAULT_NMAP_PATH.to_string()
            } else {
                binary
            },
        }
    }

    /// Configured binary.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for NmapExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_NMAP_PATH)
    }
}

#[async_trait]
impl ScanExecutor for NmapExecutor {
    async fn execute_scan(
        &self,
        ctx: &ExecutionContext,
        params: &JobParameters,
    ) -> Result<ScanResult> {
        let start_time = Utc::now();
        let mut args = build_args(params);

        info!(scan_target = %params.target, args = ?args, "executing nmap scan");

        let report_path = tempfile::Builder::new()
            .prefix("sonar-scan-")
            .suffix(".xml")
            .tempfile()
            .map_err(|e| ScanError::internal_with("failed to create temporary file", e))?
            .into_temp_path();
        args.push("-oX".to_string());
        args.push(report_path.to_string_lossy().into_owned());

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ctx.err()
                    .unwrap_or_else(|| ScanError::internal_with("failed to start nmap", e))
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            biased;
            err = ctx.done() => {
                warn!(scan_target = %params.target, error = %err, "nmap scan interrupted");
                return Err(err);
            }
            output = child.wait_with_output() => output.map_err(|e| {
                ctx.err()
                    .unwrap_or_else(|| ScanError::internal_with("failed to wait for nmap", e))
            })?,
        };

        if !output.status.success() {
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            error!(
                scan_target = %params.target,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "nmap scan failed"
            );
            return Err(ScanError::internal(format!(
                "nmap scan failed: {}",
                output.status
            )));
        }

        let xml = tokio::fs::read_to_string(&report_path)
            .await
            .map_err(|e| ScanError::internal_with("failed to read nmap output", e))?;
        let report = parse_report(&xml)
            .map_err(|e| ScanError::internal_with("failed to parse nmap output", e))?;

        let result = map_report(&report, start_time, command_line(&self.binary, &args));

        info!(
            scan_target = %params.target,
            total_hosts = result.total_hosts,
            up_hosts = result.up_hosts,
            host_count = result.hosts.len(),
            duration = result.duration,
            "nmap scan completed"
        );

        Ok(result)
    }

    async fn is_available(&self) -> bool {
        self.version().await.is_ok()
    }

    async fn version(&self) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(VERSION_TIMEOUT, command.output())
            .await
            .map_err(|_| ScanError::Unavailable("nmap --version timed out".to_string()))?
            .map_err(|e| ScanError::Unavailable(format!("failed to get nmap version: {e}")))?;

        if !output.status.success() {
            return Err(ScanError::Unavailable(format!(
                "nmap --version exited with {}",
                output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        debug!(binary = %self.binary, version = %version, "detected nmap version");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_uses_default() {
        assert_eq!(NmapExecutor::new("").binary(), "nmap");
        assert_eq!(NmapExecutor::new("  ").binary(), "nmap");
        assert_eq!(
            NmapExecutor::new("/opt/nmap/bin/nmap").binary(),
            "/opt/nmap/bin/nmap"
        );
    }
}
