//! Configuration management for Sonar.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::job::{ScanDefaults, DEFAULT_PORTS, DEFAULT_TIMING_TEMPLATE};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/sonar/config.toml` (or platform equivalent)
/// unless an explicit path is given. If the file doesn't exist, default
/// values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// External scanner settings
    pub scanner: ScannerConfig,
    /// Retention settings for the in-memory store
    pub storage: StorageConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `path`, or from the platform config path when
    /// `path` is `None`, falling back to defaults if the file is missing.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides, then validate.
    ///
    /// Supports the following environment variables:
    /// - `SONAR_NMAP_PATH`: Override the scanner binary
    /// - `SONAR_MAX_CONCURRENT_SCANS`: Override the concurrency budget
    /// - `SONAR_PORT`: Override the HTTP port
    /// - `SONAR_RETENTION_HOURS`: Override the retention window
    /// - `SONAR_LOG_FORMAT`: Override the log format (`pretty` or `json`)
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`. Unparsable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SONAR_NMAP_PATH") {
            tracing::debug!("Override scanner.nmap_path from env: {}", path);
            self.scanner.nmap_path = path;
        }

        if let Some(max) = lookup("SONAR_MAX_CONCURRENT_SCANS").and_then(|v| v.parse().ok()) {
            self.scanner.max_concurrent_scans = max;
            tracing::debug!("Override scanner.max_concurrent_scans from env: {}", max);
        }

        if let Some(port) = lookup("SONAR_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
            tracing::debug!("Override server.port from env: {}", port);
        }

        if let Some(hours) = lookup("SONAR_RETENTION_HOURS").and_then(|v| v.parse().ok()) {
            self.storage.retention_hours = hours;
            tracing::debug!("Override storage.retention_hours from env: {}", hours);
        }

        if let Some(format) = lookup("SONAR_LOG_FORMAT") {
            tracing::debug!("Override logging.format from env: {}", format);
            self.logging.format = format;
        }
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scanner.max_concurrent_scans == 0 {
            return Err(invalid("scanner.max_concurrent_scans", "must be at least 1"));
        }
        if self.storage.retention_hours == 0 {
            return Err(invalid("storage.retention_hours", "must be at least 1"));
        }
        if self.storage.reap_interval_secs == 0 {
            return Err(invalid("storage.reap_interval_secs", "must be at least 1"));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid("logging.format", "expected \"pretty\" or \"json\""));
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/sonar/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "sonar", "sonar").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: String,
    /// Port to listen on
    pub port: u16,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8081,
            request_timeout_secs: 30,
        }
    }
}

/// External scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Path to the nmap binary (looked up on `PATH` if bare)
    pub nmap_path: String,
    /// Timeout applied to jobs that don't set one, in seconds
    pub default_timeout_secs: u64,
    /// Ports scanned when a job doesn't set any
    pub default_ports: String,
    /// Maximum number of jobs running at once
    pub max_concurrent_scans: usize,
}

impl ScannerConfig {
    /// Normalization defaults derived from this configuration.
    #[must_use]
    pub fn scan_defaults(&self) -> ScanDefaults {
        ScanDefaults {
            ports: self.default_ports.clone(),
            timeout: Duration::from_secs(self.default_timeout_secs),
            timing_template: DEFAULT_TIMING_TEMPLATE,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            nmap_path: "nmap".to_string(),
            default_timeout_secs: 300,
            default_ports: DEFAULT_PORTS.to_string(),
            max_concurrent_scans: 5,
        }
    }
}

/// Retention settings for the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// How long jobs and results are kept, in hours
    pub retention_hours: u64,
    /// How often the reaper runs, in seconds
    pub reap_interval_secs: u64,
}

impl StorageConfig {
    /// Retention window as a duration.
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 60 * 60)
    }

    /// Reaper tick interval as a duration.
    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retention_hours: 168,       // 7 days
            reap_interval_secs: 21_600, // 6 hours
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Output format: `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,sonar=debug".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.scanner.nmap_path, "nmap");
        assert_eq!(config.scanner.max_concurrent_scans, 5);
        assert_eq!(config.storage.retention(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.storage.reap_interval(), Duration::from_secs(6 * 3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scanner]
max_concurrent_scans = 2

[storage]
retention_hours = 24
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scanner.max_concurrent_scans, 2);
        assert_eq!(config.storage.retention_hours, 24);
        // These should be defaults
        assert_eq!(config.scanner.default_ports, "1-1000");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_explicit_path() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[server]\nport = 9090\n").expect("write config file");

        let config = AppConfig::load(Some(&config_path)).expect("load config");
        assert_eq!(config.server.port, 9090);

        let missing = AppConfig::load(Some(&temp_dir.path().join("missing.toml")))
            .expect("missing file falls back to defaults");
        assert_eq!(missing.server.port, 8081);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[server\nport = ").expect("write config file");

        let err = AppConfig::load(Some(&config_path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SONAR_NMAP_PATH", "/usr/local/bin/nmap"),
            ("SONAR_MAX_CONCURRENT_SCANS", "12"),
            ("SONAR_PORT", "not-a-port"),
            ("SONAR_LOG_FORMAT", "json"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.scanner.nmap_path, "/usr/local/bin/nmap");
        assert_eq!(config.scanner.max_concurrent_scans, 12);
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = AppConfig::default();
        config.scanner.max_concurrent_scans = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "scanner.max_concurrent_scans"));
    }

    #[test]
    fn test_scan_defaults_follow_config() {
        let config = ScannerConfig {
            default_timeout_secs: 60,
            default_ports: "22,80".to_string(),
            ..ScannerConfig::default()
        };

        let defaults = config.scan_defaults();
        assert_eq!(defaults.timeout, Duration::from_secs(60));
        assert_eq!(defaults.ports, "22,80");
        assert_eq!(defaults.timing_template, 3);
    }
}
