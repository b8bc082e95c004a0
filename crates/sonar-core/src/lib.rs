//! Sonar Core - Foundation crate for the Sonar scan service.
//!
//! This crate provides the domain model, error taxonomy, execution context
//! and configuration that the store, executor, orchestrator and server
//! crates all depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error taxonomy using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`job`] - Scan jobs, their parameters and the lifecycle state machine
//! - [`result`] - Normalized scan results (hosts, ports, scripts) and summaries
//! - [`context`] - Deadline-bounded, cancellable execution context
//!
//! # Example
//!
//! ```rust
//! use sonar_core::{Job, JobParameters, JobStatus, ScanDefaults};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = JobParameters::new("10.0.0.5").normalized(&ScanDefaults::default())?;
//! let job = Job::new("alice", params);
//! assert_eq!(job.status, JobStatus::Pending);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod context;
pub mod error;
pub mod job;
pub mod result;

// Re-export commonly used types
pub use config::{AppConfig, LoggingConfig, ScannerConfig, ServerConfig, StorageConfig};
pub use context::ExecutionContext;
pub use error::{ConfigError, ConfigResult, ErrorKind, Result, ScanError};
pub use job::{Job, JobParameters, JobStatus, ScanDefaults, ScanType};
pub use result::{Host, HostMetadata, JobSummary, Port, ScanResult, Script};
