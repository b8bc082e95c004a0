//! Sonar Orchestrator - Scan job lifecycle management.
//!
//! [`ScanOrchestrator`] is the only interface the transport layer uses. It
//! validates requests, enforces the concurrency budget, drives each job
//! through its state machine on a dedicated task, and coordinates the
//! [`ScanExecutor`](sonar_executor::ScanExecutor) and
//! [`JobStore`](sonar_store::JobStore) it was built with.
//!
//! # Example
//!
//! ```rust,ignore
//! use sonar_executor::NmapExecutor;
//! use sonar_orchestrator::ScanOrchestrator;
//! use sonar_store::MemoryJobStore;
//! use std::sync::Arc;
//!
//! let orchestrator = ScanOrchestrator::new(
//!     Arc::new(NmapExecutor::new("nmap")),
//!     Arc::new(MemoryJobStore::new()),
//! )
//! .with_max_concurrent_scans(5);
//!
//! let job = orchestrator.start_scan("alice", params).await?;
//! let job = orchestrator.get_job(&job.id).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod health;
pub mod orchestrator;

// Re-export commonly used types
pub use health::HealthStatus;
pub use orchestrator::{ScanOrchestrator, DEFAULT_MAX_CONCURRENT_SCANS};
