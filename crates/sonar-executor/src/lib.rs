//! Sonar Executor - External scan invocation.
//!
//! This crate turns validated [`JobParameters`](sonar_core::JobParameters)
//! into one run of the external scanning tool and normalizes its XML report
//! into a [`ScanResult`](sonar_core::ScanResult).
//!
//! The orchestrator only sees the [`ScanExecutor`] trait. [`NmapExecutor`] is
//! the production implementation; tests substitute their own doubles.
//!
//! # Example
//!
//! ```rust,ignore
//! use sonar_core::ExecutionContext;
//! use sonar_executor::{NmapExecutor, ScanExecutor};
//!
//! let executor = NmapExecutor::new("nmap");
//! let ctx = ExecutionContext::with_timeout(params.timeout);
//! let result = executor.execute_scan(&ctx, &params).await?;
//! println!("{} hosts up", result.up_hosts);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod args;
pub mod executor;
pub mod mapping;
pub mod nmap;
#[allow(missing_docs)]
pub mod report;

// Re-export commonly used types
pub use args::{build_args, command_line};
pub use executor::ScanExecutor;
pub use mapping::map_report;
pub use nmap::NmapExecutor;
pub use report::{parse_report, NmapRun};
