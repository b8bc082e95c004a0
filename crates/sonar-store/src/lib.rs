//! Sonar Store - Persistence for scan jobs and results.
//!
//! The [`JobStore`] trait is the only persistence capability the orchestrator
//! sees. [`MemoryJobStore`] keeps everything in process memory and hands out
//! independent copies; the [`Reaper`] bounds its memory growth by evicting
//! records older than the retention window.
//!
//! # Example
//!
//! ```rust,ignore
//! use sonar_store::{MemoryJobStore, Reaper};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryJobStore::new());
//! let reaper = Reaper::new(store.clone(), retention).with_interval(interval);
//! let handle = reaper.spawn(shutdown.clone());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod memory;
pub mod reaper;
pub mod store;

// Re-export commonly used types
pub use memory::{MemoryJobStore, PurgeStats};
pub use reaper::Reaper;
pub use store::JobStore;
