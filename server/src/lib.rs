//! Sonar Server - HTTP shell around the scan core.
//!
//! This is the thin application shell that loads configuration, wires the
//! executor, store and orchestrator together and serves the HTTP API. Core
//! business logic lives in the `crates/` directory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::router;
pub use state::AppState;

use anyhow::Context;
use sonar_core::AppConfig;
use sonar_executor::NmapExecutor;
use sonar_orchestrator::ScanOrchestrator;
use sonar_store::{MemoryJobStore, Reaper};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Build the orchestrator and reaper described by `config`, all tied to
/// `shutdown`.
pub fn build(config: &AppConfig, shutdown: &CancellationToken) -> (ScanOrchestrator, Reaper) {
    let store = Arc::new(MemoryJobStore::new());
    let executor = Arc::new(NmapExecutor::new(config.scanner.nmap_path.clone()));

    let orchestrator = ScanOrchestrator::new(executor, store.clone())
        .with_max_concurrent_scans(config.scanner.max_concurrent_scans)
        .with_defaults(config.scanner.scan_defaults())
        .with_shutdown_token(shutdown.child_token());

    let reaper =
        Reaper::new(store, config.storage.retention()).with_interval(config.storage.reap_interval());

    (orchestrator, reaper)
}

/// Run the service until Ctrl-C.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting Sonar v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let (orchestrator, reaper) = build(&config, &shutdown);

    match orchestrator.tool_version().await {
        Ok(version) => info!(nmap_path = %config.scanner.nmap_path, version = %version, "scanner available"),
        Err(e) => warn!(nmap_path = %config.scanner.nmap_path, error = %e, "scanner not available; scans will fail"),
    }

    let reaper_handle = reaper.spawn(shutdown.child_token());

    let app = router(
        AppState::new(orchestrator.clone()),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "listening");

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutdown requested");
            signal_token.cancel();
        })
        .await
        .context("server error")?;

    orchestrator.shutdown();
    shutdown.cancel();
    if let Err(e) = reaper_handle.await {
        warn!(error = %e, "reaper task failed");
    }

    info!("Sonar stopped");
    Ok(())
}
