//! Shared state handed to every route.

use sonar_orchestrator::ScanOrchestrator;

/// Application state cloned into each request.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The only entry point into the scan core
    pub orchestrator: ScanOrchestrator,
}

impl AppState {
    /// Wrap an orchestrator.
    #[must_use]
    pub fn new(orchestrator: ScanOrchestrator) -> Self {
        Self { orchestrator }
    }
}
