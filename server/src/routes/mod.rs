//! HTTP routes.

pub mod health;
#[allow(missing_docs)]
pub mod scans;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the API router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/scans", get(scans::list_scans).post(scans::start_scan))
        .route(
            "/scans/{id}",
            get(scans::get_scan).delete(scans::cancel_scan),
        )
        .route("/scans/{id}/summary", get(scans::get_summary))
        .route("/results/{id}", get(scans::get_result));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
