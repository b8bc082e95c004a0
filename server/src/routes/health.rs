//! Liveness of the service and the scanner it drives.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::SecondsFormat;
use serde_json::json;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    let status = state.orchestrator.health().await;

    if status.available {
        let body = json!({
            "status": "healthy",
            "nmap_version": status.version.unwrap_or_default(),
            "timestamp": status.checked_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        (StatusCode::OK, Json(body)).into_response()
    } else {
        let body = json!({
            "status": "unhealthy",
            "error": format!(
                "Nmap is not available: {}",
                status.error.unwrap_or_default()
            ),
        });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}
