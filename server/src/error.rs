//! Error responses for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sonar_core::{ErrorKind, ScanError};

/// Serializable error returned by every API route.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable error code for client handling (e.g., "NOT_FOUND")
    pub code: String,
    /// Human-readable message
    pub message: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    /// Create an error with an explicit status.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Request rejected before reaching the orchestrator.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidInput.code(),
            message,
        )
    }

    /// HTTP status this error renders with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let kind = err.kind();
        let status = StatusCode::from_u16(kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, kind.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
