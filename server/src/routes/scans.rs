//! Scan and result routes.

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_parameters;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use sonar_core::{Job, JobParameters, JobSummary, ScanResult};
use tracing::info;

/// Header carrying the caller's identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Owner used when the request does not name one.
pub const DEFAULT_USER_ID: &str = "default-user";

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct StartScanResponse {
    pub message: String,
    pub scan_id: String,
    pub job: Job,
}

#[derive(Debug, Serialize)]
pub struct ListScansResponse {
    pub scans: Vec<Job>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelScanResponse {
    pub message: String,
    pub scan_id: String,
}

/// Raw pagination parameters. Unparsable values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListQuery {
    /// Limit in `1..=100`, 10 when absent, unparsable or below 1.
    fn limit(&self) -> usize {
        let limit = parse_i64(self.limit.as_deref()).unwrap_or(DEFAULT_LIMIT);
        let limit = if limit < 1 { DEFAULT_LIMIT } else { limit.min(MAX_LIMIT) };
        usize::try_from(limit).unwrap_or(10)
    }

    /// Offset, 0 when absent, unparsable or negative.
    fn offset(&self) -> usize {
        parse_i64(self.offset.as_deref())
            .and_then(|offset| usize::try_from(offset).ok())
            .unwrap_or(0)
    }
}

fn parse_i64(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Caller identity from the `X-User-Id` header.
fn user_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string()
}

/// `POST /api/v1/scans`
pub async fn start_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<JobParameters>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(params) =
        payload.map_err(|e| ApiError::invalid_input(format!("invalid request: {}", e.body_text())))?;
    validate_parameters(&params)?;

    let user_id = user_id(&headers);
    let job = state.orchestrator.start_scan(&user_id, params).await?;

    info!(job_id = %job.id, user_id = %user_id, "scan accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(StartScanResponse {
            message: "Scan started".to_string(),
            scan_id: job.id.clone(),
            job,
        }),
    ))
}

/// `GET /api/v1/scans`
pub async fn list_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListScansResponse>, ApiError> {
    let (limit, offset) = (query.limit(), query.offset());
    let scans = state
        .orchestrator
        .list_jobs(&user_id(&headers), limit, offset)
        .await?;

    Ok(Json(ListScansResponse {
        count: scans.len(),
        scans,
        limit,
        offset,
    }))
}

/// `GET /api/v1/scans/{id}`
pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(state.orchestrator.get_job(&id).await?))
}

/// `DELETE /api/v1/scans/{id}`
pub async fn cancel_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelScanResponse>, ApiError> {
    state.orchestrator.cancel_job(&id).await?;
    Ok(Json(CancelScanResponse {
        message: "Scan cancelled".to_string(),
        scan_id: id,
    }))
}

/// `GET /api/v1/scans/{id}/summary`
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSummary>, ApiError> {
    Ok(Json(state.orchestrator.summarize(&id).await?))
}

/// `GET /api/v1/results/{id}`
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScanResult>, ApiError> {
    Ok(Json(state.orchestrator.get_result(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn query(limit: Option<&str>, offset: Option<&str>) -> ListQuery {
        ListQuery {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
        }
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        assert_eq!(query(None, None).limit(), 10);
        assert_eq!(query(Some("0"), None).limit(), 10);
        assert_eq!(query(Some("-5"), None).limit(), 10);
        assert_eq!(query(Some("abc"), None).limit(), 10);
        assert_eq!(query(Some("25"), None).limit(), 25);
        assert_eq!(query(Some("1000"), None).limit(), 100);

        assert_eq!(query(None, Some("-3")).offset(), 0);
        assert_eq!(query(None, Some("7")).offset(), 7);
        assert_eq!(query(None, Some("x")).offset(), 0);
    }

    #[test]
    fn test_user_id_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), DEFAULT_USER_ID);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(user_id(&headers), DEFAULT_USER_ID);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(user_id(&headers), "alice");
    }
}
