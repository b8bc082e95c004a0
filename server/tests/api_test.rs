use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use sonar_core::{ExecutionContext, Host, JobParameters, Port, ScanError, ScanResult};
use sonar_executor::ScanExecutor;
use sonar_orchestrator::ScanOrchestrator;
use sonar_server::{router, AppState};
use sonar_store::MemoryJobStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Executor double that finishes instantly with one open port.
struct InstantExecutor {
    available: bool,
}

#[async_trait]
impl ScanExecutor for InstantExecutor {
    async fn execute_scan(
        &self,
        _ctx: &ExecutionContext,
        params: &JobParameters,
    ) -> sonar_core::Result<ScanResult> {
        let now = Utc::now();
        Ok(ScanResult {
            id: format!("result-{}", now.timestamp_nanos_opt().unwrap_or_default()),
            scan_id: String::new(),
            user_id: String::new(),
            start_time: now,
            end_time: now,
            duration: 0.4,
            command: format!("nmap {}", params.target),
            summary: "1 IP address (1 host up) scanned in 0.40 seconds".to_string(),
            total_hosts: 1,
            up_hosts: 1,
            hosts: vec![Host {
                ip: params.target.clone(),
                status: "up".to_string(),
                ports: vec![Port {
                    port: 22,
                    protocol: "tcp".to_string(),
                    state: "open".to_string(),
                    service: "ssh".to_string(),
                    ..Port::default()
                }],
                ..Host::default()
            }],
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn version(&self) -> sonar_core::Result<String> {
        if self.available {
            Ok("Nmap version 7.94 ( https://nmap.org )".to_string())
        } else {
            Err(ScanError::Unavailable(
                "failed to get nmap version: No such file or directory".to_string(),
            ))
        }
    }
}

fn app_with(available: bool, max_concurrent_scans: usize) -> Router {
    let orchestrator = ScanOrchestrator::new(
        Arc::new(InstantExecutor { available }),
        Arc::new(MemoryJobStore::new()),
    )
    .with_max_concurrent_scans(max_concurrent_scans);
    router(AppState::new(orchestrator), Duration::from_secs(30))
}

fn app() -> Router {
    app_with(true, 5)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, method, uri, body, None).await
}

async fn send_as(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    user_id: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("X-User-Id", user_id);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("route request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn wait_until_finished(app: &Router, scan_id: &str) -> Value {
    for _ in 0..500 {
        let (status, job) = send(app, Method::GET, &format!("/api/v1/scans/{scan_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if matches!(job["status"].as_str(), Some("COMPLETED" | "FAILED" | "CANCELLED")) {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("scan {scan_id} never finished");
}

#[tokio::test]
async fn scan_lifecycle_over_http() {
    let app = app();

    let (status, body) = send_as(
        &app,
        Method::POST,
        "/api/v1/scans",
        Some(json!({
            "target": "10.0.0.5",
            "ports": "22,80",
            "scan_type": "CONNECT",
            "timeout": 5
        })),
        Some("alice"),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Scan started");
    assert_eq!(body["job"]["status"], "PENDING");
    assert_eq!(body["job"]["user_id"], "alice");
    let scan_id = body["scan_id"].as_str().expect("scan id").to_string();

    let job = wait_until_finished(&app, &scan_id).await;
    assert_eq!(job["status"], "COMPLETED");
    assert_eq!(job["progress"], 100);

    let result_id = job["result_id"].as_str().expect("result id");
    let (status, result) = send(&app, Method::GET, &format!("/api/v1/results/{result_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["scan_id"], scan_id.as_str());

    let (status, summary) = send(
        &app,
        Method::GET,
        &format!("/api/v1/scans/{scan_id}/summary"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["open_ports"], 1);
    assert_eq!(summary["has_results"], true);

    let (status, list) = send_as(&app, Method::GET, "/api/v1/scans?limit=5", None, Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
    assert_eq!(list["limit"], 5);
    assert_eq!(list["scans"][0]["id"], scan_id.as_str());

    let (status, list) = send(&app, Method::GET, "/api/v1/scans", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 0);

    let (status, err) = send(&app, Method::DELETE, &format!("/api/v1/scans/{scan_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "INVALID_STATE");
}

#[tokio::test]
async fn timeout_seconds_alias_is_accepted() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/scans",
        Some(json!({"target": "scanme.nmap.org", "timeout_seconds": 30})),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["job"]["options"]["timeout"], 30);
    assert_eq!(body["job"]["options"]["ports"], "1-1000");
    assert_eq!(body["job"]["user_id"], "default-user");
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let app = app();

    let (status, err) = send(&app, Method::POST, "/api/v1/scans", Some(json!({"target": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "INVALID_INPUT");

    let (status, err) = send(
        &app,
        Method::POST,
        "/api/v1/scans",
        Some(json!({"target": "10.0.0.5; cat /etc/shadow"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "INVALID_INPUT");

    let (status, err) = send(
        &app,
        Method::POST,
        "/api/v1/scans",
        Some(json!({"target": "10.0.0.5", "scan_type": "STEALTHY"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn exhausted_budget_is_service_unavailable() {
    let app = app_with(true, 0);
    let (status, err) = send(&app, Method::POST, "/api/v1/scans", Some(json!({"target": "10.0.0.5"}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();

    for uri in [
        "/api/v1/scans/missing",
        "/api/v1/scans/missing/summary",
        "/api/v1/results/missing",
    ] {
        let (status, err) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(err["code"], "NOT_FOUND");
    }

    let (status, _) = send(&app, Method::DELETE, "/api/v1/scans/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_scanner_state() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["nmap_version"], "Nmap version 7.94 ( https://nmap.org )");
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&app_with(false, 5), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"]
        .as_str()
        .is_some_and(|error| error.starts_with("Nmap is not available")));
}
