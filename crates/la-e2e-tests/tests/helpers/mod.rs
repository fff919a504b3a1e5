//! Shared test harness for E2E integration tests.
//!
//! Drives the real router and ingestion pipeline over a `MockLogStore`,
//! so every request crosses the api, ingest and protocol crates.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use la_api::routes::build_router;
use la_api::state::AppState;
use la_ingest::{IngestConfig, MockLogStore, QueryConfig};

pub const STRUCTURED: &str = r#"{"timestamp":"2023-10-10T10:00:00Z","level":"ERROR","message":"disk full on /var","service":"storage"}"#;
pub const WEB_OK: &str =
    r#"192.168.1.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 1024"#;
pub const WEB_ERROR: &str =
    r#"10.0.0.7 - - [10/Oct/2023:14:01:02 +0000] "POST /api/login HTTP/1.1" 503 88"#;
pub const BRACKETED: &str = "[2023-10-10 11:30:00.250] [warn] billing - retrying charge";

/// End-to-end harness: in-memory store + router.
pub struct TestHarness {
    /// The store behind the router, for direct assertions.
    pub store: Arc<MockLogStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestHarness {
    /// Default tuning over an empty store.
    pub fn new() -> Self {
        Self::with_store(MockLogStore::new(), IngestConfig::default())
    }

    /// Custom store (failure injection, text index) and ingestion tuning.
    pub fn with_store(store: MockLogStore, ingest: IngestConfig) -> Self {
        let store = Arc::new(store);
        let state = AppState::with_store(store.clone(), ingest, QueryConfig::default());
        let router = build_router(state.clone());
        Self {
            store,
            state,
            router,
        }
    }

    /// POST a raw upload. Returns (HTTP status code, response JSON body).
    pub async fn upload(&self, content: impl Into<Body>) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::post("/api/v1/logs/upload")
                .header("content-type", "text/plain")
                .body(content.into())
                .unwrap(),
        )
        .await
    }

    /// POST a batch upload of `(name, content)` pairs.
    pub async fn batch_upload(&self, files: &[(&str, &str)]) -> (StatusCode, serde_json::Value) {
        let files: Vec<serde_json::Value> = files
            .iter()
            .map(|(name, content)| serde_json::json!({ "name": name, "content": content }))
            .collect();
        let body = serde_json::json!({ "files": files });
        self.send(
            Request::post("/api/v1/logs/batch-upload")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
    }

    /// GET the search endpoint with a raw query string (no leading `?`).
    pub async fn search(&self, query: &str) -> (StatusCode, serde_json::Value) {
        let uri = if query.is_empty() {
            "/api/v1/logs/search".to_string()
        } else {
            format!("/api/v1/logs/search?{query}")
        };
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}
