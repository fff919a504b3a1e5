//! API route definitions and router builder.

pub mod health;
pub mod ingest;
pub mod search;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body (raw uploads and batch JSON).
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/logs/upload", post(ingest::upload))
        .route("/logs/batch-upload", post(ingest::batch_upload))
        .route("/logs/search", get(search::search));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const STRUCTURED: &str =
        r#"{"timestamp":"2023-10-10T10:00:00Z","level":"ERROR","message":"disk full","service":"storage"}"#;
    const WEB: &str =
        r#"192.168.1.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 1024"#;
    const BRACKETED: &str = "[2023-10-10T10:00:00Z] [warn] billing - retrying charge";

    fn app() -> Router {
        build_router(AppState::new())
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn upload(body: impl Into<Body>) -> Request<Body> {
        Request::post("/api/v1/logs/upload")
            .header("content-type", "text/plain")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn health_check() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn upload_mixed_file() {
        let content = format!("{STRUCTURED}\n{WEB}\n{BRACKETED}\ngarbage line\n");
        let response = app().oneshot(upload(content)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Logs processed successfully");
        let counts = &json["categorizedResults"];
        assert_eq!(counts["structured"], 1);
        assert_eq!(counts["webAccess"], 1);
        assert_eq!(counts["bracketedApplication"], 1);
        assert_eq!(counts["unknown"], 1);
        assert_eq!(json["details"]["webAccess"]["persisted"], 1);
    }

    #[tokio::test]
    async fn upload_empty_file_is_rejected() {
        let response = app().oneshot(upload("  \n\n")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "uploaded file is empty or invalid");
    }

    #[tokio::test]
    async fn batch_upload_reports_per_file() {
        let body = serde_json::json!({
            "files": [
                { "name": "app.log", "content": format!("{BRACKETED}\n{BRACKETED}") },
                { "name": "access.log", "content": WEB },
            ]
        });
        let response = app()
            .oneshot(
                Request::post("/api/v1/logs/batch-upload")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json(response).await;
        assert_eq!(json["message"], "Batch logs processed successfully");
        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["fileName"], "app.log");
        assert_eq!(files[0]["categorizedResults"]["bracketedApplication"], 2);
        assert_eq!(files[1]["fileName"], "access.log");
        assert_eq!(files[1]["categorizedResults"]["webAccess"], 1);
    }

    #[tokio::test]
    async fn batch_upload_without_files() {
        let response = app()
            .oneshot(
                Request::post("/api/v1/logs/batch-upload")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"files":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "no files were uploaded");
    }

    #[tokio::test]
    async fn search_after_upload() {
        let app = app();
        let content = format!("{STRUCTURED}\n{WEB}\n{BRACKETED}");
        let response = app.clone().oneshot(upload(content)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/api/v1/logs/search?level=ERROR&limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json(response).await;
        let logs = json["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["source"], "storage");
        assert_eq!(json["pagination"]["totalItems"], 1);
        assert_eq!(json["pagination"]["itemsPerPage"], 10);
        assert_eq!(json["pagination"]["lastId"], logs[0]["id"]);
        assert_eq!(json["sort"]["field"], "timestamp");
        assert_eq!(json["sort"]["order"], "desc");
    }

    #[tokio::test]
    async fn search_with_bad_time_bound() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/logs/search?startTime=yesterday")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("startTime"));
    }
}
