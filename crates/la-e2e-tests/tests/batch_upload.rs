//! E2E tests for multi-file batch upload.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use helpers::{BRACKETED, STRUCTURED, TestHarness, WEB_OK};

/// Each file is reported on its own, in request order.
#[tokio::test]
async fn e2e_files_reported_in_order() {
    let h = TestHarness::new();
    let app_log = format!("{BRACKETED}\n{BRACKETED}\n{BRACKETED}");
    let mixed = format!("{STRUCTURED}\n{WEB_OK}\nmystery");

    let (status, json) = h
        .batch_upload(&[
            ("app.log", app_log.as_str()),
            ("mixed.log", mixed.as_str()),
            ("access.log", WEB_OK),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let files = json["files"].as_array().unwrap();
    let names: Vec<&str> = files
        .iter()
        .map(|f| f["fileName"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["app.log", "mixed.log", "access.log"]);

    assert_eq!(files[0]["categorizedResults"]["bracketedApplication"], 3);
    assert_eq!(files[1]["categorizedResults"]["structured"], 1);
    assert_eq!(files[1]["categorizedResults"]["webAccess"], 1);
    assert_eq!(files[1]["categorizedResults"]["unknown"], 1);
    assert_eq!(files[2]["categorizedResults"]["webAccess"], 1);
    assert_eq!(h.store.len().await, 6);
}

/// One blank file rejects the whole request before anything is written.
#[tokio::test]
async fn e2e_blank_member_rejects_batch() {
    let h = TestHarness::new();
    let (status, json) = h
        .batch_upload(&[("good.log", BRACKETED), ("empty.log", "  \n")])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(h.store.is_empty().await);
}

/// An empty file list is a client error.
#[tokio::test]
async fn e2e_no_files() {
    let h = TestHarness::new();
    let (status, json) = h.batch_upload(&[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "no files were uploaded");
}

/// A body that is not JSON never reaches the pipeline.
#[tokio::test]
async fn e2e_malformed_batch_body() {
    let h = TestHarness::new();
    let response = h
        .router
        .clone()
        .oneshot(
            Request::post("/api/v1/logs/batch-upload")
                .header("content-type", "application/json")
                .body(Body::from("{ files: nope"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    let _ = response.into_body().collect().await.unwrap();
    assert_eq!(h.store.bulk_insert_calls(), 0);
}

/// A file of only unrecognized lines succeeds with nothing persisted.
#[tokio::test]
async fn e2e_unknown_only_file() {
    let h = TestHarness::new();
    let (status, json) = h
        .batch_upload(&[("noise.log", "alpha\nbeta\ngamma")])
        .await;

    assert_eq!(status, StatusCode::OK);
    let counts = &json["files"][0]["categorizedResults"];
    assert_eq!(counts["unknown"], 3);
    assert_eq!(counts["structured"], 0);
    assert_eq!(h.store.bulk_insert_calls(), 0);
}
