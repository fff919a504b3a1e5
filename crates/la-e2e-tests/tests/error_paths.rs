//! E2E tests for error paths and partial failures across crate boundaries.

mod helpers;

use axum::http::StatusCode;
use la_ingest::{IngestConfig, MockLogStore};

use helpers::{BRACKETED, STRUCTURED, TestHarness};

/// A whitespace-only upload is rejected with the uniform error body.
#[tokio::test]
async fn e2e_empty_upload_rejected() {
    let h = TestHarness::new();
    let (status, json) = h.upload("\n \n\t\n").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["status"], 400);
    assert_eq!(json["error"], "uploaded file is empty or invalid");
    assert_eq!(h.store.bulk_insert_calls(), 0);
}

/// Bytes that are not UTF-8 are rejected before classification.
#[tokio::test]
async fn e2e_non_utf8_upload_rejected() {
    let h = TestHarness::new();
    let (status, json) = h.upload(vec![0x5b, 0xff, 0xfe, 0x5d, 0x0a]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("malformed"));
}

/// A store that fails every write still yields a successful response that
/// accounts for every record.
#[tokio::test]
async fn e2e_store_outage_reported_per_family() {
    let h = TestHarness::with_store(
        MockLogStore::new().fail_all_batches("connection reset"),
        IngestConfig::default(),
    );
    let content = format!("{BRACKETED}\n{BRACKETED}\n{STRUCTURED}");

    let (status, json) = h.upload(content).await;
    assert_eq!(status, StatusCode::OK);

    let app = &json["details"]["bracketedApplication"];
    assert_eq!(app["persisted"], 0);
    assert_eq!(app["failed"], 2);
    let reason = app["errors"][0]["reason"].as_str().unwrap();
    assert!(reason.starts_with("Batch insertion failed"));
    assert!(reason.contains("connection reset"));

    assert_eq!(json["details"]["structured"]["failed"], 1);
    assert!(h.store.is_empty().await);
}

/// Rejected records are reported while the rest of the batch is kept.
#[tokio::test]
async fn e2e_partial_batch_failure() {
    let h = TestHarness::with_store(
        MockLogStore::new().reject_when(|r| {
            (r.source == "flaky").then(|| "duplicate key value".to_string())
        }),
        IngestConfig::default(),
    );
    let content = [
        "[2023-10-10T10:00:01Z] [info] steady - one",
        "[2023-10-10T10:00:02Z] [info] flaky - two",
        "[2023-10-10T10:00:03Z] [info] steady - three",
    ]
    .join("\n");

    let (status, json) = h.upload(content).await;
    assert_eq!(status, StatusCode::OK);

    let app = &json["details"]["bracketedApplication"];
    assert_eq!(app["persisted"], 2);
    assert_eq!(app["failed"], 1);
    let error = &app["errors"][0];
    assert_eq!(
        error["reason"],
        "Partial batch insertion failure: 1 of 3 records rejected"
    );
    assert_eq!(error["count"], 1);
    assert!(
        error["details"][0]
            .as_str()
            .unwrap()
            .contains("duplicate key value")
    );
    assert_eq!(h.store.len().await, 2);
}

/// A failed batch does not take its siblings down.
#[tokio::test]
async fn e2e_failed_batch_spares_siblings() {
    let ingest = IngestConfig {
        persist_batch_size: 2,
        max_concurrent_batches: 1,
        ..IngestConfig::default()
    };
    let h = TestHarness::with_store(MockLogStore::new().fail_call(1), ingest);
    let content: Vec<String> = (0..6)
        .map(|i| format!("[2023-10-10T10:00:0{i}Z] [info] svc - line {i}"))
        .collect();

    let (status, json) = h.upload(content.join("\n")).await;
    assert_eq!(status, StatusCode::OK);

    let app = &json["details"]["bracketedApplication"];
    assert_eq!(app["persisted"], 4);
    assert_eq!(app["failed"], 2);
    assert_eq!(h.store.bulk_insert_calls(), 3);
}

/// An unparseable time bound is a client error with the uniform body.
#[tokio::test]
async fn e2e_invalid_time_bound() {
    let h = TestHarness::new();
    let (status, json) = h.search("endTime=after-lunch").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("after-lunch"));
}
