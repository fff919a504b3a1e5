//! Log upload endpoints.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use la_ingest::UploadedFile;
use la_protocol::{FileReport, IngestReport};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// One file of a batch upload.
#[derive(Debug, Deserialize)]
pub struct UploadFile {
    pub name: String,
    pub content: String,
}

/// Request body for a batch upload.
#[derive(Debug, Deserialize)]
pub struct BatchUploadRequest {
    #[serde(default)]
    pub files: Vec<UploadFile>,
}

/// POST /api/v1/logs/upload: ingest a raw log file.
pub async fn upload(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let report = state.pipeline.ingest_upload(&body).await?;
    log_report("upload", &report);

    Ok(Json(json!({
        "success": true,
        "message": "Logs processed successfully",
        "categorizedResults": report.categorized(),
        "details": report,
    })))
}

/// POST /api/v1/logs/batch-upload: ingest several files independently.
pub async fn batch_upload(
    State(state): State<AppState>,
    Json(req): Json<BatchUploadRequest>,
) -> ApiResult<Json<Value>> {
    if req.files.is_empty() {
        return Err(ApiError::BadRequest("no files were uploaded".into()));
    }

    let files = req
        .files
        .into_iter()
        .map(|f| UploadedFile {
            name: f.name,
            content: f.content.into_bytes(),
        })
        .collect();
    let reports = state.pipeline.ingest_files(files).await?;

    let files: Vec<Value> = reports
        .iter()
        .map(|FileReport { file_name, report }| {
            log_report(file_name, report);
            json!({
                "fileName": file_name,
                "categorizedResults": report.categorized(),
                "details": report,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "message": "Batch logs processed successfully",
        "files": files,
    })))
}

fn log_report(name: &str, report: &IngestReport) {
    let counts = report.categorized();
    tracing::info!(
        file = name,
        structured = counts.structured,
        web_access = counts.web_access,
        bracketed_application = counts.bracketed_application,
        unknown = counts.unknown,
        failed = report.structured.failed
            + report.web_access.failed
            + report.bracketed_application.failed,
        "logs ingested"
    );
}
