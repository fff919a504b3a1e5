//! Ingestion pipeline: stream → classify → process → bounded bulk persistence.
//!
//! Lines are read from the upload, buffered into classification batches and
//! split into per-family buckets. Each recognized family is then processed
//! on its own: lines go through the family's `Processor` in blocking-pool
//! chunks, records accumulate into persistence batches, and at most
//! `max_concurrent_batches` bulk inserts run at once. A write that cannot get
//! a permit waits for the next outstanding write to finish.

use la_protocol::{
    FamilyReport, FileReport, IngestFailure, IngestReport, LogFamily, LogRecord, StoredLog,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::classify::ClassificationBuckets;
use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult, StoreResult};
use crate::processors::Processor;
use crate::store::{BulkInsertOutcome, LogStore};

/// One file of a multi-file upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Accumulated outcome of one family's processing pass.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub family: LogFamily,
    /// Records the store accepted.
    pub success: Vec<StoredLog>,
    /// Line-level parse failures and batch-level persistence failures.
    pub errors: Vec<IngestFailure>,
    /// Lines that parsed into a record.
    pub total_processed: usize,
}

impl ProcessingResult {
    pub fn new(family: LogFamily) -> Self {
        Self {
            family,
            success: Vec::new(),
            errors: Vec::new(),
            total_processed: 0,
        }
    }

    /// Lines and records that did not reach the store.
    pub fn failed_count(&self) -> usize {
        self.errors.iter().map(|e| e.count).sum()
    }

    pub fn report(&self) -> FamilyReport {
        FamilyReport {
            persisted: self.success.len(),
            failed: self.failed_count(),
            errors: self.errors.clone(),
        }
    }

    fn absorb(&mut self, joined: Result<(usize, StoreResult<BulkInsertOutcome>), JoinError>) {
        match joined {
            Ok((_, Ok(outcome))) => {
                if outcome.is_partial() {
                    let rejected = outcome.failures.len();
                    let submitted = rejected + outcome.inserted_count();
                    tracing::warn!(
                        family = %self.family,
                        rejected,
                        submitted,
                        "partial batch insertion failure"
                    );
                    self.errors.push(IngestFailure::batch(
                        format!(
                            "Partial batch insertion failure: {rejected} of {submitted} records rejected"
                        ),
                        rejected,
                        outcome
                            .failures
                            .iter()
                            .map(|f| format!("record {}: {}", f.index, f.reason))
                            .collect(),
                    ));
                }
                self.success.extend(outcome.inserted);
            }
            Ok((submitted, Err(e))) => {
                tracing::warn!(
                    family = %self.family,
                    submitted,
                    error = %e,
                    "batch insertion failed"
                );
                self.errors.push(IngestFailure::batch(
                    format!("Batch insertion failed: {e}"),
                    submitted,
                    Vec::new(),
                ));
            }
            // The batch size is lost with the task; the entry still marks the failure.
            Err(e) => {
                tracing::error!(family = %self.family, error = %e, "batch insertion task aborted");
                self.errors.push(IngestFailure::batch(
                    format!("Batch insertion task aborted: {e}"),
                    0,
                    Vec::new(),
                ));
            }
        }
    }
}

/// Ingestion entry point shared by all requests. Cheap to clone; holds no
/// per-request state.
#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<dyn LogStore>,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn LogStore>, config: IngestConfig) -> Self {
        Self {
            store,
            config: config.normalized(),
        }
    }

    /// Ingest one uploaded file.
    pub async fn ingest_upload(&self, content: &[u8]) -> IngestResult<IngestReport> {
        validate_upload(content)?;
        let buckets = self.classify_stream(content).await?;
        self.ingest_buckets(buckets).await
    }

    /// Ingest several files independently and concurrently. Every file is
    /// validated before any is processed; reports follow input order.
    pub async fn ingest_files(&self, files: Vec<UploadedFile>) -> IngestResult<Vec<FileReport>> {
        if files.is_empty() {
            return Err(IngestError::EmptyInput);
        }
        for file in &files {
            validate_upload(&file.content).map_err(|e| match e {
                IngestError::MalformedUpload(reason) => {
                    IngestError::MalformedUpload(format!("{}: {reason}", file.name))
                }
                other => other,
            })?;
        }

        let mut tasks = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let pipeline = self.clone();
            tasks.spawn(async move {
                let report = pipeline.ingest_upload(&file.content).await;
                (index, file.name, report)
            });
        }

        let mut reports = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, file_name, report) =
                joined.map_err(|e| IngestError::Io(format!("file ingestion task failed: {e}")))?;
            reports.push((index, FileReport {
                file_name,
                report: report?,
            }));
        }
        reports.sort_by_key(|(index, _)| *index);
        Ok(reports.into_iter().map(|(_, report)| report).collect())
    }

    /// Read lines from `reader`, skipping blank ones, and classify them in
    /// batches of `classify_batch_size`.
    pub async fn classify_stream<R>(&self, reader: R) -> IngestResult<ClassificationBuckets>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut buckets = ClassificationBuckets::new();
        let mut batch = Vec::new();

        while let Some(line) = lines.next_line().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => IngestError::MalformedUpload(e.to_string()),
            _ => IngestError::Io(e.to_string()),
        })? {
            if line.trim().is_empty() {
                continue;
            }
            batch.push(line);
            if batch.len() >= self.config.classify_batch_size {
                buckets.classify_batch(std::mem::take(&mut batch));
            }
        }
        if !batch.is_empty() {
            buckets.classify_batch(batch);
        }

        if buckets.total() == 0 {
            return Err(IngestError::EmptyInput);
        }
        tracing::debug!(
            structured = buckets.structured.len(),
            web_access = buckets.web_access.len(),
            bracketed_application = buckets.bracketed_application.len(),
            unknown = buckets.unknown.len(),
            "classified upload"
        );
        Ok(buckets)
    }

    /// Process the three recognized buckets concurrently.
    pub async fn ingest_buckets(
        &self,
        mut buckets: ClassificationBuckets,
    ) -> IngestResult<IngestReport> {
        let structured = buckets.take(LogFamily::Structured);
        let web_access = buckets.take(LogFamily::WebAccess);
        let bracketed = buckets.take(LogFamily::BracketedApplication);

        let (structured, web_access, bracketed) = tokio::join!(
            self.process_family(LogFamily::Structured, structured),
            self.process_family(LogFamily::WebAccess, web_access),
            self.process_family(LogFamily::BracketedApplication, bracketed),
        );

        let report = IngestReport {
            structured: structured?.report(),
            web_access: web_access?.report(),
            bracketed_application: bracketed?.report(),
            unknown: buckets.unknown.len(),
        };
        let counts = report.categorized();
        tracing::info!(
            structured = counts.structured,
            web_access = counts.web_access,
            bracketed_application = counts.bracketed_application,
            unknown = counts.unknown,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Run one family's lines through its processor and persist the records.
    pub async fn process_family(
        &self,
        family: LogFamily,
        lines: Vec<String>,
    ) -> IngestResult<ProcessingResult> {
        let processor =
            Processor::for_family(family).ok_or(IngestError::UnsupportedFormat(family))?;
        let mut result = ProcessingResult::new(family);
        if lines.is_empty() {
            return Ok(result);
        }

        let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_batches));
        let mut in_flight = JoinSet::new();
        let mut pending: Vec<LogRecord> = Vec::new();
        let mut lines = lines.into_iter();

        loop {
            let chunk: Vec<String> = lines.by_ref().take(self.config.stream_buffer).collect();
            if chunk.is_empty() {
                break;
            }
            let parsed = tokio::task::spawn_blocking(move || {
                chunk
                    .into_iter()
                    .map(|line| {
                        let outcome = processor.process(&line);
                        (line, outcome)
                    })
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(|e| IngestError::Io(format!("{family} processor task failed: {e}")))?;

            for (line, outcome) in parsed {
                match outcome {
                    Ok(record) => {
                        result.total_processed += 1;
                        pending.push(record);
                    }
                    Err(e) => result.errors.push(IngestFailure::line(line, e.to_string())),
                }
            }

            while pending.len() >= self.config.persist_batch_size {
                let batch: Vec<LogRecord> =
                    pending.drain(..self.config.persist_batch_size).collect();
                self.dispatch(&limiter, &mut in_flight, batch, &mut result)
                    .await;
            }
        }
        if !pending.is_empty() {
            self.dispatch(&limiter, &mut in_flight, pending, &mut result)
                .await;
        }

        while let Some(joined) = in_flight.join_next().await {
            result.absorb(joined);
        }
        tracing::debug!(
            family = %family,
            processed = result.total_processed,
            persisted = result.success.len(),
            failed = result.failed_count(),
            "family pass complete"
        );
        Ok(result)
    }

    /// Start a bulk insert once a limiter slot is free. The permit travels
    /// with the write and is released when it resolves, success or failure.
    async fn dispatch(
        &self,
        limiter: &Arc<Semaphore>,
        in_flight: &mut JoinSet<(usize, StoreResult<BulkInsertOutcome>)>,
        batch: Vec<LogRecord>,
        result: &mut ProcessingResult,
    ) {
        let submitted = batch.len();
        let Ok(permit) = Arc::clone(limiter).acquire_owned().await else {
            result.errors.push(IngestFailure::batch(
                "Batch insertion failed: concurrency limiter closed",
                submitted,
                Vec::new(),
            ));
            return;
        };

        let store = Arc::clone(&self.store);
        tracing::debug!(family = %result.family, records = submitted, "dispatching bulk insert");
        in_flight.spawn(async move {
            let _permit = permit;
            (submitted, store.bulk_insert(batch).await)
        });

        while let Some(joined) = in_flight.try_join_next() {
            result.absorb(joined);
        }
    }
}

/// Reject blank or non-UTF-8 uploads before any classification work.
fn validate_upload(content: &[u8]) -> IngestResult<()> {
    if content.trim_ascii().is_empty() {
        return Err(IngestError::EmptyInput);
    }
    std::str::from_utf8(content)
        .map(|_| ())
        .map_err(|e| IngestError::MalformedUpload(e.to_string()))
}
