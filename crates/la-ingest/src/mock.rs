//! In-memory log store for tests and development.
//!
//! Supports failure injection (per-record rejection, whole-batch failure),
//! artificial write latency, and tracks how many bulk inserts ran at once.

use async_trait::async_trait;
use la_protocol::{LogRecord, StoredLog};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{
    BulkInsertOutcome, KeywordMatch, LogFilter, LogStore, RecordFailure, SortField, SortKey,
    SortOrder,
};

type RejectFn = Box<dyn Fn(&LogRecord) -> Option<String> + Send + Sync>;

/// A log store backed by a `Vec`, with knobs for simulating failures.
pub struct MockLogStore {
    logs: RwLock<Vec<StoredLog>>,
    text_index: bool,
    reject: Option<RejectFn>,
    failing_calls: HashSet<usize>,
    fail_all: Option<String>,
    write_latency: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockLogStore {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
            text_index: false,
            reject: None,
            failing_calls: HashSet::new(),
            fail_all: None,
            write_latency: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Report a full-text index on `message`.
    pub fn with_text_index(mut self) -> Self {
        self.text_index = true;
        self
    }

    /// Reject individual records: the closure returns the rejection reason.
    pub fn reject_when<F>(mut self, f: F) -> Self
    where
        F: Fn(&LogRecord) -> Option<String> + Send + Sync + 'static,
    {
        self.reject = Some(Box::new(f));
        self
    }

    /// Fail the `n`th bulk insert call (0-based) as a whole.
    pub fn fail_call(mut self, n: usize) -> Self {
        self.failing_calls.insert(n);
        self
    }

    /// Fail every bulk insert as a whole with `reason`.
    pub fn fail_all_batches(mut self, reason: impl Into<String>) -> Self {
        self.fail_all = Some(reason.into());
        self
    }

    /// Sleep this long inside every bulk insert.
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Insert records directly, bypassing failure injection.
    pub async fn seed(&self, records: Vec<LogRecord>) -> Vec<StoredLog> {
        let stored: Vec<StoredLog> = records.into_iter().map(StoredLog::new).collect();
        self.logs.write().await.extend(stored.iter().cloned());
        stored
    }

    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<StoredLog> {
        self.logs.read().await.clone()
    }

    /// Number of `bulk_insert` calls so far.
    pub fn bulk_insert_calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Highest number of `bulk_insert` calls observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(AtomicOrdering::SeqCst)
    }

    async fn write(&self, call: usize, records: Vec<LogRecord>) -> StoreResult<BulkInsertOutcome> {
        if let Some(latency) = self.write_latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(reason) = &self.fail_all {
            return Err(StoreError::Backend(reason.clone()));
        }
        if self.failing_calls.contains(&call) {
            return Err(StoreError::Backend(format!("bulk insert #{call} failed")));
        }

        let mut outcome = BulkInsertOutcome::default();
        for (index, record) in records.into_iter().enumerate() {
            match self.reject.as_ref().and_then(|f| f(&record)) {
                Some(reason) => outcome.failures.push(RecordFailure { index, reason }),
                None => outcome.inserted.push(StoredLog::new(record)),
            }
        }
        self.logs
            .write()
            .await
            .extend(outcome.inserted.iter().cloned());
        Ok(outcome)
    }
}

impl Default for MockLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for MockLogStore {
    async fn bulk_insert(&self, records: Vec<LogRecord>) -> StoreResult<BulkInsertOutcome> {
        let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let now = self.in_flight.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, AtomicOrdering::SeqCst);

        let result = self.write(call, records).await;

        self.in_flight.fetch_sub(1, AtomicOrdering::SeqCst);
        result
    }

    async fn has_text_capability(&self, field: &str) -> StoreResult<bool> {
        Ok(self.text_index && field == "message")
    }

    async fn query(
        &self,
        filter: &LogFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<StoredLog>> {
        let logs = self.logs.read().await;
        let mut matched: Vec<&StoredLog> = logs.iter().filter(|l| matches(filter, l)).collect();
        matched.sort_by(|a, b| compare(a, b, sort));
        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &LogFilter) -> StoreResult<u64> {
        let logs = self.logs.read().await;
        Ok(logs.iter().filter(|l| matches(filter, l)).count() as u64)
    }
}

fn matches(filter: &LogFilter, log: &StoredLog) -> bool {
    let r = &log.record;
    if let Some(start) = filter.start
        && r.timestamp < start
    {
        return false;
    }
    if let Some(end) = filter.end
        && r.timestamp > end
    {
        return false;
    }
    if let Some(level) = &filter.level
        && &r.level != level
    {
        return false;
    }
    if let Some(source) = &filter.source
        && &r.source != source
    {
        return false;
    }
    match &filter.keyword {
        None => true,
        Some(KeywordMatch::FullText(terms)) => {
            let words: HashSet<String> = tokens(&r.message).collect();
            tokens(terms).any(|t| words.contains(&t))
        }
        Some(KeywordMatch::Substring(needle)) => {
            let needle = needle.to_lowercase();
            r.message.to_lowercase().contains(&needle) || r.source.to_lowercase().contains(&needle)
        }
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn compare(a: &StoredLog, b: &StoredLog, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ord = match key.field {
            SortField::Timestamp => a.record.timestamp.cmp(&b.record.timestamp),
            SortField::Level => a.record.level.cmp(&b.record.level),
            SortField::Source => a.record.source.cmp(&b.record.source),
            SortField::Id => a.id.cmp(&b.id),
        };
        let ord = match key.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
