//! Persistence boundary: the bulk-write and query capability the pipeline
//! and query engine consume.
//!
//! Implemented by `MockLogStore` (in-memory, tests and development) and by
//! the PostgreSQL adapter in `la-api`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use la_protocol::{LogRecord, StoredLog};

use crate::error::StoreResult;

/// A record the store refused during a bulk insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Position of the record in the submitted batch.
    pub index: usize,
    pub reason: String,
}

/// Result of an unordered bulk insert that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct BulkInsertOutcome {
    pub inserted: Vec<StoredLog>,
    pub failures: Vec<RecordFailure>,
}

impl BulkInsertOutcome {
    pub fn inserted_count(&self) -> usize {
        self.inserted.len()
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// How a keyword is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordMatch {
    /// Indexed full-text match on `message`.
    FullText(String),
    /// Case-insensitive substring match on `message` or `source`.
    Substring(String),
}

/// Filter over stored records. Every present condition must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Inclusive lower bound on `timestamp`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end: Option<DateTime<Utc>>,
    pub level: Option<String>,
    pub source: Option<String>,
    pub keyword: Option<KeywordMatch>,
}

/// Sortable columns. Only these ever reach a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Timestamp,
    Level,
    Source,
    Id,
}

impl SortField {
    /// Parse a caller-supplied name; `_id` is accepted for `id`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "timestamp" => Some(Self::Timestamp),
            "level" => Some(Self::Level),
            "source" => Some(Self::Source),
            "id" | "_id" => Some(Self::Id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Level => "level",
            Self::Source => "source",
            Self::Id => "id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub order: SortOrder,
}

/// Bulk-write and query capability of a log store.
///
/// Writes are unordered and non-transactional: a record the store rejects
/// must not prevent the rest of the batch from being written.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Insert a batch. `Err` means nothing in the batch can be assumed
    /// written; per-record rejections are reported in the outcome.
    async fn bulk_insert(&self, records: Vec<LogRecord>) -> StoreResult<BulkInsertOutcome>;

    /// Whether a full-text index exists on `field`.
    async fn has_text_capability(&self, field: &str) -> StoreResult<bool>;

    /// Fetch one page of matching records in `sort` order.
    async fn query(
        &self,
        filter: &LogFilter,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<StoredLog>>;

    /// Count matching records.
    async fn count(&self, filter: &LogFilter) -> StoreResult<u64>;
}
