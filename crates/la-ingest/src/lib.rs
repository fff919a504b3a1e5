//! Log ingestion and search engine.
//!
//! Classifies heterogeneous log lines into families (structured JSON, web
//! access, bracketed application, unknown), normalizes them into canonical
//! records, persists them in bounded-concurrency bulk batches through the
//! `LogStore` boundary, and serves paginated, filterable searches.

pub mod classify;
pub mod config;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod processors;
pub mod query;
pub mod store;
pub mod timestamp;

// Re-export key types for convenience
pub use classify::{ClassificationBuckets, classify};
pub use config::{IngestConfig, QueryConfig};
pub use error::{
    IngestError, IngestResult, ParseError, QueryError, QueryResult, StoreError, StoreResult,
    TimestampError,
};
pub use mock::MockLogStore;
pub use pipeline::{IngestPipeline, ProcessingResult, UploadedFile};
pub use processors::Processor;
pub use query::{QueryEngine, QuerySpec, SearchCriteria};
pub use store::{
    BulkInsertOutcome, KeywordMatch, LogFilter, LogStore, RecordFailure, SortField, SortKey,
    SortOrder,
};
