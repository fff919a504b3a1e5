//! Ingestion, persistence and query error types.

use la_protocol::LogFamily;
use thiserror::Error;

use crate::timestamp::SUPPORTED_FORMATS;

/// A timestamp value matched none of the supported representations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp format: {value}. Supported formats are: {}", SUPPORTED_FORMATS.join("; "))]
pub struct TimestampError {
    pub value: String,
}

impl TimestampError {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Per-line failure raised by a record processor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("log entry must be a non-empty string")]
    Empty,

    #[error("failed to parse {family} log entry")]
    Family { family: LogFamily },

    #[error("{family} log entry has an empty {field}")]
    MissingField {
        family: LogFamily,
        field: &'static str,
    },

    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// Errors that fail a whole ingestion call.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("uploaded file is empty or invalid")]
    EmptyInput,

    #[error("uploaded file is malformed: {0}")]
    MalformedUpload(String),

    #[error("unsupported log format: {0}")]
    UnsupportedFormat(LogFamily),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors reported by a `LogStore` for a whole call.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Backend(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that fail a search.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid {field}: {value}")]
    InvalidTimeBound { field: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = Result<T, IngestError>;

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience alias for search results.
pub type QueryResult<T> = Result<T, QueryError>;
