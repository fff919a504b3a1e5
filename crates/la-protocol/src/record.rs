use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Canonical log record, normalized from any supported family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Normalized instant of the event.
    pub timestamp: DateTime<Utc>,
    /// Severity label (e.g. "INFO", "ERROR").
    pub level: String,
    /// Message body.
    pub message: String,
    /// Originating subsystem or server.
    pub source: String,
    /// The untouched input line, kept for audit and replay.
    pub raw_log: String,
    /// Free-form per-family detail.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl LogRecord {
    /// Name of the first required field that is empty, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.level.is_empty() {
            Some("level")
        } else if self.message.is_empty() {
            Some("message")
        } else if self.source.is_empty() {
            Some("source")
        } else if self.raw_log.is_empty() {
            Some("rawLog")
        } else {
            None
        }
    }
}

/// A record as persisted by a store, with its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLog {
    /// Store-assigned identifier (UUID v7, time-ordered).
    pub id: Uuid,
    #[serde(flatten)]
    pub record: LogRecord,
    /// When the store accepted the record.
    pub created_at: DateTime<Utc>,
}

impl StoredLog {
    pub fn new(record: LogRecord) -> Self {
        Self {
            id: Uuid::now_v7(),
            record,
            created_at: Utc::now(),
        }
    }
}
