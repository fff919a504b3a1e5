//! Structured (JSON object) record processor.

use la_protocol::{LogFamily, LogRecord};
use std::collections::HashMap;

use crate::error::ParseError;
use crate::timestamp;

const DEFAULT_LEVEL: &str = "INFO";
const DEFAULT_MESSAGE: &str = "No message";
const DEFAULT_SOURCE: &str = "json";

/// Parse a JSON object line. The whole object becomes `metadata`, with
/// non-string values kept as their JSON text.
pub fn process(line: &str) -> Result<LogRecord, ParseError> {
    let failed = || ParseError::Family {
        family: LogFamily::Structured,
    };
    let value: serde_json::Value = serde_json::from_str(line.trim()).map_err(|_| failed())?;
    let map = value.as_object().ok_or_else(failed)?;

    let ts = map.get("timestamp").ok_or(ParseError::MissingField {
        family: LogFamily::Structured,
        field: "timestamp",
    })?;
    let timestamp = timestamp::normalize_value(ts)?;

    let metadata: HashMap<String, String> = map
        .iter()
        .map(|(k, v)| (k.clone(), value_text(v)))
        .collect();

    Ok(LogRecord {
        timestamp,
        level: non_empty_text(map.get("level")).unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
        message: non_empty_text(map.get("message"))
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        source: non_empty_text(map.get("service")).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        raw_log: line.to_string(),
        metadata,
    })
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        v => Some(value_text(v)).filter(|s| !s.is_empty()),
    }
}
