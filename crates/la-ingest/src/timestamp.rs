//! Timestamp normalization into `DateTime<Utc>`.
//!
//! Resolution order, first match wins:
//! 1. exactly ten ASCII digits: Unix epoch seconds;
//! 2. the five explicit formats in `EXPLICIT_FORMATS`, each strictly shaped;
//! 3. generic calendar parsing (RFC 3339, RFC 2822, naive date-times and dates, read as UTC).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::TimestampError;

/// Human-readable list of accepted formats, quoted in `TimestampError`.
pub const SUPPORTED_FORMATS: &[&str] = &[
    "DD/MMM/YYYY:HH:mm:ss Z (e.g., 10/Oct/2023:13:55:36 +0000)",
    "YYYY-MM-DD HH:mm:ss.SSS (e.g., 2023-10-10 13:55:36.123)",
    "YYYY-MM-DDTHH:mm:ss.SSSZ (e.g., 2023-10-10T13:55:36.123Z)",
    "YYYY-MM-DDTHH:mm:ssZ (e.g., 2023-10-10T13:55:36Z)",
    "YYYY-MM-DD HH:mm:ss Z (e.g., 2023-10-10 13:55:36 +0000)",
    "Unix timestamp (e.g., 1696939200)",
];

/// A strictly shaped format: the regex must match the whole value before
/// chrono is asked to parse it, so partial matches never succeed.
struct ExplicitFormat {
    shape: LazyLock<Regex>,
    parse: fn(&str) -> Option<DateTime<Utc>>,
}

static EXPLICIT_FORMATS: [ExplicitFormat; 5] = [
    // 10/Oct/2023:13:55:36 +0000
    ExplicitFormat {
        shape: LazyLock::new(|| {
            Regex::new(r"(?-u)^\d{2}/[A-Za-z]{3}/\d{4}:\d{2}:\d{2}:\d{2} [+-]\d{2}:?\d{2}$")
                .unwrap()
        }),
        parse: |s| parse_zoned(s, "%d/%b/%Y:%H:%M:%S %z"),
    },
    // 2023-10-10 13:55:36.123
    ExplicitFormat {
        shape: LazyLock::new(|| {
            Regex::new(r"(?-u)^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}$").unwrap()
        }),
        parse: |s| parse_naive(s, "%Y-%m-%d %H:%M:%S%.f"),
    },
    // 2023-10-10T13:55:36.123Z
    ExplicitFormat {
        shape: LazyLock::new(|| {
            Regex::new(r"(?-u)^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}(Z|[+-]\d{2}:?\d{2})$")
                .unwrap()
        }),
        parse: |s| parse_zoned(s, "%Y-%m-%dT%H:%M:%S%.f%z"),
    },
    // 2023-10-10T13:55:36Z
    ExplicitFormat {
        shape: LazyLock::new(|| {
            Regex::new(r"(?-u)^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(Z|[+-]\d{2}:?\d{2})$")
                .unwrap()
        }),
        parse: |s| parse_zoned(s, "%Y-%m-%dT%H:%M:%S%z"),
    },
    // 2023-10-10 13:55:36 +0000
    ExplicitFormat {
        shape: LazyLock::new(|| {
            Regex::new(r"(?-u)^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{2}:?\d{2}$").unwrap()
        }),
        parse: |s| parse_zoned(s, "%Y-%m-%d %H:%M:%S %z"),
    },
];

/// Normalize a textual timestamp.
pub fn normalize(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    if value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| TimestampError::new(value));
    }

    EXPLICIT_FORMATS
        .iter()
        .filter(|f| f.shape.is_match(value))
        .find_map(|f| (f.parse)(value))
        .or_else(|| parse_generic(value))
        .ok_or_else(|| TimestampError::new(value))
}

/// Normalize a timestamp taken from a JSON document.
///
/// Strings go through `normalize`. Integers with exactly ten digits are
/// epoch seconds; any other number is epoch milliseconds.
pub fn normalize_value(value: &serde_json::Value) -> Result<DateTime<Utc>, TimestampError> {
    match value {
        serde_json::Value::String(s) => normalize(s),
        serde_json::Value::Number(n) => {
            let parsed = if let Some(i) = n.as_i64()
                && i.unsigned_abs().to_string().len() == 10
            {
                DateTime::from_timestamp(i, 0)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            };
            parsed.ok_or_else(|| TimestampError::new(n.to_string()))
        }
        other => Err(TimestampError::new(other.to_string())),
    }
}

// Rewrites a trailing `Z` or `±HH:MM` into `±HHMM` before handing off to `%z`.
fn parse_zoned(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    let input = if let Some(head) = s.strip_suffix('Z') {
        format!("{head}+0000")
    } else if s.len() > 6 && s.as_bytes()[s.len() - 3] == b':' {
        let (head, minutes) = s.split_at(s.len() - 3);
        format!("{head}{}", &minutes[1..])
    } else {
        s.to_string()
    };
    DateTime::parse_from_str(&input, fmt)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, fmt)
        .ok()
        .map(|ndt| ndt.and_utc())
}

fn parse_generic(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_rfc2822(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            [
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M",
                "%Y/%m/%d %H:%M:%S",
            ]
            .iter()
            .find_map(|fmt| parse_naive(s, fmt))
        })
        .or_else(|| {
            ["%Y-%m-%d", "%Y/%m/%d"].iter().find_map(|fmt| {
                NaiveDate::parse_from_str(s, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|ndt| ndt.and_utc())
            })
        })
}
