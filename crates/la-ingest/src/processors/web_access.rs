//! Web server access log processor (common/combined log format).

use la_protocol::{LogFamily, LogRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::ParseError;
use crate::timestamp;

// IP ... [timestamp] "request" status bytes
static RE_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+).*\[([^\]]+)\] "(.*?)" ([0-9]+) ([0-9]+)"#)
        .unwrap()
});

const SOURCE: &str = "nginx";

pub fn process(line: &str) -> Result<LogRecord, ParseError> {
    let caps = RE_ACCESS.captures(line).ok_or(ParseError::Family {
        family: LogFamily::WebAccess,
    })?;
    let ip = &caps[1];
    let request = &caps[3];
    let status = &caps[4];
    let bytes = &caps[5];

    let timestamp = timestamp::normalize(&caps[2])?;
    // Status digits can overflow u16 only on garbage input; treat that as an error status.
    let level = match status.parse::<u16>() {
        Ok(code) if code < 400 => "INFO",
        _ => "ERROR",
    };

    Ok(LogRecord {
        timestamp,
        level: level.to_string(),
        message: format!("\"{request}\" - Status: {status}, Bytes: {bytes}"),
        source: SOURCE.to_string(),
        raw_log: line.to_string(),
        metadata: HashMap::from([
            ("ip".to_string(), ip.to_string()),
            ("status".to_string(), status.to_string()),
            ("bytes".to_string(), bytes.to_string()),
        ]),
    })
}
