//! `[timestamp] [level] source - message` application log processor.

use la_protocol::{LogFamily, LogRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::ParseError;
use crate::timestamp;

static RE_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\] \[(.*?)\] (.*?) - (.*)").unwrap());

pub fn process(line: &str) -> Result<LogRecord, ParseError> {
    let caps = RE_BRACKETED.captures(line).ok_or(ParseError::Family {
        family: LogFamily::BracketedApplication,
    })?;
    let source = caps[3].to_string();

    Ok(LogRecord {
        timestamp: timestamp::normalize(&caps[1])?,
        level: caps[2].to_uppercase(),
        message: caps[4].to_string(),
        metadata: HashMap::from([("source".to_string(), source.clone())]),
        source,
        raw_log: line.to_string(),
    })
}
