//! Per-line family classification using cheap syntactic probes.

use la_protocol::LogFamily;
use regex::Regex;
use std::sync::LazyLock;

// Dotted-quad prefix anchored at the start of the line.
static RE_WEB_ACCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+").unwrap());

// Two bracketed tokens, a word, then a hyphen: `[ts] [level] source -`.
static RE_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*\]\s*\[.*\]\s*(?-u:\w)+\s*-").unwrap());

/// Classify one raw line. Rules are tried in `LogFamily` declaration order.
pub fn classify(line: &str) -> LogFamily {
    let line = line.trim();
    if is_structured(line) {
        LogFamily::Structured
    } else if RE_WEB_ACCESS.is_match(line) {
        LogFamily::WebAccess
    } else if RE_BRACKETED.is_match(line) {
        LogFamily::BracketedApplication
    } else {
        LogFamily::Unknown
    }
}

/// A full JSON parse yielding an object whose `timestamp`, `level` and
/// `message` are all present and non-empty.
fn is_structured(line: &str) -> bool {
    if !line.starts_with('{') {
        return false;
    }
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(line) else {
        return false;
    };
    ["timestamp", "level", "message"]
        .iter()
        .all(|key| map.get(*key).is_some_and(is_truthy))
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Raw lines of one ingestion request, split by family.
///
/// Each bucket keeps lines in input order; lines are stored exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationBuckets {
    pub structured: Vec<String>,
    pub web_access: Vec<String>,
    pub bracketed_application: Vec<String>,
    pub unknown: Vec<String>,
}

impl ClassificationBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a batch of lines into the buckets. Never fails: anything
    /// unrecognized lands in `unknown`.
    pub fn classify_batch(&mut self, batch: Vec<String>) {
        for line in batch {
            match classify(&line) {
                LogFamily::Structured => self.structured.push(line),
                LogFamily::WebAccess => self.web_access.push(line),
                LogFamily::BracketedApplication => self.bracketed_application.push(line),
                LogFamily::Unknown => self.unknown.push(line),
            }
        }
    }

    /// Move a family's lines out of the buckets.
    pub fn take(&mut self, family: LogFamily) -> Vec<String> {
        let bucket = match family {
            LogFamily::Structured => &mut self.structured,
            LogFamily::WebAccess => &mut self.web_access,
            LogFamily::BracketedApplication => &mut self.bracketed_application,
            LogFamily::Unknown => &mut self.unknown,
        };
        std::mem::take(bucket)
    }

    pub fn total(&self) -> usize {
        self.structured.len()
            + self.web_access.len()
            + self.bracketed_application.len()
            + self.unknown.len()
    }
}
