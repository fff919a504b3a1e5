use serde::{Deserialize, Serialize};

/// Raw-line shape recognized by the classifier.
///
/// Declaration order is classification precedence: a line is tested against
/// `Structured` first and falls through to `Unknown` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFamily {
    /// Self-describing JSON record with timestamp, level and message.
    Structured,
    /// Web server access log line (common/combined log format).
    WebAccess,
    /// `[ts] [level] source - message` application log line.
    BracketedApplication,
    /// Anything the classifier could not place.
    Unknown,
}

impl LogFamily {
    /// Families that have a record processor, in processing order.
    pub const RECOGNIZED: [LogFamily; 3] = [
        LogFamily::Structured,
        LogFamily::WebAccess,
        LogFamily::BracketedApplication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::WebAccess => "web-access",
            Self::BracketedApplication => "bracketed-application",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LogFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
