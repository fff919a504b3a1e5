//! Record processors, one per recognized family.
//!
//! `Processor` is a closed set: adding a family means adding a variant here
//! and a tag in `LogFamily`, never runtime type inspection.

pub mod bracketed;
pub mod structured;
pub mod web_access;

use la_protocol::{LogFamily, LogRecord};

use crate::error::ParseError;

/// Turns a raw line of one family into a canonical `LogRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    Structured,
    WebAccess,
    BracketedApplication,
}

impl Processor {
    /// Processor for a classifier tag. `Unknown` has none.
    pub fn for_family(family: LogFamily) -> Option<Self> {
        match family {
            LogFamily::Structured => Some(Self::Structured),
            LogFamily::WebAccess => Some(Self::WebAccess),
            LogFamily::BracketedApplication => Some(Self::BracketedApplication),
            LogFamily::Unknown => None,
        }
    }

    pub fn family(&self) -> LogFamily {
        match self {
            Self::Structured => LogFamily::Structured,
            Self::WebAccess => LogFamily::WebAccess,
            Self::BracketedApplication => LogFamily::BracketedApplication,
        }
    }

    /// Process one line. `raw_log` of the result is `line` unchanged.
    pub fn process(&self, line: &str) -> Result<LogRecord, ParseError> {
        if line.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let record = match self {
            Self::Structured => structured::process(line)?,
            Self::WebAccess => web_access::process(line)?,
            Self::BracketedApplication => bracketed::process(line)?,
        };
        match record.missing_required_field() {
            Some(field) => Err(ParseError::MissingField {
                family: self.family(),
                field,
            }),
            None => Ok(record),
        }
    }
}
