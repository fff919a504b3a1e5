use serde::{Deserialize, Serialize};

/// One failure entry in an ingestion result.
///
/// Line-level parse failures carry the offending input and cover one line.
/// Batch-level persistence failures carry no input and cover every record
/// the store did not write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub reason: String,
    /// Number of lines or records this entry accounts for.
    pub count: usize,
    /// Per-record detail supplied by the store, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl IngestFailure {
    pub fn line(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            reason: reason.into(),
            count: 1,
            details: Vec::new(),
        }
    }

    pub fn batch(reason: impl Into<String>, count: usize, details: Vec<String>) -> Self {
        Self {
            input: None,
            reason: reason.into(),
            count,
            details,
        }
    }
}

/// Outcome of one family's processing pass within a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyReport {
    /// Records written to the store.
    pub persisted: usize,
    /// Lines or records that did not make it into the store.
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<IngestFailure>,
}

/// Breakdown of one ingested file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub structured: FamilyReport,
    pub web_access: FamilyReport,
    pub bracketed_application: FamilyReport,
    /// Lines no family claimed.
    pub unknown: usize,
}

impl IngestReport {
    /// Persisted counts per family plus the unknown count.
    pub fn categorized(&self) -> CategorizedCounts {
        CategorizedCounts {
            structured: self.structured.persisted,
            web_access: self.web_access.persisted,
            bracketed_application: self.bracketed_application.persisted,
            unknown: self.unknown,
        }
    }
}

/// Compact per-family counts returned by the upload endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedCounts {
    pub structured: usize,
    pub web_access: usize,
    pub bracketed_application: usize,
    pub unknown: usize,
}

/// Report for one file of a multi-file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_name: String,
    pub report: IngestReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorized_uses_persisted_counts() {
        let report = IngestReport {
            structured: FamilyReport {
                persisted: 4,
                failed: 1,
                errors: vec![IngestFailure::line("{bad", "failed to parse structured log entry")],
            },
            web_access: FamilyReport {
                persisted: 2,
                ..Default::default()
            },
            bracketed_application: FamilyReport::default(),
            unknown: 3,
        };
        let counts = report.categorized();
        assert_eq!(counts.structured, 4);
        assert_eq!(counts.web_access, 2);
        assert_eq!(counts.bracketed_application, 0);
        assert_eq!(counts.unknown, 3);
    }

    #[test]
    fn batch_failure_omits_input() {
        let failure = IngestFailure::batch("Batch insertion failed", 10, vec![]);
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("input").is_none());
        assert!(json.get("details").is_none());
        assert_eq!(json["count"], 10);
    }
}
