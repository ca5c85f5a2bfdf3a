//! Per-file outcomes and the aggregated batch report

use crate::batch::OperationKind;
use crate::error::{Error, FailureKind};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of one file in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded {
        /// Files written for this source
        outputs: Vec<String>,
        /// Parts of the source that could not be written, one note each
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<String>,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct FileOutcome {
    /// Source PDF path
    pub path: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl FileOutcome {
    pub fn succeeded(path: &Path, outputs: &[PathBuf]) -> Self {
        Self {
            path: path.display().to_string(),
            status: OutcomeStatus::Succeeded {
                outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
                skipped: Vec::new(),
            },
        }
    }

    /// Attach notes about skipped parts to a successful outcome
    pub fn with_skipped(mut self, notes: Vec<String>) -> Self {
        if let OutcomeStatus::Succeeded { skipped, .. } = &mut self.status {
            *skipped = notes;
        }
        self
    }

    /// Notes about skipped parts (empty for failures)
    pub fn skipped(&self) -> &[String] {
        match &self.status {
            OutcomeStatus::Succeeded { skipped, .. } => skipped,
            OutcomeStatus::Failed { .. } => &[],
        }
    }

    /// Failure outcome carrying the client-safe message; log the full error first
    pub fn failed(path: &Path, error: &Error) -> Self {
        Self::failed_with(path, error.kind(), error.client_message())
    }

    pub fn failed_with(path: &Path, kind: FailureKind, message: String) -> Self {
        Self {
            path: path.display().to_string(),
            status: OutcomeStatus::Failed { kind, message },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

/// Aggregate of all per-file outcomes of one batch operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BatchReport {
    pub operation: OperationKind,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Total number of skipped parts across all files
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().map(|o| o.skipped().len()).sum()
    }

    /// One-line aggregate suitable for a notification
    pub fn summary(&self) -> String {
        let total = self.outcomes.len();
        let mut summary = if self.is_success() {
            format!("{}: all {} file(s) processed successfully", self.operation, total)
        } else {
            format!(
                "{}: {} of {} file(s) failed",
                self.operation,
                self.failed(),
                total
            )
        };
        let skipped = self.skipped();
        if skipped > 0 {
            summary.push_str(&format!(", {} image(s) skipped", skipped));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> BatchReport {
        let mut report = BatchReport::new(OperationKind::ConvertToTxt);
        report.push(FileOutcome::succeeded(
            Path::new("/in/a.pdf"),
            &[PathBuf::from("/in/a-output/a.txt")],
        ));
        report.push(FileOutcome::failed(
            Path::new("/in/b.pdf"),
            &Error::PdfNotFound {
                path: "/in/b.pdf".to_string(),
            },
        ));
        report
    }

    #[test]
    fn test_counts_and_summary() {
        let report = sample();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.summary(), "convert_to_txt: 1 of 2 file(s) failed");
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_skipped_parts_are_reported() {
        let mut report = BatchReport::new(OperationKind::ExtractImages);
        report.push(
            FileOutcome::succeeded(
                Path::new("/in/scan.pdf"),
                &[PathBuf::from("/in/scan-output/images/image1_2.png")],
            )
            .with_skipped(vec!["image1_1: JBIG2 image".to_string()]),
        );

        assert!(report.is_success());
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.summary(),
            "extract_images: all 1 file(s) processed successfully, 1 image(s) skipped"
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["outcomes"][0]["skipped"],
            serde_json::json!(["image1_1: JBIG2 image"])
        );
    }

    #[test]
    fn test_failure_message_hides_library_details() {
        let outcome = FileOutcome::failed(
            Path::new("/in/c.pdf"),
            &Error::InvalidPdf {
                reason: "xref table at offset 1234 is corrupt".to_string(),
            },
        );
        assert_eq!(
            outcome.status,
            OutcomeStatus::Failed {
                kind: FailureKind::MalformedPdf,
                message: "Invalid PDF file".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = BatchReport::new(OperationKind::SplitFiles);
        assert!(report.is_success());
        assert_eq!(
            report.summary(),
            "split_files: all 0 file(s) processed successfully"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "operation": "convert_to_txt",
                "outcomes": [
                    {
                        "path": "/in/a.pdf",
                        "status": "succeeded",
                        "outputs": ["/in/a-output/a.txt"]
                    },
                    {
                        "path": "/in/b.pdf",
                        "status": "failed",
                        "kind": "not_found",
                        "message": "PDF not found: /in/b.pdf"
                    }
                ]
            })
        );
    }
}
