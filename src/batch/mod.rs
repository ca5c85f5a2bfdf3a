//! Batch operations over the working set
//!
//! Files are processed one after another in working-set order. Each file runs
//! inside its own failure boundary: a failure is logged and recorded in the
//! [`BatchReport`] and the batch moves on. Merge is the exception, being one
//! combined operation that succeeds or fails as a whole.

pub mod operations;
pub mod output;
pub mod report;

pub use operations::{
    convert_to_docx, convert_to_txt, extract_images, merge_files, page_text_block, split_files,
    MergeFailure, Written,
};
pub use output::{
    merge_output_path, output_dir, output_path, split_page_name, validate_output_name,
    OperationKind,
};
pub use report::{BatchReport, FileOutcome, OutcomeStatus};

use crate::error::{Error, Result};
use crate::source::normalize;
use std::path::{Path, PathBuf};

fn same_file(a: &Path, b: &Path) -> bool {
    if normalize(a) == normalize(b) {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn run_one(kind: OperationKind, source: &Path) -> Result<Written> {
    let target = output_path(source, kind)?;
    match kind {
        OperationKind::ExtractImages => extract_images(source, &target),
        OperationKind::ConvertToDocx => convert_to_docx(source, &target).map(Written::from),
        OperationKind::ConvertToTxt => convert_to_txt(source, &target).map(Written::from),
        OperationKind::SplitFiles => split_files(source, &target).map(Written::from),
        OperationKind::MergeFiles => Err(Error::InvalidInput {
            reason: "merge is not a per-file operation".to_string(),
        }),
    }
}

/// Run a per-file operation over `paths`.
///
/// Fails only when `paths` is empty (before touching the filesystem) or when
/// `kind` is [`OperationKind::MergeFiles`]; per-file errors end up in the report.
pub fn run(kind: OperationKind, paths: &[PathBuf]) -> Result<BatchReport> {
    if paths.is_empty() {
        return Err(Error::NoFilesSelected);
    }
    if kind == OperationKind::MergeFiles {
        return Err(Error::InvalidInput {
            reason: "use batch::merge for merge_files".to_string(),
        });
    }

    tracing::info!(operation = %kind, files = paths.len(), "starting batch");
    let mut report = BatchReport::new(kind);

    for source in paths {
        match run_one(kind, source) {
            Ok(written) => {
                tracing::debug!(
                    path = %source.display(),
                    outputs = written.outputs.len(),
                    skipped = written.skipped.len(),
                    "file done"
                );
                report.push(
                    FileOutcome::succeeded(source, &written.outputs).with_skipped(written.skipped),
                );
            }
            Err(e) => {
                tracing::warn!(path = %source.display(), error = %e, operation = %kind, "file failed");
                report.push(FileOutcome::failed(source, &e));
            }
        }
    }

    tracing::info!(
        operation = %kind,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

/// Merge all `paths` into `{parent of first}/{name}.pdf`.
///
/// The empty-set and output-name checks happen before any file is read; a name
/// that would land on one of the inputs is rejected. On
/// failure every input is reported as failed; the offending input carries the
/// underlying error.
pub fn merge(paths: &[PathBuf], name: &str) -> Result<BatchReport> {
    let first = paths.first().ok_or(Error::NoFilesSelected)?;
    let output = merge_output_path(first, name)?;
    if paths.iter().any(|source| same_file(source, &output)) {
        return Err(Error::InvalidOutputName {
            name: name.to_string(),
        });
    }

    tracing::info!(files = paths.len(), output = %output.display(), "starting merge");
    let mut report = BatchReport::new(OperationKind::MergeFiles);

    match merge_files(paths, &output) {
        Ok(page_count) => {
            tracing::info!(output = %output.display(), page_count, "merge finished");
            for source in paths {
                report.push(FileOutcome::succeeded(source, std::slice::from_ref(&output)));
            }
        }
        Err(MergeFailure { input, error }) => {
            tracing::warn!(error = %error, ?input, "merge failed");
            let kind = error.kind();
            for (i, source) in paths.iter().enumerate() {
                let outcome = match input {
                    Some(culprit) if culprit != i => FileOutcome::failed_with(
                        source,
                        kind,
                        format!("merge aborted: {} failed", paths[culprit].display()),
                    ),
                    _ => FileOutcome::failed(source, &error),
                };
                report.push(outcome);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_run_on_empty_set() {
        let result = run(OperationKind::ConvertToTxt, &[]);
        assert!(matches!(result, Err(Error::NoFilesSelected)));
    }

    #[test]
    fn test_merge_on_empty_set() {
        assert!(matches!(merge(&[], "all"), Err(Error::NoFilesSelected)));
    }

    #[test]
    fn test_run_rejects_merge_kind() {
        let result = run(OperationKind::MergeFiles, &[PathBuf::from("/a.pdf")]);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_merge_rejects_bad_name_before_reading() {
        let result = merge(&[PathBuf::from("/nonexistent/a.pdf")], "../up");
        assert!(matches!(result, Err(Error::InvalidOutputName { .. })));
    }

    #[test]
    fn test_merge_refuses_to_overwrite_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        std::fs::write(&a, b"%PDF-1.4 original a").unwrap();
        std::fs::write(&b, b"%PDF-1.4 original b").unwrap();

        for name in ["a", "a.pdf", " b.PDF "] {
            let result = merge(&[a.clone(), b.clone()], name);
            assert!(
                matches!(result, Err(Error::InvalidOutputName { .. })),
                "{name:?} was accepted"
            );
        }
        assert_eq!(std::fs::read(&a).unwrap(), b"%PDF-1.4 original a");
    }

    #[cfg(unix)]
    #[test]
    fn test_merge_refuses_input_reached_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.pdf");
        std::fs::write(&real, b"%PDF-1.4").unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let first = sub.join("first.pdf");
        std::fs::write(&first, b"%PDF-1.4").unwrap();
        std::os::unix::fs::symlink(&real, sub.join("alias.pdf")).unwrap();

        let result = merge(&[first, real], "alias");
        assert!(matches!(result, Err(Error::InvalidOutputName { .. })));
    }

    #[test]
    fn test_missing_files_do_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let missing_a = dir.path().join("a.pdf");
        let missing_b = dir.path().join("b.pdf");

        let report = run(OperationKind::SplitFiles, &[missing_a, missing_b]).unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failed(), 2);
        for outcome in &report.outcomes {
            assert!(matches!(
                outcome.status,
                OutcomeStatus::Failed {
                    kind: FailureKind::NotFound,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_merge_attributes_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.pdf");
        std::fs::write(&bad, b"not a pdf").unwrap();
        let missing = dir.path().join("missing.pdf");

        let report = merge(&[bad.clone(), missing], "all").unwrap();

        assert_eq!(report.failed(), 2);
        match &report.outcomes[0].status {
            OutcomeStatus::Failed { kind, .. } => assert_eq!(*kind, FailureKind::MalformedPdf),
            other => panic!("unexpected {:?}", other),
        }
        match &report.outcomes[1].status {
            OutcomeStatus::Failed { message, .. } => {
                assert!(message.contains("merge aborted"));
                assert!(message.contains("bad.pdf"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!dir.path().join("all.pdf").exists());
    }
}
