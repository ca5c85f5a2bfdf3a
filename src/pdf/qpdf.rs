//! qpdf FFI wrapper for page-level PDF manipulation
//!
//! Splitting and merging copy whole page objects between documents with the
//! qpdf crate (vendored FFI), so content streams, fonts and images travel with
//! their pages untouched.

use crate::error::{Error, Result};
use qpdf::QPdf;

/// Wrapper for qpdf operations via FFI
pub struct QpdfWrapper;

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    Error::Qpdf {
        reason: e.to_string(),
    }
}

fn open_qpdf(data: &[u8]) -> Result<QPdf> {
    QPdf::read_from_memory(data).map_err(|e| Error::InvalidPdf {
        reason: e.to_string(),
    })
}

impl QpdfWrapper {
    /// Split a PDF into one single-page PDF per page
    ///
    /// # Arguments
    /// * `input_data` - Raw PDF bytes
    ///
    /// # Returns
    /// One PDF per source page, in page order
    pub fn split_each_page(input_data: &[u8]) -> Result<Vec<Vec<u8>>> {
        let source = open_qpdf(input_data)?;
        let pages = source.get_pages().map_err(map_qpdf_error)?;

        let mut outputs = Vec::with_capacity(pages.len());
        for page in &pages {
            let dest = QPdf::empty();
            let copied = dest.copy_from_foreign(page);
            dest.add_page(&copied, false).map_err(map_qpdf_error)?;

            let mut writer = dest.writer();
            writer.preserve_encryption(false);
            outputs.push(writer.write_to_memory().map_err(map_qpdf_error)?);
        }

        Ok(outputs)
    }

    /// Merge multiple PDFs into one
    ///
    /// # Arguments
    /// * `inputs` - Raw PDF bytes to merge, in order
    ///
    /// # Returns
    /// The merged PDF as bytes
    pub fn merge(inputs: &[&[u8]]) -> Result<Vec<u8>> {
        if inputs.is_empty() {
            return Err(Error::NoFilesSelected);
        }

        let dest = QPdf::empty();

        for (i, input_data) in inputs.iter().enumerate() {
            let source = QPdf::read_from_memory(input_data).map_err(|e| Error::InvalidPdf {
                reason: format!("Failed to read input PDF {}: {}", i, e),
            })?;

            let pages = source.get_pages().map_err(|e| Error::Qpdf {
                reason: format!("Failed to get pages from input PDF {}: {}", i, e),
            })?;

            for page in &pages {
                let copied = dest.copy_from_foreign(page);
                dest.add_page(&copied, false).map_err(map_qpdf_error)?;
            }
        }

        dest.writer().write_to_memory().map_err(map_qpdf_error)
    }

    /// Get the page count of a PDF
    pub fn get_page_count(input_data: &[u8]) -> Result<u32> {
        let qpdf = open_qpdf(input_data)?;
        qpdf.get_num_pages().map_err(map_qpdf_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_without_inputs() {
        assert!(matches!(
            QpdfWrapper::merge(&[]),
            Err(Error::NoFilesSelected)
        ));
    }

    #[test]
    fn test_split_garbage_is_malformed() {
        let result = QpdfWrapper::split_each_page(b"definitely not a pdf");
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[test]
    fn test_page_count_garbage() {
        assert!(QpdfWrapper::get_page_count(b"%PDF-garbage").is_err());
    }
}
