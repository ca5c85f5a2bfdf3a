//! Resolution of working-set paths to PDF bytes

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolved PDF data
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    pub path: PathBuf,
}

/// Check the `%PDF` header of raw data
pub fn check_pdf_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

/// Read a file path into PDF data, classifying IO failures
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<ResolvedPdf> {
    let path = path.as_ref();

    let data = std::fs::read(path).map_err(|e| Error::from_io(path, e))?;
    check_pdf_header(&data)?;

    Ok(ResolvedPdf {
        data,
        path: path.to_path_buf(),
    })
}
