//! Error types for the PDF batch server

use serde::Serialize;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias for the PDF batch server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF batch server
#[derive(Error, Debug)]
pub enum Error {
    /// Operation triggered with an empty working set
    #[error("No path selected")]
    NoFilesSelected,

    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Permission denied while reading or writing a file
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// Invalid or malformed PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// Image stream in an encoding we cannot persist
    #[error("Unsupported image: {reason}")]
    UnsupportedImage { reason: String },

    /// Merge output name is empty or tries to leave the target directory
    #[error("Invalid output name: {name:?}")]
    InvalidOutputName { name: String },

    /// Malformed request input (bad glob pattern, directory expected, ...)
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// qpdf error
    #[error("qpdf error: {reason}")]
    Qpdf { reason: String },

    /// lopdf error
    #[error("lopdf error: {reason}")]
    Lopdf { reason: String },

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// DOCX packaging error
    #[error("DOCX error: {reason}")]
    Docx { reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking task failed to complete
    #[error("Task join error: {reason}")]
    TaskJoin { reason: String },
}

/// Coarse failure classification reported per file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    MalformedPdf,
    Unsupported,
    InvalidInput,
    Io,
    Other,
}

impl Error {
    /// Classify an IO error that happened while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::PdfNotFound {
                path: path.display().to_string(),
            },
            io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => Error::Io(err),
        }
    }

    /// Failure kind used in batch reports
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::PdfNotFound { .. } => FailureKind::NotFound,
            Error::PermissionDenied { .. } | Error::PathAccessDenied { .. } => {
                FailureKind::PermissionDenied
            }
            Error::InvalidPdf { .. } | Error::Qpdf { .. } | Error::Lopdf { .. } => {
                FailureKind::MalformedPdf
            }
            Error::UnsupportedImage { .. } => FailureKind::Unsupported,
            Error::NoFilesSelected
            | Error::InvalidOutputName { .. }
            | Error::InvalidInput { .. }
            | Error::PageOutOfBounds { .. } => FailureKind::InvalidInput,
            Error::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => FailureKind::NotFound,
                io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
                _ => FailureKind::Io,
            },
            Error::Image(_)
            | Error::Docx { .. }
            | Error::Serialization(_)
            | Error::TaskJoin { .. } => FailureKind::Other,
        }
    }

    /// Return a sanitized error message safe to send to clients.
    /// Library internals are omitted; full details should be logged via tracing first.
    pub fn client_message(&self) -> String {
        match self {
            Error::NoFilesSelected => "No path selected".to_string(),
            Error::PdfNotFound { path } => format!("PDF not found: {}", path),
            Error::PermissionDenied { path } => format!("Permission denied: {}", path),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::UnsupportedImage { .. } => "Unsupported image encoding".to_string(),
            Error::InvalidOutputName { name } => format!("Invalid output name: {:?}", name),
            Error::InvalidInput { reason } => format!("Invalid input: {}", reason),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Qpdf { .. } | Error::Lopdf { .. } => "PDF processing error".to_string(),
            Error::Image(_) => "Image processing error".to_string(),
            Error::Docx { .. } => "DOCX writing error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
            Error::TaskJoin { .. } => "Internal error".to_string(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::Lopdf {
            reason: e.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Docx {
            reason: e.to_string(),
        }
    }
}
