//! PDF processing layer
//!
//! Text and image extraction use lopdf, page splitting and merging use qpdf,
//! DOCX output is written directly as an Open XML package.

mod docx;
mod qpdf;
mod reader;

pub use docx::DocxWriter;
pub use qpdf::QpdfWrapper;
pub use reader::{ExtractedImage, ImageEncoding, ImageExtraction, PdfReader, SkippedImage};
