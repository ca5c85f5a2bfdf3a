//! Single-file operations
//!
//! Each function takes one source PDF and its output target and returns the
//! files it wrote, plus notes on parts it had to leave out. Output directories are created on demand; output files are
//! always created fresh, never appended to.

use crate::batch::output::split_page_name;
use crate::error::{Error, Result};
use crate::pdf::{DocxWriter, PdfReader, QpdfWrapper};
use crate::source::resolve_path;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Files written for one source, and anything left out of them
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Written {
    pub outputs: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

impl From<Vec<PathBuf>> for Written {
    fn from(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            skipped: Vec::new(),
        }
    }
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::from_io(dir, e))
}

fn ensure_parent(file: &Path) -> Result<()> {
    match file.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| Error::from_io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote output");
    Ok(())
}

/// Save every embedded image as `image{page}_{index}.{ext}` in `output_dir`.
///
/// Images that cannot be decoded are listed in [`Written::skipped`].
pub fn extract_images(source: &Path, output_dir: &Path) -> Result<Written> {
    let reader = PdfReader::open(source)?;
    let extraction = reader.extract_images()?;

    ensure_dir(output_dir)?;
    let mut outputs = Vec::with_capacity(extraction.images.len());
    for image in &extraction.images {
        let path = output_dir.join(image.file_name());
        write_file(&path, &image.data)?;
        outputs.push(path);
    }
    Ok(Written {
        outputs,
        skipped: extraction.skipped.iter().map(|s| s.note()).collect(),
    })
}

/// Write one DOCX paragraph per page
pub fn convert_to_docx(source: &Path, output_file: &Path) -> Result<Vec<PathBuf>> {
    let reader = PdfReader::open(source)?;
    let title = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut docx = DocxWriter::new().with_title(title);
    for (_, text) in reader.extract_all_text()? {
        docx.add_paragraph(&text);
    }

    ensure_parent(output_file)?;
    docx.save(output_file)?;
    tracing::debug!(
        path = %output_file.display(),
        paragraphs = docx.paragraph_count(),
        "wrote docx"
    );
    Ok(vec![output_file.to_path_buf()])
}

/// `"\n\nSeite {n}\n\n" + text`, the block written per page into text output
pub fn page_text_block(n: u32, text: &str) -> String {
    format!("\n\nSeite {}\n\n{}", n, text)
}

/// Write every page's text behind a `Seite {n}` header into a fresh text file
pub fn convert_to_txt(source: &Path, output_file: &Path) -> Result<Vec<PathBuf>> {
    let reader = PdfReader::open(source)?;
    // Extract everything first so a failing page leaves no half-written file
    let pages = reader.extract_all_text()?;

    ensure_parent(output_file)?;
    let file = File::create(output_file).map_err(|e| Error::from_io(output_file, e))?;
    let mut out = BufWriter::new(file);
    for (n, text) in &pages {
        out.write_all(page_text_block(*n, text).as_bytes())?;
    }
    out.flush()?;

    tracing::debug!(path = %output_file.display(), pages = pages.len(), "wrote text");
    Ok(vec![output_file.to_path_buf()])
}

/// Write each page as its own `Seite-{n}.pdf` in `output_dir`
pub fn split_files(source: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let resolved = resolve_path(source)?;
    let pages = QpdfWrapper::split_each_page(&resolved.data)?;

    ensure_dir(output_dir)?;
    let mut written = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        let path = output_dir.join(split_page_name(i as u32 + 1));
        write_file(&path, page)?;
        written.push(path);
    }
    Ok(written)
}

/// A merge failure, attributed to the input that caused it when known
#[derive(Debug)]
pub struct MergeFailure {
    /// Index of the offending input
    pub input: Option<usize>,
    pub error: Error,
}

impl From<Error> for MergeFailure {
    fn from(error: Error) -> Self {
        Self { input: None, error }
    }
}

/// Concatenate all pages of `sources`, in order, into `output`.
///
/// Returns the page count of the merged document.
pub fn merge_files(
    sources: &[PathBuf],
    output: &Path,
) -> std::result::Result<u32, MergeFailure> {
    if sources.is_empty() {
        return Err(Error::NoFilesSelected.into());
    }

    let mut inputs = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        let attribute = |error| MergeFailure {
            input: Some(i),
            error,
        };
        let resolved = resolve_path(source).map_err(attribute)?;
        QpdfWrapper::get_page_count(&resolved.data).map_err(attribute)?;
        inputs.push(resolved.data);
    }

    let refs: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();
    let merged = QpdfWrapper::merge(&refs)?;
    let page_count = QpdfWrapper::get_page_count(&merged)?;

    ensure_parent(output)?;
    write_file(output, &merged)?;
    Ok(page_count)
}
