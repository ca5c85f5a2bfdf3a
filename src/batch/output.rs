//! Output naming policy
//!
//! Every per-file operation writes under `{parent}/{stem}-output/`:
//!
//! | operation        | target                                   |
//! |------------------|------------------------------------------|
//! | convert to DOCX  | `{stem}-output/{stem}.docx`              |
//! | convert to text  | `{stem}-output/{stem}.txt`               |
//! | extract images   | `{stem}-output/images/`                  |
//! | split            | `{stem}-output/einzelne-seiten/`         |
//!
//! Merge writes `{parent of first file}/{name}.pdf`.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

pub const IMAGES_DIR: &str = "images";
pub const PAGES_DIR: &str = "einzelne-seiten";

/// One of the five batch operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ExtractImages,
    ConvertToDocx,
    ConvertToTxt,
    SplitFiles,
    MergeFiles,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ExtractImages => "extract_images",
            OperationKind::ConvertToDocx => "convert_to_docx",
            OperationKind::ConvertToTxt => "convert_to_txt",
            OperationKind::SplitFiles => "split_files",
            OperationKind::MergeFiles => "merge_files",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{stem}{suffix}`, keeping non-UTF-8 stems intact
fn stem_with(source: &Path, suffix: &str) -> Result<OsString> {
    let mut name = source
        .file_stem()
        .map(OsStr::to_os_string)
        .ok_or_else(|| Error::InvalidInput {
            reason: format!("{} has no file name", source.display()),
        })?;
    name.push(suffix);
    Ok(name)
}

fn parent_of(source: &Path) -> PathBuf {
    source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// `{parent}/{stem}-output`
pub fn output_dir(source: &Path) -> Result<PathBuf> {
    Ok(parent_of(source).join(stem_with(source, "-output")?))
}

/// Output file (docx, text) or directory (images, split) for a source file
pub fn output_path(source: &Path, kind: OperationKind) -> Result<PathBuf> {
    let dir = output_dir(source)?;
    match kind {
        OperationKind::ConvertToDocx => Ok(dir.join(stem_with(source, ".docx")?)),
        OperationKind::ConvertToTxt => Ok(dir.join(stem_with(source, ".txt")?)),
        OperationKind::ExtractImages => Ok(dir.join(IMAGES_DIR)),
        OperationKind::SplitFiles => Ok(dir.join(PAGES_DIR)),
        OperationKind::MergeFiles => Err(Error::InvalidInput {
            reason: "merge output is named by the user, see merge_output_path".to_string(),
        }),
    }
}

/// File name of page `n` (1-indexed) in the split directory
pub fn split_page_name(n: u32) -> String {
    format!("Seite-{}.pdf", n)
}

/// Check a user-supplied merge name and return it without a `.pdf` suffix
pub fn validate_output_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    let base = match trimmed.len().checked_sub(4) {
        Some(cut) if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(".pdf") => {
            &trimmed[..cut]
        }
        _ => trimmed,
    };

    let invalid = base.is_empty()
        || base == "."
        || base == ".."
        || base.contains(['/', '\\', '\0']);
    if invalid {
        return Err(Error::InvalidOutputName {
            name: name.to_string(),
        });
    }
    Ok(base.to_string())
}

/// `{parent of first file}/{name}.pdf`
pub fn merge_output_path(first_source: &Path, name: &str) -> Result<PathBuf> {
    let base = validate_output_name(name)?;
    Ok(parent_of(first_source).join(format!("{}.pdf", base)))
}
