//! Minimal DOCX writer
//!
//! A DOCX file is a ZIP archive of Open XML parts. We emit the smallest set of
//! parts Word and LibreOffice accept: content types, package relationships,
//! core properties and `word/document.xml` with one `<w:p>` per paragraph.

use crate::error::{Error, Result};
use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#;

/// Builder for a text-only DOCX document
#[derive(Debug, Default)]
pub struct DocxWriter {
    title: Option<String>,
    paragraphs: Vec<String>,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append one paragraph. Newlines become line breaks, tabs become tabs.
    pub fn add_paragraph(&mut self, text: &str) {
        self.paragraphs.push(text.to_string());
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Serialize the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(DOCUMENT_RELS.as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(self.core_xml().as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.document_xml().as_bytes())?;

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| Error::from_io(path, e))
    }

    fn core_xml(&self) -> String {
        let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let title = self
            .title
            .as_deref()
            .map(|t| format!("<dc:title>{}</dc:title>", escape(&sanitize(t))))
            .unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">{}<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created></cp:coreProperties>"#,
            title, created
        )
    }

    fn document_xml(&self) -> String {
        let mut body = String::new();
        for text in &self.paragraphs {
            body.push_str(&paragraph_xml(text));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }
}

fn paragraph_xml(text: &str) -> String {
    let text = sanitize(text);
    if text.is_empty() {
        return "<w:p/>".to_string();
    }

    let mut run = String::new();
    let mut pending = String::new();
    let flush = |run: &mut String, pending: &mut String| {
        if !pending.is_empty() {
            run.push_str(r#"<w:t xml:space="preserve">"#);
            run.push_str(&escape(pending.as_str()));
            run.push_str("</w:t>");
            pending.clear();
        }
    };

    for ch in text.chars() {
        match ch {
            '\n' => {
                flush(&mut run, &mut pending);
                run.push_str("<w:br/>");
            }
            '\t' => {
                flush(&mut run, &mut pending);
                run.push_str("<w:tab/>");
            }
            '\r' => {}
            other => pending.push(other),
        }
    }
    flush(&mut run, &mut pending);

    format!("<w:p><w:r>{}</w:r></w:p>", run)
}

/// Drop characters that are not allowed in XML 1.0
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}
