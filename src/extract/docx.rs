//! DOCX text extraction.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`.
//! Only body-level paragraphs are collected (paragraphs inside tables and
//! text boxes are skipped), each reduced to the text of its runs, and the
//! paragraphs are joined with a single space.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::document::DocumentRef;
use crate::extract::{ExtractError, TextExtractor};

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    /// Blocking extraction from a file on disk.
    pub fn extract_path(path: &Path) -> Result<String, ExtractError> {
        let unreadable = |e: &dyn std::fmt::Display| ExtractError::unreadable(path.display(), e);

        let file = File::open(path).map_err(|e| unreadable(&e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| unreadable(&e))?;
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| unreadable(&e))?;

        let mut xml = String::new();
        part.read_to_string(&mut xml).map_err(|e| unreadable(&e))?;

        let paragraphs = paragraphs_from_xml(&xml).map_err(|e| unreadable(&e))?;
        log::debug!("docx: {} paragraphs from {}", paragraphs.len(), path.display());
        Ok(paragraphs.join(" "))
    }
}

/// Text of every body-level `w:p` in `document.xml`, in document order.
///
/// `w:t` contributes its text, `w:tab` a tab and `w:br` / `w:cr` a newline.
pub fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut table_depth = 0usize;
    let mut para_depth = 0usize;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let top_level = table_depth == 0 && para_depth == 1;
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" => {
                    para_depth += 1;
                    if table_depth == 0 && para_depth == 1 {
                        current.clear();
                    }
                }
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" if table_depth == 0 && para_depth == 0 => paragraphs.push(String::new()),
                b"tab" if in_run && top_level => current.push('\t'),
                b"br" | b"cr" if in_run && top_level => current.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"p" => {
                    if top_level {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    para_depth = para_depth.saturating_sub(1);
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text && top_level => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract(&self, reference: &DocumentRef) -> Result<String, ExtractError> {
        let path: PathBuf = reference
            .as_path()
            .ok_or_else(|| ExtractError::UnsupportedFormat(reference.to_string()))?
            .to_path_buf();

        let display = path.display().to_string();
        tokio::task::spawn_blocking(move || Self::extract_path(&path))
            .await
            .map_err(|e| ExtractError::unreadable(display, e))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
