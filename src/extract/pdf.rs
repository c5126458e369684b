//! PDF text extraction via `lopdf`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::document::DocumentRef;
use crate::extract::{ExtractError, TextExtractor};

/// Extracts the text of every page, in page order, with no separator
/// between pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Blocking extraction from a file on disk.
    pub fn extract_path(path: &Path) -> Result<String, ExtractError> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| ExtractError::unreadable(path.display(), e))?;

        let mut text = String::new();
        for page_number in doc.get_pages().keys() {
            let page_text = doc
                .extract_text(&[*page_number])
                .map_err(|e| ExtractError::unreadable(path.display(), format!("page {page_number}: {e}")))?;
            text.push_str(&page_text);
        }

        log::debug!("pdf: {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
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
