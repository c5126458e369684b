//! Text extraction for PDF, DOCX and Google Docs inputs.
//!
//! This module provides:
//! * [`TextExtractor`] — async trait implemented by every extractor.
//! * [`PdfExtractor`] — page-ordered text via `lopdf`.
//! * [`DocxExtractor`] — paragraph text from `word/document.xml`.
//! * [`GoogleDocsExtractor`] — text runs fetched from the Docs API.
//! * [`Extractors`] — routes a [`DocumentRef`] to the extractor for its kind.
//! * [`ExtractError`] — error variants for extraction.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use doc_to_audio::document::DocumentRef;
//! use doc_to_audio::extract::{Extractors, TextExtractor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let extractors = Extractors::local_only();
//!     let text = extractors
//!         .extract(&DocumentRef::local("report.pdf"))
//!         .await
//!         .unwrap();
//!     println!("{text}");
//! }
//! ```

pub mod docx;
pub mod google_docs;
pub mod pdf;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::document::{DocumentKind, DocumentRef};

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use docx::DocxExtractor;
pub use google_docs::{google_doc_id_from_url, text_from_document_json, GoogleDocsExtractor};
pub use pdf::PdfExtractor;

/// Boxed cause carried by [`ExtractError::RemoteFetchFailed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

/// Errors that can occur while turning a document reference into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The local file is neither `.pdf` nor `.docx`.
    #[error("Unsupported file format: {0}. Please use PDF, DOCX, or a Google Docs URL.")]
    UnsupportedFormat(String),

    /// The remote reference does not contain a document id.
    #[error("Invalid Google Docs URL format: {0}")]
    InvalidReference(String),

    /// The URL points at another Google product (e.g. Sheets).
    #[error("This is a Google Sheets URL, not a Google Docs URL: {0}")]
    WrongDocumentKind(String),

    /// The file exists but could not be opened or parsed.
    #[error("cannot read document {path}: {reason}")]
    UnreadableDocument { path: String, reason: String },

    /// Authentication, transport or response-shape failure while fetching a
    /// remote document.
    #[error("fetching Google Doc {doc_id} failed: {source}")]
    RemoteFetchFailed {
        doc_id: String,
        #[source]
        source: BoxError,
    },
}

impl ExtractError {
    pub(crate) fn unreadable(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::UnreadableDocument {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn remote(doc_id: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::RemoteFetchFailed {
            doc_id: doc_id.into(),
            source: source.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TextExtractor trait
// ---------------------------------------------------------------------------

/// Async trait for turning a document into plain text.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn TextExtractor>`.  An empty document yields `Ok(String::new())`.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, reference: &DocumentRef) -> Result<String, ExtractError>;
}

// ---------------------------------------------------------------------------
// Extractors (router)
// ---------------------------------------------------------------------------

/// Routes each [`DocumentKind`] to one extractor implementation.
#[derive(Clone)]
pub struct Extractors {
    by_kind: HashMap<DocumentKind, Arc<dyn TextExtractor>>,
}

impl Extractors {
    /// PDF and DOCX only; remote references fail with
    /// [`ExtractError::RemoteFetchFailed`].
    pub fn local_only() -> Self {
        let mut by_kind: HashMap<DocumentKind, Arc<dyn TextExtractor>> = HashMap::new();
        by_kind.insert(DocumentKind::Pdf, Arc::new(PdfExtractor));
        by_kind.insert(DocumentKind::Docx, Arc::new(DocxExtractor));
        Self { by_kind }
    }

    /// Local extractors plus the given Google Docs extractor.
    pub fn new(google_docs: Arc<dyn TextExtractor>) -> Self {
        Self::local_only().with_extractor(DocumentKind::GoogleDoc, google_docs)
    }

    /// Replace the extractor used for `kind`.
    pub fn with_extractor(mut self, kind: DocumentKind, extractor: Arc<dyn TextExtractor>) -> Self {
        self.by_kind.insert(kind, extractor);
        self
    }
}

#[async_trait]
impl TextExtractor for Extractors {
    async fn extract(&self, reference: &DocumentRef) -> Result<String, ExtractError> {
        let kind = reference.kind()?;
        let extractor = self.by_kind.get(&kind).ok_or_else(|| {
            ExtractError::remote(
                reference.to_string(),
                "no Google Docs client configured",
            )
        })?;

        log::debug!("extract: {kind:?} from {reference}");
        extractor.extract(reference).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
