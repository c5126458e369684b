//! Document references and the document categories derived from them.
//!
//! A [`DocumentRef`] is resolved exactly once at the entry point; from then on
//! every stage dispatches on [`DocumentKind`] instead of re-inspecting file
//! extensions or URL shapes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::extract::google_docs::{DOCUMENT_MARKER, SPREADSHEET_MARKER};
use crate::extract::ExtractError;

// ---------------------------------------------------------------------------
// DocumentRef
// ---------------------------------------------------------------------------

/// Path fragments that mark an input as a Google document URL.
const REMOTE_MARKERS: [&str; 2] = [DOCUMENT_MARKER, SPREADSHEET_MARKER];

/// Caller-supplied pointer to the content to convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentRef {
    /// A file on the local filesystem (`.pdf` or `.docx`).
    LocalPath(PathBuf),
    /// A Google Docs URL or a bare document id.
    RemoteDoc(String),
}

impl DocumentRef {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::LocalPath(path.into())
    }

    pub fn remote(url_or_id: impl Into<String>) -> Self {
        Self::RemoteDoc(url_or_id.into())
    }

    /// Resolve raw user input into a reference.
    ///
    /// `http://` / `https://` inputs and anything containing a Google
    /// `/document/d/` or `/spreadsheets/d/` path are remote; everything else
    /// is a local path unless `force_remote` is set.
    ///
    /// ```
    /// use doc_to_audio::document::DocumentRef;
    ///
    /// assert!(matches!(
    ///     DocumentRef::resolve("https://docs.google.com/document/d/abc/edit", false),
    ///     DocumentRef::RemoteDoc(_)
    /// ));
    /// assert!(matches!(DocumentRef::resolve("report.pdf", false), DocumentRef::LocalPath(_)));
    /// assert!(matches!(DocumentRef::resolve("abc123", true), DocumentRef::RemoteDoc(_)));
    /// assert!(matches!(
    ///     DocumentRef::resolve("docs.google.com/document/d/abc/edit", false),
    ///     DocumentRef::RemoteDoc(_)
    /// ));
    /// ```
    pub fn resolve(input: &str, force_remote: bool) -> Self {
        let lower = input.trim_start().to_ascii_lowercase();
        let remote = force_remote
            || lower.starts_with("http://")
            || lower.starts_with("https://")
            || REMOTE_MARKERS.iter().any(|m| input.contains(m));
        if remote {
            Self::RemoteDoc(input.trim().to_string())
        } else {
            Self::LocalPath(PathBuf::from(input))
        }
    }

    /// Classify the reference.
    ///
    /// Local files must end in `.pdf` or `.docx` (case-insensitive); anything
    /// else is [`ExtractError::UnsupportedFormat`].
    pub fn kind(&self) -> Result<DocumentKind, ExtractError> {
        match self {
            Self::LocalPath(path) => match lower_extension(path).as_deref() {
                Some("pdf") => Ok(DocumentKind::Pdf),
                Some("docx") => Ok(DocumentKind::Docx),
                _ => Err(ExtractError::UnsupportedFormat(path.display().to_string())),
            },
            Self::RemoteDoc(_) => Ok(DocumentKind::GoogleDoc),
        }
    }

    /// The local path, if this is a [`DocumentRef::LocalPath`].
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::LocalPath(path) => Some(path),
            Self::RemoteDoc(_) => None,
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::RemoteDoc(url) => f.write_str(url),
        }
    }
}

fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// DocumentKind
// ---------------------------------------------------------------------------

/// Input formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Docx,
    GoogleDoc,
}

impl DocumentKind {
    /// The store category for documents of this kind.
    pub fn document_type(self) -> DocumentType {
        match self {
            Self::Pdf => DocumentType::Pdf,
            Self::Docx => DocumentType::Docx,
            Self::GoogleDoc => DocumentType::GoogleDocs,
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentType
// ---------------------------------------------------------------------------

/// Top-level category directory of the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Docx,
    GoogleDocs,
    Other,
}

impl DocumentType {
    /// Every category, in directory-creation order.
    pub const ALL: [DocumentType; 4] = [Self::Pdf, Self::Docx, Self::GoogleDocs, Self::Other];

    /// Directory name and sidecar value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::GoogleDocs => "google_docs",
            Self::Other => "other",
        }
    }

    /// Infer the category from a reference's file extension.
    ///
    /// ```
    /// use doc_to_audio::document::DocumentType;
    ///
    /// assert_eq!(DocumentType::from_reference("a/b/Report.PDF"), DocumentType::Pdf);
    /// assert_eq!(DocumentType::from_reference("notes.docx"), DocumentType::Docx);
    /// assert_eq!(DocumentType::from_reference("notes.odt"), DocumentType::Other);
    /// ```
    pub fn from_reference(reference: &str) -> Self {
        match lower_extension(Path::new(reference)).as_deref() {
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!("unknown document type {s:?} (expected pdf, docx, google_docs or other)")
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_extensions_are_case_insensitive() {
        assert_eq!(DocumentRef::local("A.PDF").kind().unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentRef::local("b.DocX").kind().unwrap(), DocumentKind::Docx);
    }

    #[test]
    fn unknown_local_extension_is_unsupported() {
        let err = DocumentRef::local("invalid.txt").kind().unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));

        let err = DocumentRef::local("no_extension").kind().unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn remote_reference_is_google_doc() {
        let reference = DocumentRef::resolve("https://invalid-url.com", false);
        assert_eq!(reference.kind().unwrap(), DocumentKind::GoogleDoc);
        assert!(reference.as_path().is_none());
    }

    #[test]
    fn scheme_less_docs_url_is_remote() {
        let reference = DocumentRef::resolve("docs.google.com/document/d/abc123/edit", false);
        assert_eq!(reference, DocumentRef::remote("docs.google.com/document/d/abc123/edit"));
        assert_eq!(reference.kind().unwrap(), DocumentKind::GoogleDoc);

        let sheet = DocumentRef::resolve("docs.google.com/spreadsheets/d/1/edit", false);
        assert!(matches!(sheet, DocumentRef::RemoteDoc(_)));

        assert!(matches!(
            DocumentRef::resolve("notes/document/report.pdf", false),
            DocumentRef::LocalPath(_)
        ));
    }

    #[test]
    fn kind_maps_to_store_category() {
        assert_eq!(DocumentKind::Pdf.document_type(), DocumentType::Pdf);
        assert_eq!(DocumentKind::Docx.document_type(), DocumentType::Docx);
        assert_eq!(DocumentKind::GoogleDoc.document_type(), DocumentType::GoogleDocs);
    }

    #[test]
    fn document_type_parses_its_own_names() {
        for t in DocumentType::ALL {
            assert_eq!(t.as_str().parse::<DocumentType>().unwrap(), t);
        }
        assert!("spreadsheet".parse::<DocumentType>().is_err());
    }

    #[test]
    fn display_round_trips_input() {
        assert_eq!(DocumentRef::local("dir/a.pdf").to_string(), "dir/a.pdf");
        assert_eq!(DocumentRef::remote("abc").to_string(), "abc");
    }
}
