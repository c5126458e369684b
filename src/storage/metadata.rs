//! The `.meta` sidecar written next to every stored audio file.
//!
//! The format is three `Key: Value` lines:
//!
//! ```text
//! Original Document: reports/q3.pdf
//! Creation Date: 2024-05-01T09:30:00.000000
//! Document Type: pdf
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::document::DocumentType;

pub const SIDECAR_EXTENSION: &str = "meta";

pub const KEY_ORIGINAL_DOCUMENT: &str = "Original Document";
pub const KEY_CREATION_DATE: &str = "Creation Date";
pub const KEY_DOCUMENT_TYPE: &str = "Document Type";

/// Written for `Original Document` when the source is unknown.
pub const NO_REFERENCE: &str = "None";

const CREATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// `<audio path>.meta`
pub fn sidecar_path(audio: &Path) -> PathBuf {
    let mut name = audio.as_os_str().to_os_string();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// FileInfo
// ---------------------------------------------------------------------------

/// Parsed sidecar: keys and values in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    entries: Vec<(String, String)>,
}

impl FileInfo {
    /// Sidecar content for a freshly stored file.
    pub fn new(
        original_reference: Option<&str>,
        created: NaiveDateTime,
        document_type: DocumentType,
    ) -> Self {
        Self {
            entries: vec![
                (
                    KEY_ORIGINAL_DOCUMENT.into(),
                    original_reference.unwrap_or(NO_REFERENCE).into(),
                ),
                (
                    KEY_CREATION_DATE.into(),
                    created.format(CREATION_DATE_FORMAT).to_string(),
                ),
                (KEY_DOCUMENT_TYPE.into(), document_type.as_str().into()),
            ],
        }
    }

    /// Parse sidecar text.  Each line is split on its first `": "`; lines
    /// without one are skipped.  A repeated key keeps its last value.
    pub fn parse(text: &str) -> Self {
        let mut info = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if let Some((key, value)) = line.split_once(": ") {
                info.insert(key, value);
            }
        }
        info
    }

    /// Render as newline-terminated `Key: Value` lines.
    pub fn to_sidecar_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}: {v}\n"))
            .collect()
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The original reference, or `None` when it was recorded as unknown.
    pub fn original_document(&self) -> Option<&str> {
        self.get(KEY_ORIGINAL_DOCUMENT).filter(|v| *v != NO_REFERENCE)
    }

    pub fn creation_date(&self) -> Option<NaiveDateTime> {
        let raw = self.get(KEY_CREATION_DATE)?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        self.get(KEY_DOCUMENT_TYPE)?.parse().ok()
    }
}
