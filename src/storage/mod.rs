//! Local audio store with provenance sidecars.
//!
//! This module provides:
//! * [`LocalStore`] — copies audio into `<base>/<type>/<YYYY>/<MM>/` and writes
//!   a `.meta` sidecar next to it.
//! * [`FileInfo`] — the parsed sidecar.
//! * [`StoreError`] — I/O failures while storing.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use doc_to_audio::document::DocumentType;
//! use doc_to_audio::storage::LocalStore;
//!
//! let store = LocalStore::new("/tmp/audio_documents").unwrap();
//! let stored = store
//!     .save("report.mp3".as_ref(), Some("report.pdf"), Some(DocumentType::Pdf))
//!     .unwrap();
//! let info = store.get_file_info(&stored).unwrap();
//! println!("{info:?}");
//! ```

pub mod local;
pub mod metadata;

use std::path::Path;

use thiserror::Error;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use local::{LocalStore, AUDIO_EXTENSION};
pub use metadata::{sidecar_path, FileInfo};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
