//! Remote collaborators: OAuth credentials and Google Drive uploads.
//!
//! This module provides:
//! * [`CredentialProvider`] — async trait yielding bearer tokens, with an
//!   explicit `refresh()`.
//! * [`FileCredentialProvider`] — cached `token.json` + installed-app flow.
//! * [`StaticCredentialProvider`] — in-memory token.
//! * [`InstalledAppFlow`] — loopback OAuth consent flow.
//! * [`UploadClient`] / [`DriveUploader`] — upload a local file, get its id.
//! * [`RemoteError`] / [`AuthError`] — error variants.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doc_to_audio::config::AppConfig;
//! use doc_to_audio::remote::{DriveUploader, FileCredentialProvider, UploadClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let credentials = Arc::new(FileCredentialProvider::from_config(&config.google));
//!     let uploader = DriveUploader::from_config(&config.google, credentials);
//!
//!     let id = uploader
//!         .upload("report.mp3".as_ref(), "report.mp3")
//!         .await
//!         .unwrap();
//!     println!("uploaded as {id}");
//! }
//! ```

pub mod auth;
pub mod drive;
pub mod flow;

#[cfg(test)]
pub(crate) mod canned;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use auth::{
    AuthError, ClientSecrets, CredentialProvider, FileCredentialProvider, OAuthToken,
    StaticCredentialProvider,
};
pub use drive::DriveUploader;
pub use flow::InstalledAppFlow;

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Errors surfaced by an [`UploadClient`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No usable credential could be obtained.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[from] AuthError),

    /// Authentication succeeded but the upload itself failed.
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

// ---------------------------------------------------------------------------
// UploadClient trait
// ---------------------------------------------------------------------------

/// Uploads a local file to a remote store and returns its remote id.
#[async_trait]
pub trait UploadClient: Send + Sync {
    async fn upload(&self, local_path: &Path, display_name: &str) -> Result<String, RemoteError>;
}
