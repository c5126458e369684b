//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\doc-to-audio\
//!   macOS:   ~/Library/Application Support/doc-to-audio/
//!   Linux:   ~/.config/doc-to-audio/
//!
//! Audio store (default, overridable in `settings.toml`):
//!   <Documents>/audio_documents/
//!
//! The Google client secrets and the cached OAuth token live in the current
//! working directory (`credentials.json`, `token.json`) unless configured
//! otherwise.

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default root of the local audio store.
    pub store_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "doc-to-audio";
    const STORE_DIR_NAME: &'static str = "audio_documents";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let documents_dir = dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
            .unwrap_or_else(|| PathBuf::from("."));

        let settings_file = config_dir.join("settings.toml");
        let store_dir = documents_dir.join(Self::STORE_DIR_NAME);

        Self {
            config_dir,
            settings_file,
            store_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
