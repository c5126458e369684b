//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Settings for the local audio store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the store.  `None` means `<Documents>/audio_documents`.
    pub base_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The configured base directory, or the platform default from `paths`.
    pub fn resolve_base_dir(&self, paths: &AppPaths) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| paths.store_dir.clone())
    }
}

// ---------------------------------------------------------------------------
// TtsBackend
// ---------------------------------------------------------------------------

/// Selects which speech synthesis backend renders the audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TtsBackend {
    /// The public Google Translate speech endpoint (MP3, needs network).
    GoogleTranslate,
    /// A local program such as `espeak-ng` or `piper`.
    Command,
}

impl Default for TtsBackend {
    fn default() -> Self {
        Self::GoogleTranslate
    }
}

// ---------------------------------------------------------------------------
// CommandTtsConfig
// ---------------------------------------------------------------------------

/// External program used by [`TtsBackend::Command`].
///
/// `{output}` and `{language}` in `args` are substituted per call; the text
/// is written to the program's stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTtsConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandTtsConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".into(),
            args: vec![
                "-v".into(),
                "{language}".into(),
                "-w".into(),
                "{output}".into(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the speech synthesis step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Which backend to use.
    pub backend: TtsBackend,
    /// Default language code (ISO-639-1, optionally with region, e.g. `"en"`,
    /// `"pt-BR"`).
    pub language: String,
    /// Base URL of the translate speech endpoint.
    pub base_url: String,
    /// Maximum seconds to wait for each chunk request.
    pub timeout_secs: u64,
    /// Program settings for [`TtsBackend::Command`].
    pub command: CommandTtsConfig,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: TtsBackend::default(),
            language: "en".into(),
            base_url: "https://translate.google.com".into(),
            timeout_secs: 30,
            command: CommandTtsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// GoogleConfig
// ---------------------------------------------------------------------------

/// Settings for Google Docs fetches and Google Drive uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client secrets downloaded from the Cloud console.
    pub client_secrets_file: PathBuf,
    /// Cached credential, read on first use and rewritten after refresh.
    pub token_file: PathBuf,
    /// OAuth scopes requested by the installed-app flow.
    pub scopes: Vec<String>,
    /// Base URL of the Docs API.
    pub docs_base_url: String,
    /// Base URL of the Drive API (uploads go to `/upload/drive/v3/files`).
    pub drive_base_url: String,
    /// Maximum seconds to wait for an API response.
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_secrets_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            scopes: vec![
                "https://www.googleapis.com/auth/drive.file".into(),
                "https://www.googleapis.com/auth/documents.readonly".into(),
                "https://www.googleapis.com/auth/drive.readonly".into(),
            ],
            docs_base_url: "https://docs.googleapis.com".into(),
            drive_base_url: "https://www.googleapis.com".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use doc_to_audio::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Local store settings.
    pub storage: StorageConfig,
    /// Speech synthesis settings.
    pub tts: TtsConfig,
    /// Google Docs / Drive settings.
    pub google: GoogleConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
