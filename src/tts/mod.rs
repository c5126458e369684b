//! Speech synthesis: text in, audio file out.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │             SpeechSynthesizer (trait)                │
//! │                                                      │
//! │   ┌────────────────────┐    ┌──────────────────┐     │
//! │   │ GoogleTranslateTts │    │    CommandTts    │     │
//! │   │ - LANGUAGES check  │    │ - program + args │     │
//! │   │ - ≤100-char chunks │    │ - text on stdin  │     │
//! │   └─────────┬──────────┘    └────────┬─────────┘     │
//! │             └────────────┬───────────┘               │
//! │                          ▼                           │
//! │              synthesize(text, output, lang)          │
//! │                  → path of the audio file            │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use doc_to_audio::config::TtsConfig;
//! use doc_to_audio::tts;
//!
//! #[tokio::main]
//! async fn main() {
//!     let synthesizer = tts::from_config(&TtsConfig::default());
//!     let path = synthesizer
//!         .synthesize("Hello there.", "hello.mp3".as_ref(), "en")
//!         .await
//!         .unwrap();
//!     println!("wrote {}", path.display());
//! }
//! ```

pub mod command;
pub mod google_translate;
pub mod languages;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{TtsBackend, TtsConfig};

// ── Public re-exports ──────────────────────────────────────────────────────

pub use command::CommandTts;
pub use google_translate::{split_chunks, GoogleTranslateTts, MAX_CHUNK_CHARS};
pub use languages::{find_language, Language, LANGUAGES};

#[cfg(test)]
pub use mock::MockSynthesizer;

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// Empty or whitespace-only input.
    #[error("no text to speak")]
    EmptyText,

    /// The backend does not know the language code.
    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    /// HTTP transport or status failure.
    #[error("speech request failed: {0}")]
    Request(String),

    /// The external synthesis program failed.
    #[error("synthesis command failed: {0}")]
    Command(String),

    /// Writing the output file failed.
    #[error("cannot write audio to {path}: {reason}")]
    Io { path: String, reason: String },
}

impl SynthesisError {
    pub(crate) fn io(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Renders text as speech into an audio file.
///
/// On success the returned path points at a non-empty file (normally
/// `output` itself).  Output bytes are not deterministic across runs.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        output: &Path,
        language: &str,
    ) -> Result<PathBuf, SynthesisError>;
}

/// Build the synthesizer selected in `config`.
pub fn from_config(config: &TtsConfig) -> Arc<dyn SpeechSynthesizer> {
    match config.backend {
        TtsBackend::GoogleTranslate => Arc::new(GoogleTranslateTts::from_config(config)),
        TtsBackend::Command => Arc::new(CommandTts::new(
            config.command.program.clone(),
            config.command.args.clone(),
        )),
    }
}

/// Create the parent directory of `output` if it does not exist yet.
pub(crate) async fn ensure_parent(output: &Path) -> Result<(), SynthesisError> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SynthesisError::io(output, e)),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod mock {
    use super::*;

    /// Writes fixed bytes instead of speech, or fails with a preset error.
    pub struct MockSynthesizer {
        response: Result<Vec<u8>, SynthesisError>,
    }

    impl MockSynthesizer {
        pub fn ok() -> Self {
            Self {
                response: Ok(b"ID3\x03\x00mock-audio".to_vec()),
            }
        }

        pub fn err(error: SynthesisError) -> Self {
            Self {
                response: Err(error),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for MockSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            output: &Path,
            _language: &str,
        ) -> Result<PathBuf, SynthesisError> {
            if text.trim().is_empty() {
                return Err(SynthesisError::EmptyText);
            }
            let bytes = self.response.clone()?;
            ensure_parent(output).await?;
            tokio::fs::write(output, bytes)
                .await
                .map_err(|e| SynthesisError::io(output, e))?;
            Ok(output.to_path_buf())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
