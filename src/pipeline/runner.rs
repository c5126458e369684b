//! Pipeline orchestrator: document → text → speech → store → (upload).
//!
//! # Pipeline flow
//!
//! ```text
//! process(reference, options)
//!   ├─ upload requested without client → UploadClientNotConfigured
//!   ├─ reference.kind() + extractor.extract          [Extracting]
//!   ├─ synthesizer.synthesize → output or temp file  [Synthesizing]
//!   ├─ store.save(audio, reference, kind)            [Storing]
//!   └─ uploader.upload(stored, basename)             [Uploading]
//!        └─▶ PipelineResult                          [Done]
//! any error ──▶ [Failed(kind)], files written by the run removed, no result
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tempfile::TempDir;
use thiserror::Error;

use crate::document::{DocumentKind, DocumentRef};
use crate::extract::google_docs::document_id;
use crate::extract::{ExtractError, TextExtractor};
use crate::remote::{AuthError, RemoteError, UploadClient};
use crate::storage::local::same_file;
use crate::storage::{sidecar_path, FileInfo, LocalStore, StoreError};
use crate::tts::{SpeechSynthesizer, SynthesisError};

use super::state::{ErrorKind, PipelineStage, StageObserver};

pub const DEFAULT_LANGUAGE: &str = "en";

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Terminal failure of one run.  Use [`kind`](Self::kind) to inspect it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnsupportedFormat(ExtractError),

    #[error(transparent)]
    InvalidReference(ExtractError),

    #[error(transparent)]
    WrongDocumentKind(ExtractError),

    #[error(transparent)]
    UnreadableDocument(ExtractError),

    #[error(transparent)]
    RemoteFetchFailed(ExtractError),

    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(#[from] SynthesisError),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[source] AuthError),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("remote upload was requested but no upload client is configured")]
    UploadClientNotConfigured,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::InvalidReference(_) => ErrorKind::InvalidReference,
            Self::WrongDocumentKind(_) => ErrorKind::WrongDocumentKind,
            Self::UnreadableDocument(_) => ErrorKind::UnreadableDocument,
            Self::RemoteFetchFailed(_) => ErrorKind::RemoteFetchFailed,
            Self::SynthesisFailed(_) => ErrorKind::SynthesisFailed,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Self::UploadFailed(_) => ErrorKind::UploadFailed,
            Self::UploadClientNotConfigured => ErrorKind::UploadClientNotConfigured,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(_) => Self::UnsupportedFormat(e),
            ExtractError::InvalidReference(_) => Self::InvalidReference(e),
            ExtractError::WrongDocumentKind(_) => Self::WrongDocumentKind(e),
            ExtractError::UnreadableDocument { .. } => Self::UnreadableDocument(e),
            ExtractError::RemoteFetchFailed { .. } => Self::RemoteFetchFailed(e),
        }
    }
}

impl From<RemoteError> for PipelineError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::AuthenticationFailed(auth) => Self::AuthenticationFailed(auth),
            RemoteError::UploadFailed(msg) => Self::UploadFailed(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessOptions / PipelineResult
// ---------------------------------------------------------------------------

/// Per-run options for [`PipelineOrchestrator::process`].
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Where the synthesizer writes.  `None` uses a temporary file with a
    /// name derived from the reference, removed once stored.
    pub output_path: Option<PathBuf>,
    /// Speech language code.
    pub language: String,
    /// Upload the stored file after saving.
    pub remote_upload: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            output_path: None,
            language: DEFAULT_LANGUAGE.into(),
            remote_upload: false,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub stored_audio_path: PathBuf,
    pub reference: DocumentRef,
    pub metadata: FileInfo,
    pub remote_file_id: Option<String>,
    /// The caller-supplied output file, kept after the run.
    pub output_path: Option<PathBuf>,
}

/// Name of the synthesized file when the caller gives no output path:
/// `<stem>_<YYYYmmdd_HHMMSS>.mp3`, or `google_doc_<id>_<…>.mp3` for remote
/// documents.
pub fn derive_output_name(
    reference: &DocumentRef,
    now: NaiveDateTime,
) -> Result<String, ExtractError> {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match reference {
        DocumentRef::LocalPath(path) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "audio".into());
            Ok(format!("{stem}_{stamp}.mp3"))
        }
        DocumentRef::RemoteDoc(_) => {
            let id = document_id(reference)?;
            Ok(format!("google_doc_{id}_{stamp}.mp3"))
        }
    }
}

// ---------------------------------------------------------------------------
// Scratch files
// ---------------------------------------------------------------------------

/// Files written by one run.  The temp dir always goes; the rest only when
/// the run fails.
#[derive(Default)]
struct Scratch {
    temp_dir: Option<TempDir>,
    /// Caller output that did not exist before the run.
    created_output: Option<PathBuf>,
    /// Store entry (audio and sidecar) written by the run.
    stored: Vec<PathBuf>,
}

impl Scratch {
    fn finish(self, succeeded: bool) {
        if let Some(dir) = self.temp_dir {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("pipeline: could not remove {} ({e})", path.display());
            }
        }

        if succeeded {
            return;
        }
        for path in self.created_output.iter().chain(&self.stored) {
            discard(path);
        }
    }
}

fn discard(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("pipeline: removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("pipeline: could not remove {} ({e})", path.display()),
    }
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Runs documents through extraction, synthesis, storage and optional
/// upload.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use doc_to_audio::config::TtsConfig;
/// use doc_to_audio::document::DocumentRef;
/// use doc_to_audio::extract::Extractors;
/// use doc_to_audio::pipeline::{PipelineOrchestrator, ProcessOptions};
/// use doc_to_audio::storage::LocalStore;
/// use doc_to_audio::tts;
///
/// # async fn example() {
/// let orchestrator = PipelineOrchestrator::new(
///     Arc::new(Extractors::local_only()),
///     tts::from_config(&TtsConfig::default()),
///     LocalStore::new("/tmp/audio_documents").unwrap(),
/// );
/// let result = orchestrator
///     .process(&DocumentRef::local("report.pdf"), &ProcessOptions::default())
///     .await
///     .unwrap();
/// println!("{}", result.stored_audio_path.display());
/// # }
/// ```
pub struct PipelineOrchestrator {
    extractor: Arc<dyn TextExtractor>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: LocalStore,
    uploader: Option<Arc<dyn UploadClient>>,
    observers: Vec<Arc<dyn StageObserver>>,
}

impl PipelineOrchestrator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: LocalStore,
    ) -> Self {
        Self {
            extractor,
            synthesizer,
            store,
            uploader: None,
            observers: Vec::new(),
        }
    }

    pub fn with_upload_client(mut self, uploader: Arc<dyn UploadClient>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Convert one document.  Either every requested stage succeeds and a
    /// result is returned, or the run fails with no result.
    pub async fn process(
        &self,
        reference: &DocumentRef,
        options: &ProcessOptions,
    ) -> Result<PipelineResult, PipelineError> {
        if options.remote_upload && self.uploader.is_none() {
            let err = PipelineError::UploadClientNotConfigured;
            self.fail(reference, &err);
            return Err(err);
        }

        let mut scratch = Scratch::default();
        let outcome = self.run_stages(reference, options, &mut scratch).await;
        scratch.finish(outcome.is_ok());

        match outcome {
            Ok(result) => {
                self.notify(reference, PipelineStage::Done);
                log::info!(
                    "pipeline: {reference} -> {}",
                    result.stored_audio_path.display()
                );
                Ok(result)
            }
            Err(e) => {
                self.fail(reference, &e);
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    async fn run_stages(
        &self,
        reference: &DocumentRef,
        options: &ProcessOptions,
        scratch: &mut Scratch,
    ) -> Result<PipelineResult, PipelineError> {
        // ── 1. Extract ────────────────────────────────────────────────────
        self.notify(reference, PipelineStage::Extracting);
        let kind: DocumentKind = reference.kind()?;
        let text = self.extractor.extract(reference).await?;
        log::debug!("pipeline: extracted {} chars", text.chars().count());

        // ── 2. Synthesize ─────────────────────────────────────────────────
        self.notify(reference, PipelineStage::Synthesizing);
        let target = match &options.output_path {
            Some(path) => {
                if !path.exists() {
                    scratch.created_output = Some(path.clone());
                }
                path.clone()
            }
            None => {
                let name = derive_output_name(reference, Local::now().naive_local())?;
                let dir = tempfile::tempdir()
                    .map_err(|e| StoreError::io(&std::env::temp_dir(), e))?;
                let path = dir.path().join(name);
                scratch.temp_dir = Some(dir);
                path
            }
        };
        let audio = self
            .synthesizer
            .synthesize(&text, &target, &options.language)
            .await?;

        // ── 3. Store ──────────────────────────────────────────────────────
        self.notify(reference, PipelineStage::Storing);
        let original = reference.to_string();
        let stored = self
            .store
            .save(&audio, Some(&original), Some(kind.document_type()))?;
        scratch.stored.push(sidecar_path(&stored));
        // Output written straight into the store follows the caller-output rules.
        let in_place = options
            .output_path
            .as_deref()
            .is_some_and(|output| same_file(output, &stored));
        if !in_place {
            scratch.stored.push(stored.clone());
        }
        let metadata = self.store.get_file_info(&stored)?.unwrap_or_default();

        // ── 4. Upload ─────────────────────────────────────────────────────
        let remote_file_id = match (&self.uploader, options.remote_upload) {
            (Some(uploader), true) => {
                self.notify(reference, PipelineStage::Uploading);
                let name = display_name(&stored);
                Some(uploader.upload(&stored, &name).await?)
            }
            _ => None,
        };

        Ok(PipelineResult {
            stored_audio_path: stored,
            reference: reference.clone(),
            metadata,
            remote_file_id,
            output_path: options.output_path.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn notify(&self, reference: &DocumentRef, stage: PipelineStage) {
        log::debug!("pipeline: {reference} → {}", stage.label());
        for observer in &self.observers {
            observer.on_stage(reference, stage);
        }
    }

    fn fail(&self, reference: &DocumentRef, error: &PipelineError) {
        log::error!("pipeline: {reference} failed: {error}");
        self.notify(reference, PipelineStage::Failed(error.kind()));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.mp3".into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
