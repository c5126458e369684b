//! Pipeline orchestrator for document-to-audio conversion.
//!
//! This module wires extraction, speech synthesis, local storage and the
//! optional remote upload into one linear run, and reports each stage to
//! registered observers.
//!
//! # Architecture
//!
//! ```text
//! DocumentRef
//!        │
//!        ▼
//! PipelineOrchestrator::process()
//!        │
//!        ├─ TextExtractor::extract        → Extracting
//!        ├─ SpeechSynthesizer::synthesize → Synthesizing
//!        ├─ LocalStore::save              → Storing
//!        └─ UploadClient::upload          → Uploading (only if requested)
//!
//! StageObserver::on_stage ←─── every transition, including Failed(kind)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doc_to_audio::config::AppConfig;
//! use doc_to_audio::document::DocumentRef;
//! use doc_to_audio::extract::Extractors;
//! use doc_to_audio::pipeline::{PipelineOrchestrator, ProcessOptions, StageHistory};
//! use doc_to_audio::storage::LocalStore;
//! use doc_to_audio::tts;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let history = Arc::new(StageHistory::new());
//!     let orchestrator = PipelineOrchestrator::new(
//!         Arc::new(Extractors::local_only()),
//!         tts::from_config(&config.tts),
//!         LocalStore::new("/tmp/audio_documents").unwrap(),
//!     )
//!     .with_observer(history.clone());
//!
//!     let result = orchestrator
//!         .process(&DocumentRef::local("notes.docx"), &ProcessOptions::default())
//!         .await
//!         .unwrap();
//!     println!("{} ({:?})", result.stored_audio_path.display(), history.stages());
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    derive_output_name, PipelineError, PipelineOrchestrator, PipelineResult, ProcessOptions,
    DEFAULT_LANGUAGE,
};
pub use state::{ErrorKind, PipelineStage, StageHistory, StageObserver};
