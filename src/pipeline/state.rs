//! Pipeline stages and the observers that watch them.
//!
//! [`PipelineStage`] is the orchestrator's state machine.  Every transition
//! is reported to each registered [`StageObserver`]; [`StageHistory`] is a
//! ready-made observer that records them.

use std::sync::Mutex;

use crate::document::DocumentRef;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Inspectable category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    InvalidReference,
    WrongDocumentKind,
    UnreadableDocument,
    RemoteFetchFailed,
    SynthesisFailed,
    AuthenticationFailed,
    UploadFailed,
    UploadClientNotConfigured,
    Storage,
}

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// States of one conversion run.
///
/// ```text
/// Idle ──▶ Extracting ──▶ Synthesizing ──▶ Storing ──┬──▶ Done
///                                                    └──▶ Uploading ──▶ Done
/// any stage ──error──▶ Failed(kind)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    /// Nothing has started yet.
    #[default]
    Idle,
    /// Reading text out of the document.
    Extracting,
    /// Rendering the text as speech.
    Synthesizing,
    /// Copying the audio into the local store.
    Storing,
    /// Sending the stored file to the remote service.
    Uploading,
    Done,
    Failed(ErrorKind),
}

impl PipelineStage {
    /// ```
    /// use doc_to_audio::pipeline::{ErrorKind, PipelineStage};
    ///
    /// assert!(!PipelineStage::Idle.is_busy());
    /// assert!(PipelineStage::Extracting.is_busy());
    /// assert!(PipelineStage::Uploading.is_busy());
    /// assert!(!PipelineStage::Done.is_busy());
    /// assert!(!PipelineStage::Failed(ErrorKind::UploadFailed).is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineStage::Extracting
                | PipelineStage::Synthesizing
                | PipelineStage::Storing
                | PipelineStage::Uploading
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed(_))
    }

    /// A short human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::Extracting => "Extracting text",
            PipelineStage::Synthesizing => "Synthesizing speech",
            PipelineStage::Storing => "Storing audio",
            PipelineStage::Uploading => "Uploading",
            PipelineStage::Done => "Done",
            PipelineStage::Failed(_) => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// StageObserver
// ---------------------------------------------------------------------------

/// Receives every stage transition of a run.
pub trait StageObserver: Send + Sync {
    fn on_stage(&self, reference: &DocumentRef, stage: PipelineStage);
}

/// Records every transition it sees, in order.
#[derive(Debug, Default)]
pub struct StageHistory {
    stages: Mutex<Vec<PipelineStage>>,
}

impl StageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<PipelineStage> {
        self.stages
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// The most recent transition, or `Idle` before any.
    pub fn current(&self) -> PipelineStage {
        self.stages().last().copied().unwrap_or_default()
    }
}

impl StageObserver for StageHistory {
    fn on_stage(&self, _reference: &DocumentRef, stage: PipelineStage) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(stage);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stage_is_idle() {
        assert_eq!(PipelineStage::default(), PipelineStage::Idle);
    }

    #[test]
    fn terminal_stages() {
        assert!(PipelineStage::Done.is_terminal());
        assert!(PipelineStage::Failed(ErrorKind::Storage).is_terminal());
        assert!(!PipelineStage::Storing.is_terminal());
    }

    #[test]
    fn labels() {
        assert_eq!(PipelineStage::Extracting.label(), "Extracting text");
        assert_eq!(PipelineStage::Done.label(), "Done");
        assert_eq!(PipelineStage::Failed(ErrorKind::UploadFailed).label(), "Failed");
    }

    #[test]
    fn history_records_in_order() {
        let history = StageHistory::new();
        let reference = DocumentRef::local("a.pdf");
        assert_eq!(history.current(), PipelineStage::Idle);

        history.on_stage(&reference, PipelineStage::Extracting);
        history.on_stage(&reference, PipelineStage::Failed(ErrorKind::UnreadableDocument));

        assert_eq!(
            history.stages(),
            vec![
                PipelineStage::Extracting,
                PipelineStage::Failed(ErrorKind::UnreadableDocument)
            ]
        );
        assert_eq!(
            history.current(),
            PipelineStage::Failed(ErrorKind::UnreadableDocument)
        );
    }

    #[test]
    fn history_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StageHistory>();
    }
}
