//! End-to-end conversion of a DOCX through the public API, with a fake
//! synthesizer so no network is needed.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use doc_to_audio::document::{DocumentRef, DocumentType};
use doc_to_audio::extract::Extractors;
use doc_to_audio::pipeline::{ErrorKind, PipelineOrchestrator, ProcessOptions};
use doc_to_audio::storage::LocalStore;
use doc_to_audio::tts::{SpeechSynthesizer, SynthesisError};
use tempfile::tempdir;
use zip::write::SimpleFileOptions;

/// Writes the text itself as "audio".
struct EchoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for EchoSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        output: &Path,
        _language: &str,
    ) -> Result<PathBuf, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        std::fs::write(output, text).map_err(|e| SynthesisError::Command(e.to_string()))?;
        Ok(output.to_path_buf())
    }
}

fn write_docx(path: &Path, paragraph: &str) {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{paragraph}</w:t></w:r></w:p></w:body></w:document>"#
    );
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn orchestrator(store: &Path) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        Arc::new(Extractors::local_only()),
        Arc::new(EchoSynthesizer),
        LocalStore::new(store).unwrap(),
    )
}

#[tokio::test]
async fn docx_is_converted_stored_and_described() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("test.docx");
    write_docx(&input, "This is a test document for audio conversion.");
    let orc = orchestrator(&dir.path().join("store"));

    let result = orc
        .process(&DocumentRef::local(&input), &ProcessOptions::default())
        .await
        .expect("pipeline");

    let stored = &result.stored_audio_path;
    assert!(stored.exists());
    assert!(std::fs::metadata(stored).unwrap().len() > 0);
    assert_eq!(
        std::fs::read_to_string(stored).unwrap(),
        "This is a test document for audio conversion."
    );
    assert_eq!(result.metadata.get("Document Type"), Some("docx"));

    let listed = orc.store().list_files(Some(DocumentType::Docx));
    assert_eq!(listed, vec![stored.clone()]);

    let info = orc.store().get_file_info(stored).unwrap().expect("sidecar");
    assert_eq!(info, result.metadata);
}

#[tokio::test]
async fn unsupported_input_produces_nothing() {
    let dir = tempdir().expect("temp dir");
    let orc = orchestrator(&dir.path().join("store"));

    let err = orc
        .process(&DocumentRef::local("invalid.txt"), &ProcessOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(orc.store().list_files(None).is_empty());
}

#[tokio::test]
async fn empty_document_fails_in_synthesis() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("blank.docx");
    write_docx(&input, "");
    let orc = orchestrator(&dir.path().join("store"));

    let err = orc
        .process(&DocumentRef::local(&input), &ProcessOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SynthesisFailed);
    assert!(orc.store().list_files(None).is_empty());
}
