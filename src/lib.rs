//! Convert PDF, DOCX and Google Docs documents to speech, keep the audio in
//! a dated local store and optionally upload it to Google Drive.

pub mod config;
pub mod document;
pub mod extract;
pub mod pipeline;
pub mod remote;
pub mod storage;
pub mod tts;
