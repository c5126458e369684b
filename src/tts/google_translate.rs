//! HTTP backend for the public translate speech endpoint.
//!
//! The endpoint accepts at most [`MAX_CHUNK_CHARS`] characters per request,
//! so text is split on whitespace into chunks and the MP3 of each chunk is
//! appended to the output file in order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::config::TtsConfig;
use crate::tts::{ensure_parent, find_language, SpeechSynthesizer, SynthesisError};

/// Longest text accepted by one endpoint request.
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Words are packed greedily and separated by one space; runs of whitespace
/// collapse.  A single word longer than `max_chars` is cut at character
/// boundaries.
///
/// ```
/// use doc_to_audio::tts::split_chunks;
///
/// assert_eq!(split_chunks("one two  three", 7), vec!["one two", "three"]);
/// ```
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            let piece_len = piece.len();
            let needed = if current_len == 0 {
                piece_len
            } else {
                current_len + 1 + piece_len
            };
            if needed > max_chars && current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ---------------------------------------------------------------------------
// GoogleTranslateTts
// ---------------------------------------------------------------------------

/// Fetches `GET {base_url}/translate_tts` once per chunk.
pub struct GoogleTranslateTts {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateTts {
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/translate_tts", self.base_url);
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", language),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("client", "tw-ob"),
            ])
            .header(reqwest::header::REFERER, format!("{}/", self.base_url))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SynthesisError::Request(format!("empty audio for chunk {idx}")));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(
        &self,
        text: &str,
        output: &Path,
        language: &str,
    ) -> Result<PathBuf, SynthesisError> {
        let language = find_language(language)
            .ok_or_else(|| SynthesisError::UnsupportedLanguage(language.to_string()))?
            .code;

        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        ensure_parent(output).await?;
        let mut file = tokio::fs::File::create(output)
            .await
            .map_err(|e| SynthesisError::io(output, e))?;

        log::debug!("tts: {} chunk(s) in {language} -> {}", chunks.len(), output.display());
        for (idx, chunk) in chunks.iter().enumerate() {
            let audio = self.fetch_chunk(chunk, language, idx, chunks.len()).await?;
            file.write_all(&audio)
                .await
                .map_err(|e| SynthesisError::io(output, e))?;
        }
        file.flush().await.map_err(|e| SynthesisError::io(output, e))?;

        Ok(output.to_path_buf())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_chunks("Hello world.", 100), vec!["Hello world."]);
    }

    #[test]
    fn whitespace_only_yields_no_chunks() {
        assert!(split_chunks("  \n\t ", 100).is_empty());
        assert!(split_chunks("", 100).is_empty());
    }

    #[test]
    fn chunks_respect_limit_and_keep_words() {
        let text = "lorem ipsum dolor sit amet ".repeat(20);
        let chunks = split_chunks(&text, MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
        }
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn overlong_word_is_cut_on_char_boundaries() {
        let word = "ก".repeat(250);
        let chunks = split_chunks(&word, MAX_CHUNK_CHARS);
        assert_eq!(
            chunks.iter().map(|c| c.chars().count()).collect::<Vec<_>>(),
            vec![100, 100, 50]
        );
    }

    #[tokio::test]
    async fn unsupported_language_fails_before_request() {
        let dir = tempdir().expect("temp dir");
        let out = dir.path().join("a.mp3");
        let tts = GoogleTranslateTts::from_config(&TtsConfig::default());

        let err = tts.synthesize("hello", &out, "xx").await.unwrap_err();
        assert!(matches!(err, SynthesisError::UnsupportedLanguage(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn empty_text_fails_before_request() {
        let dir = tempdir().expect("temp dir");
        let out = dir.path().join("a.mp3");
        let tts = GoogleTranslateTts::from_config(&TtsConfig::default());

        let err = tts.synthesize("   ", &out, "en").await.unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyText));
        assert!(!out.exists());
    }
}
