//! Google Drive upload client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::GoogleConfig;
use crate::remote::{CredentialProvider, RemoteError, UploadClient};

const BOUNDARY_PREFIX: &str = "doc_to_audio_boundary";

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Content type for an uploaded file, by extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Body of a Drive `uploadType=multipart` request: a JSON metadata part
/// followed by the media part.
pub fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    content_type: &str,
    media: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{boundary}\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Uploads files to Drive with a bearer token from the injected
/// [`CredentialProvider`] and returns the created file id.
pub struct DriveUploader {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl DriveUploader {
    pub fn from_config(config: &GoogleConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.drive_base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

#[async_trait]
impl UploadClient for DriveUploader {
    async fn upload(&self, local_path: &Path, display_name: &str) -> Result<String, RemoteError> {
        let token = self.credentials.access_token().await?;

        let media = tokio::fs::read(local_path)
            .await
            .map_err(|e| RemoteError::UploadFailed(format!("{}: {e}", local_path.display())))?;

        let boundary = format!("{BOUNDARY_PREFIX}_{}", chrono::Utc::now().timestamp_millis());
        let metadata = json!({ "name": display_name });
        let body = multipart_related_body(&boundary, &metadata, mime_for(local_path), &media);

        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id",
            self.base_url
        );
        log::debug!("drive: uploading {} bytes as {display_name}", media.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RemoteError::UploadFailed(e.to_string()))?;

        let created: CreatedFile = response
            .json()
            .await
            .map_err(|e| RemoteError::UploadFailed(e.to_string()))?;

        log::info!("drive: uploaded {display_name} as {}", created.id);
        Ok(created.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
