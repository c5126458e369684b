//! Google Docs extraction through the Docs REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::GoogleConfig;
use crate::document::DocumentRef;
use crate::extract::{ExtractError, TextExtractor};
use crate::remote::CredentialProvider;

pub(crate) const DOCUMENT_MARKER: &str = "/document/d/";
pub(crate) const SPREADSHEET_MARKER: &str = "/spreadsheets/d/";

/// Extract the document id from a Google Docs URL.
///
/// ```
/// use doc_to_audio::extract::google_doc_id_from_url;
///
/// let id = google_doc_id_from_url("https://docs.google.com/document/d/1234567890abcdef/edit").unwrap();
/// assert_eq!(id, "1234567890abcdef");
/// ```
pub fn google_doc_id_from_url(url: &str) -> Result<String, ExtractError> {
    if let Some((_, rest)) = url.split_once(DOCUMENT_MARKER) {
        let id = rest
            .split(|c| matches!(c, '/' | '?' | '#'))
            .next()
            .unwrap_or_default();
        if id.is_empty() {
            return Err(ExtractError::InvalidReference(url.to_string()));
        }
        Ok(id.to_string())
    } else if url.contains(SPREADSHEET_MARKER) {
        Err(ExtractError::WrongDocumentKind(url.to_string()))
    } else {
        Err(ExtractError::InvalidReference(url.to_string()))
    }
}

/// Resolve the document id of a remote reference.
///
/// A bare id (no `/`, no scheme) is accepted as-is; anything else must be a
/// Google Docs URL.
pub fn document_id(reference: &DocumentRef) -> Result<String, ExtractError> {
    match reference {
        DocumentRef::RemoteDoc(value) => {
            let value = value.trim();
            let is_bare_id = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if is_bare_id {
                Ok(value.to_string())
            } else {
                google_doc_id_from_url(value)
            }
        }
        DocumentRef::LocalPath(path) => Err(ExtractError::InvalidReference(path.display().to_string())),
    }
}

/// Concatenate the `textRun` contents of every paragraph in a Docs API
/// `documents.get` response, in body order, with no separator.
///
/// Structural elements other than paragraphs (tables, section breaks) are
/// ignored; a missing `body` yields an empty string.
pub fn text_from_document_json(doc: &Value) -> String {
    let mut text = String::new();
    let content = doc["body"]["content"].as_array();

    for element in content.into_iter().flatten() {
        let Some(elements) = element["paragraph"]["elements"].as_array() else {
            continue;
        };
        for run in elements {
            if let Some(s) = run["textRun"]["content"].as_str() {
                text.push_str(s);
            }
        }
    }

    text
}

// ---------------------------------------------------------------------------
// GoogleDocsExtractor
// ---------------------------------------------------------------------------

/// Fetches `GET {docs_base_url}/v1/documents/{id}` with a bearer token from
/// the injected [`CredentialProvider`].
pub struct GoogleDocsExtractor {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl GoogleDocsExtractor {
    pub fn from_config(config: &GoogleConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.docs_base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn fetch(&self, doc_id: &str) -> Result<Value, ExtractError> {
        let token = self
            .credentials
            .access_token()
            .await
            .map_err(|e| ExtractError::remote(doc_id, e))?;

        let url = format!("{}/v1/documents/{}", self.base_url, doc_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExtractError::remote(doc_id, e))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ExtractError::remote(doc_id, e))
    }
}

#[async_trait]
impl TextExtractor for GoogleDocsExtractor {
    async fn extract(&self, reference: &DocumentRef) -> Result<String, ExtractError> {
        let doc_id = document_id(reference)?;
        let doc = self.fetch(&doc_id).await?;
        let text = text_from_document_json(&doc);
        log::debug!("google docs: {} chars from {doc_id}", text.len());
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{AuthError, OAuthToken, StaticCredentialProvider};
    use serde_json::json;

    struct NoCredentials;

    #[async_trait]
    impl CredentialProvider for NoCredentials {
        async fn access_token(&self) -> Result<String, AuthError> {
            Err(AuthError::MissingClientSecrets("credentials.json".into()))
        }

        async fn refresh(&self) -> Result<OAuthToken, AuthError> {
            Err(AuthError::MissingClientSecrets("credentials.json".into()))
        }
    }

    #[test]
    fn id_is_taken_from_document_url() {
        let id = google_doc_id_from_url("https://docs.google.com/document/d/1234567890abcdef/edit")
            .unwrap();
        assert_eq!(id, "1234567890abcdef");
    }

    #[test]
    fn id_stops_at_query_string() {
        let id = google_doc_id_from_url("https://docs.google.com/document/d/abc_DEF-1?usp=sharing")
            .unwrap();
        assert_eq!(id, "abc_DEF-1");
    }

    #[test]
    fn spreadsheet_url_is_wrong_kind_not_invalid() {
        let err = google_doc_id_from_url("https://docs.google.com/spreadsheets/d/123/edit")
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongDocumentKind(_)));
        assert!(err.to_string().contains("Google Sheets URL"));
    }

    #[test]
    fn other_urls_are_invalid() {
        let err = google_doc_id_from_url("https://invalid-url.com").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidReference(_)));
        assert!(err.to_string().contains("Invalid Google Docs URL format"));

        let err = google_doc_id_from_url("https://docs.google.com/document/d/").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidReference(_)));
    }

    #[test]
    fn bare_ids_are_accepted() {
        assert_eq!(document_id(&DocumentRef::remote("test_doc_id")).unwrap(), "test_doc_id");
        assert!(matches!(
            document_id(&DocumentRef::remote("https://invalid-url.com")),
            Err(ExtractError::InvalidReference(_))
        ));
    }

    #[test]
    fn text_runs_are_concatenated_without_separator() {
        let doc = json!({
            "body": {
                "content": [
                    { "sectionBreak": {} },
                    { "paragraph": { "elements": [
                        { "textRun": { "content": "This is a test " } },
                        { "inlineObjectElement": {} },
                        { "textRun": { "content": "Google Doc.\n" } }
                    ] } },
                    { "table": {} },
                    { "paragraph": { "elements": [
                        { "textRun": { "content": "Second.\n" } }
                    ] } }
                ]
            }
        });
        assert_eq!(text_from_document_json(&doc), "This is a test Google Doc.\nSecond.\n");
    }

    #[test]
    fn missing_body_is_empty_text() {
        assert_eq!(text_from_document_json(&json!({ "title": "x" })), "");
    }

    #[tokio::test]
    async fn credential_failure_is_remote_fetch_failed() {
        let extractor =
            GoogleDocsExtractor::from_config(&GoogleConfig::default(), Arc::new(NoCredentials));
        let err = extractor
            .extract(&DocumentRef::remote("https://docs.google.com/document/d/abc/edit"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::RemoteFetchFailed { .. }));
    }

    #[tokio::test]
    async fn malformed_url_fails_before_any_request() {
        let provider = StaticCredentialProvider::new(OAuthToken::bearer("token"));
        let extractor =
            GoogleDocsExtractor::from_config(&GoogleConfig::default(), Arc::new(provider));
        let err = extractor
            .extract(&DocumentRef::remote("https://docs.google.com/spreadsheets/d/1/edit"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::WrongDocumentKind(_)));
    }
}
