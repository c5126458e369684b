//! OAuth credentials for the Google APIs.
//!
//! [`FileCredentialProvider`] keeps the behaviour users expect from a desktop
//! Google client: the token cached in `token.json` is reused, silently
//! refreshed when it has expired and carries a refresh token, and otherwise
//! the installed-app consent flow runs once and its result is cached.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::GoogleConfig;
use crate::remote::flow::InstalledAppFlow;

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AuthError {
    /// The client secrets file does not exist.
    #[error("client secrets file not found: {0}")]
    MissingClientSecrets(String),

    /// The client secrets file exists but is not a valid OAuth client.
    #[error("invalid client secrets: {0}")]
    InvalidClientSecrets(String),

    /// Reading or writing the cached credential failed.
    #[error("token cache {path}: {reason}")]
    TokenCache { path: String, reason: String },

    /// The interactive consent flow failed or was denied.
    #[error("authorization flow failed: {0}")]
    Flow(String),

    /// The token endpoint rejected a code exchange or refresh.
    #[error("token endpoint error: {0}")]
    TokenEndpoint(String),

    /// The credential has expired and holds no refresh token.
    #[error("credential expired and cannot be refreshed")]
    NotRefreshable,
}

// ---------------------------------------------------------------------------
// OAuthToken
// ---------------------------------------------------------------------------

/// A cached OAuth credential, serialised as JSON in the token file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthToken {
    /// A non-expiring bearer token with no refresh capability.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at <= now + chrono::Duration::seconds(EXPIRY_SKEW_SECS))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Build a token from a token-endpoint response.
    ///
    /// Refresh responses usually omit `refresh_token`; `previous_refresh` is
    /// kept in that case.
    pub(crate) fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response
                .expires_in
                .map(|secs| now + chrono::Duration::seconds(secs)),
            scopes: response
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

/// Body returned by the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// POST a form to the token endpoint and decode the response.
pub(crate) async fn request_token(
    client: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = client
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::TokenEndpoint(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenEndpoint(format!("{status}: {body}")));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError::TokenEndpoint(e.to_string()))
}

// ---------------------------------------------------------------------------
// ClientSecrets
// ---------------------------------------------------------------------------

/// The OAuth client downloaded from the Cloud console (`credentials.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.into()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the console JSON (`{"installed": {...}}` or `{"web": {...}}`).
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidClientSecrets(e.to_string()))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| AuthError::InvalidClientSecrets("expected an \"installed\" or \"web\" client".into()))
    }

    pub fn load(path: &Path) -> Result<Self, AuthError> {
        if !path.exists() {
            return Err(AuthError::MissingClientSecrets(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::InvalidClientSecrets(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

// ---------------------------------------------------------------------------
// CredentialProvider trait
// ---------------------------------------------------------------------------

/// Supplies bearer tokens to the Google API clients.
///
/// Injected at construction so the clients never touch the filesystem
/// themselves.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A currently valid access token, obtaining or refreshing one if needed.
    async fn access_token(&self) -> Result<String, AuthError>;

    /// Force a refresh of the current credential.
    async fn refresh(&self) -> Result<OAuthToken, AuthError>;
}

// ---------------------------------------------------------------------------
// StaticCredentialProvider
// ---------------------------------------------------------------------------

/// Holds one token in memory.  Useful for tests and for tokens minted
/// elsewhere (e.g. `gcloud auth print-access-token`).
pub struct StaticCredentialProvider {
    token: Mutex<OAuthToken>,
}

impl StaticCredentialProvider {
    pub fn new(token: OAuthToken) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let token = self.token.lock().await;
        if token.is_expired() {
            return Err(AuthError::NotRefreshable);
        }
        Ok(token.access_token.clone())
    }

    async fn refresh(&self) -> Result<OAuthToken, AuthError> {
        Err(AuthError::NotRefreshable)
    }
}

// ---------------------------------------------------------------------------
// FileCredentialProvider
// ---------------------------------------------------------------------------

/// Token cached on disk, refreshed or re-authorised on demand.
pub struct FileCredentialProvider {
    token_file: PathBuf,
    client_secrets_file: PathBuf,
    scopes: Vec<String>,
    client: reqwest::Client,
    cached: Mutex<Option<OAuthToken>>,
}

impl FileCredentialProvider {
    pub fn from_config(config: &GoogleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            token_file: config.token_file.clone(),
            client_secrets_file: config.client_secrets_file.clone(),
            scopes: config.scopes.clone(),
            client,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid credential, running the consent flow if nothing usable
    /// is cached.
    pub async fn credential(&self) -> Result<OAuthToken, AuthError> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.read_cache();
        }

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let fresh = match cached.as_ref() {
            Some(token) if token.can_refresh() => {
                log::info!("auth: cached credential expired, refreshing");
                self.refresh_with(token).await?
            }
            _ => {
                log::info!("auth: no usable credential cached, starting authorization flow");
                self.authorize().await?
            }
        };

        self.write_cache(&fresh)?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Run the installed-app flow unconditionally and cache the result.
    pub async fn reauthorize(&self) -> Result<OAuthToken, AuthError> {
        let token = self.authorize().await?;
        self.write_cache(&token)?;
        *self.cached.lock().await = Some(token.clone());
        Ok(token)
    }

    fn read_cache(&self) -> Option<OAuthToken> {
        let data = std::fs::read_to_string(&self.token_file).ok()?;
        match serde_json::from_str(&data) {
            Ok(token) => Some(token),
            Err(e) => {
                log::warn!(
                    "auth: ignoring unreadable token cache {} ({e})",
                    self.token_file.display()
                );
                None
            }
        }
    }

    fn write_cache(&self, token: &OAuthToken) -> Result<(), AuthError> {
        let cache_err = |reason: String| AuthError::TokenCache {
            path: self.token_file.display().to_string(),
            reason,
        };
        if let Some(parent) = self.token_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| cache_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(token).map_err(|e| cache_err(e.to_string()))?;
        std::fs::write(&self.token_file, json).map_err(|e| cache_err(e.to_string()))
    }

    async fn refresh_with(&self, token: &OAuthToken) -> Result<OAuthToken, AuthError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(AuthError::NotRefreshable)?;
        let secrets = ClientSecrets::load(&self.client_secrets_file)?;

        let response = request_token(
            &self.client,
            &secrets.token_uri,
            &[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
        )
        .await?;

        let mut fresh = OAuthToken::from_response(response, token.refresh_token.clone(), Utc::now());
        if fresh.scopes.is_empty() {
            fresh.scopes = token.scopes.clone();
        }
        Ok(fresh)
    }

    async fn authorize(&self) -> Result<OAuthToken, AuthError> {
        let secrets = ClientSecrets::load(&self.client_secrets_file)?;
        InstalledAppFlow::new(&secrets, &self.scopes, &self.client)
            .run()
            .await
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.credential().await?.access_token)
    }

    async fn refresh(&self) -> Result<OAuthToken, AuthError> {
        let current = {
            let mut cached = self.cached.lock().await;
            if cached.is_none() {
                *cached = self.read_cache();
            }
            cached.clone().ok_or(AuthError::NotRefreshable)?
        };

        let fresh = self.refresh_with(&current).await?;
        self.write_cache(&fresh)?;
        *self.cached.lock().await = Some(fresh.clone());
        Ok(fresh)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
