//! Installed-application OAuth consent flow with a loopback redirect.

use chrono::Utc;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::remote::auth::{request_token, AuthError, ClientSecrets, OAuthToken};

const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// Outcome carried by the redirect back to the loopback listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Redirect {
    Code(String),
    Denied(String),
    /// A request without `code` or `error` (favicon and the like).
    Ignored,
}

/// Parse the request target (`/?code=…&state=…`) of a redirect.
pub(crate) fn parse_redirect(target: &str, expected_state: &str) -> Redirect {
    let Ok(url) = Url::parse(&format!("http://127.0.0.1{target}")) else {
        return Redirect::Ignored;
    };

    let mut code = None;
    let mut error = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Redirect::Denied(error);
    }
    match code {
        Some(_) if state.as_deref() != Some(expected_state) => {
            Redirect::Denied("state mismatch in authorization response".into())
        }
        Some(code) => Redirect::Code(code),
        None => Redirect::Ignored,
    }
}

/// 128 random bits, hex encoded, for the `state` parameter.
fn random_state() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Runs the browser consent flow once and exchanges the code for a token.
pub struct InstalledAppFlow<'a> {
    secrets: &'a ClientSecrets,
    scopes: &'a [String],
    client: &'a reqwest::Client,
    state: String,
}

impl<'a> InstalledAppFlow<'a> {
    pub fn new(secrets: &'a ClientSecrets, scopes: &'a [String], client: &'a reqwest::Client) -> Self {
        Self {
            secrets,
            scopes,
            client,
            state: random_state(),
        }
    }

    /// Consent URL for the given loopback redirect.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<Url, AuthError> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", self.state.as_str()),
            ],
        )
        .map_err(|e| AuthError::InvalidClientSecrets(format!("auth_uri: {e}")))
    }

    pub async fn run(&self) -> Result<OAuthToken, AuthError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| AuthError::Flow(format!("cannot bind loopback listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Flow(e.to_string()))?
            .port();
        let redirect_uri = format!("http://localhost:{port}/");

        let url = self.authorization_url(&redirect_uri)?;
        println!("Please visit this URL to authorize this application: {url}");
        log::info!("auth: waiting for redirect on {redirect_uri}");

        let code = loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| AuthError::Flow(e.to_string()))?;
            match self.handle_connection(stream).await {
                Ok(Redirect::Code(code)) => break code,
                Ok(Redirect::Denied(reason)) => return Err(AuthError::Flow(reason)),
                Ok(Redirect::Ignored) => continue,
                Err(e) => log::warn!("auth: bad redirect request ({e})"),
            }
        };

        let response = request_token(
            self.client,
            &self.secrets.token_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )
        .await?;

        let mut token = OAuthToken::from_response(response, None, Utc::now());
        if token.scopes.is_empty() {
            token.scopes = self.scopes.to_vec();
        }
        log::info!("auth: authorization complete");
        Ok(token)
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> std::io::Result<Redirect> {
        let mut buf = vec![0u8; 8192];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let target = request
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/");
        let redirect = parse_redirect(target, &self.state);

        let (status, body) = match &redirect {
            Redirect::Ignored => ("404 Not Found", ""),
            Redirect::Code(_) => ("200 OK", SUCCESS_PAGE),
            Redirect::Denied(_) => ("200 OK", "Authorization was not granted."),
        };
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(redirect)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> ClientSecrets {
        ClientSecrets::from_json(
            r#"{"installed":{"client_id":"mock_client_id","client_secret":"mock_secret"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn authorization_url_carries_client_and_scopes() {
        let secrets = secrets();
        let scopes = vec![
            "https://www.googleapis.com/auth/drive.file".to_string(),
            "https://www.googleapis.com/auth/documents.readonly".to_string(),
        ];
        let client = reqwest::Client::new();
        let flow = InstalledAppFlow::new(&secrets, &scopes, &client);

        let url = flow.authorization_url("http://localhost:8080/").unwrap();
        assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/auth?"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("client_id"), Some("mock_client_id"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8080/"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(
            get("scope"),
            Some("https://www.googleapis.com/auth/drive.file https://www.googleapis.com/auth/documents.readonly")
        );
        assert_eq!(get("state"), Some(flow.state.as_str()));
    }

    #[test]
    fn state_is_random_per_flow() {
        let secrets = secrets();
        let client = reqwest::Client::new();
        let a = InstalledAppFlow::new(&secrets, &[], &client);
        let b = InstalledAppFlow::new(&secrets, &[], &client);

        assert_eq!(a.state.len(), 32);
        assert!(a.state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn redirect_with_code_and_state() {
        assert_eq!(
            parse_redirect("/?state=s1&code=4%2F0abc&scope=x", "s1"),
            Redirect::Code("4/0abc".into())
        );
    }

    #[test]
    fn redirect_with_wrong_state_is_denied() {
        assert!(matches!(
            parse_redirect("/?state=other&code=abc", "s1"),
            Redirect::Denied(_)
        ));
    }

    #[test]
    fn redirect_with_error_is_denied() {
        assert_eq!(
            parse_redirect("/?error=access_denied&state=s1", "s1"),
            Redirect::Denied("access_denied".into())
        );
    }

    #[test]
    fn unrelated_requests_are_ignored() {
        assert_eq!(parse_redirect("/favicon.ico", "s1"), Redirect::Ignored);
    }
}
