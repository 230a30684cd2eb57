//! OAuth2 Authorization Code flow for a desktop client.
//!
//! 1. Opens browser to authorization URL
//! 2. Accepts one request on a localhost listener to receive the callback
//! 3. Exchanges the code for an access token (+ refresh token)
//! 4. Stores tokens in OS keyring

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::keyring_store;
use crate::error::OAuthError;

/// Tokens are treated as expired this many seconds early.
const EXPIRY_BUFFER_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>, // Unix timestamp
    pub token_type: String,
    pub scope: Option<String>,
}

impl OAuthTokens {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(exp) => now > exp - EXPIRY_BUFFER_SECS,
            None => false,
        }
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    /// Convert to stored tokens, keeping `previous_refresh` when the server
    /// did not rotate it.
    fn into_tokens(
        self,
        previous_refresh: Option<&str>,
        fail: fn(String) -> OAuthError,
    ) -> Result<OAuthTokens, OAuthError> {
        if let Some(error) = self.error {
            let detail = self
                .error_description
                .map(|d| format!("{error}: {d}"))
                .unwrap_or(error);
            return Err(fail(detail));
        }
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| fail("response carried no access_token".into()))?;

        Ok(OAuthTokens {
            access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(String::from)),
            expires_at: self
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
            scope: self.scope,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub service_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub redirect_port: u16,
}

impl OAuthConfig {
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    pub fn auth_url_full(&self) -> Result<String, OAuthError> {
        let redirect_uri = self.redirect_uri();
        let scopes = self.scopes.join(" ");
        let url = url::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scopes.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;
        Ok(url.into())
    }
}

/// Run the full OAuth2 flow: open browser -> wait for callback -> exchange code.
pub async fn authorize(config: &OAuthConfig) -> Result<OAuthTokens, OAuthError> {
    let listener = TcpListener::bind(("127.0.0.1", config.redirect_port)).await?;

    let auth_url = config.auth_url_full()?;
    tracing::info!(service = %config.service_name, "opening browser for authorization");
    if let Err(e) = open::that(&auth_url) {
        tracing::warn!(error = %e, url = %auth_url, "could not open browser; visit the URL manually");
    }

    let (mut stream, _) = listener.accept().await?;
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let code = extract_code(&request)
        .ok_or_else(|| OAuthError::InvalidCallback("no code in callback".into()))?;

    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h2>todo5 is authorized.</h2><p>You can close this tab.</p></body></html>";
    stream.write_all(response.as_bytes()).await?;
    drop(stream);
    drop(listener);

    let tokens = exchange_code(config, &code).await?;
    store_tokens(&config.service_name, &tokens)?;
    Ok(tokens)
}

async fn exchange_code(config: &OAuthConfig, code: &str) -> Result<OAuthTokens, OAuthError> {
    let redirect_uri = config.redirect_uri();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri.as_str()),
    ];

    let body: TokenResponse = Client::new()
        .post(&config.token_url)
        .form(&params)
        .send()
        .await?
        .json()
        .await?;

    body.into_tokens(None, OAuthError::TokenExchangeFailed)
}

/// Refresh an access token and store the result.
pub async fn refresh_token(config: &OAuthConfig, refresh: &str) -> Result<OAuthTokens, OAuthError> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh),
        ("grant_type", "refresh_token"),
    ];

    let body: TokenResponse = Client::new()
        .post(&config.token_url)
        .form(&params)
        .send()
        .await?
        .json()
        .await?;

    let tokens = body.into_tokens(Some(refresh), OAuthError::TokenRefreshFailed)?;
    store_tokens(&config.service_name, &tokens)?;
    Ok(tokens)
}

fn store_tokens(service_name: &str, tokens: &OAuthTokens) -> Result<(), OAuthError> {
    let json = serde_json::to_string(tokens)
        .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;
    keyring_store::set(service_name, &json)?;
    Ok(())
}

/// Load stored tokens from keyring.
pub fn load_tokens(service_name: &str) -> Option<OAuthTokens> {
    keyring_store::get(service_name)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str(&json).ok())
}

fn extract_code(request: &str) -> Option<String> {
    let first_line = request.lines().next()?;
    let path = first_line.split_whitespace().nth(1)?;
    let url = url::Url::parse(&format!("http://localhost{path}")).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
}
