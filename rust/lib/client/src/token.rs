//! Bearer token providers.
//!
//! Every request asks its [`TokenSource`] for a token. Sources own
//! acquisition, caching and refresh; nothing else reads or writes tokens.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Seconds shaved off `expires_in` so a token is never sent at the edge
/// of its lifetime.
const EXPIRY_SKEW_SECS: i64 = 30;

/// Pluggable token provider, called before every API request.
///
/// `Ok(None)` sends the request without an Authorization header.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;

    /// The server rejected the last token (HTTP 401). The next `token()`
    /// call must not hand it out again.
    async fn invalidate(&self) {}
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// A bearer token obtained elsewhere, e.g. saved by `closet login`.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

/// Access/refresh token pair with an absolute expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

impl Tokens {
    fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Body of `/auth/login` and `/auth/refresh` responses.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl LoginResponse {
    pub fn into_tokens(self, now: i64) -> Tokens {
        Tokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + self.expires_in as i64 - EXPIRY_SKEW_SECS,
        }
    }
}

async fn post_for_tokens(
    http: &reqwest::Client,
    url: &str,
    body: serde_json::Value,
) -> Result<Tokens, ApiError> {
    let resp = http.post(url).json(&body).send().await?;
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(ApiError::Auth(format!("{} failed ({}): {}", url, status, text)));
    }
    let lr: LoginResponse = resp
        .json()
        .await
        .map_err(|e| ApiError::Decode(format!("token response: {}", e)))?;
    Ok(lr.into_tokens(chrono::Utc::now().timestamp()))
}

/// Password login. Authenticates lazily on first use, caches the token
/// and logs in again once it expires or is rejected.
pub struct PasswordLogin {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    cached: RwLock<Option<Tokens>>,
}

impl PasswordLogin {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            cached: RwLock::new(None),
        }
    }

    /// Log in now and return the full token pair.
    pub async fn login(&self) -> Result<Tokens, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        post_for_tokens(
            &self.http,
            &url,
            serde_json::json!({
                "username": self.username,
                "password": self.password,
            }),
        )
        .await
    }
}

#[async_trait::async_trait]
impl TokenSource for PasswordLogin {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        {
            let guard = self.cached.read().await;
            if let Some(t) = guard.as_ref() {
                if t.is_fresh(chrono::Utc::now().timestamp()) {
                    return Ok(Some(t.access_token.clone()));
                }
            }
        }

        let mut guard = self.cached.write().await;
        if let Some(t) = guard.as_ref() {
            if t.is_fresh(chrono::Utc::now().timestamp()) {
                return Ok(Some(t.access_token.clone()));
            }
        }
        let fresh = self.login().await?;
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(Some(token))
    }

    async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

/// The signed-in user's session: the single owner of the token pair.
///
/// Callers read, store and clear tokens only through this object; it
/// refreshes an expired access token with the refresh token via
/// `POST {base}/auth/refresh` before handing it out. A failed refresh
/// clears the session.
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    tokens: RwLock<Option<Tokens>>,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::build(base_url.into(), None)
    }

    pub fn with_tokens(base_url: impl Into<String>, tokens: Tokens) -> Self {
        Self::build(base_url.into(), Some(tokens))
    }

    fn build(base_url: String, tokens: Option<Tokens>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: RwLock::new(tokens),
        }
    }

    pub async fn tokens(&self) -> Option<Tokens> {
        self.tokens.read().await.clone()
    }

    pub async fn store(&self, tokens: Tokens) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn clear(&self) {
        *self.tokens.write().await = None;
    }

    pub async fn is_signed_in(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Tokens, ApiError> {
        let url = format!("{}/auth/refresh", self.base_url);
        let mut tokens = post_for_tokens(
            &self.http,
            &url,
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await?;
        // Servers may rotate the refresh token or omit it to keep the old one.
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }
}

#[async_trait::async_trait]
impl TokenSource for Session {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        {
            let guard = self.tokens.read().await;
            match guard.as_ref() {
                None => return Ok(None),
                Some(t) if t.is_fresh(chrono::Utc::now().timestamp()) => {
                    return Ok(Some(t.access_token.clone()));
                }
                Some(_) => {}
            }
        }

        let mut guard = self.tokens.write().await;
        let refresh_token = match guard.as_ref() {
            None => return Ok(None),
            Some(t) if t.is_fresh(chrono::Utc::now().timestamp()) => {
                return Ok(Some(t.access_token.clone()));
            }
            Some(t) => t.refresh_token.clone(),
        };
        let Some(refresh_token) = refresh_token else {
            *guard = None;
            return Err(ApiError::Auth("session expired".into()));
        };

        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                tracing::debug!("session token refreshed");
                let token = fresh.access_token.clone();
                *guard = Some(fresh);
                Ok(Some(token))
            }
            Err(e) => {
                tracing::warn!("session refresh failed: {}", e);
                *guard = None;
                Err(e)
            }
        }
    }

    async fn invalidate(&self) {
        if let Some(t) = self.tokens.write().await.as_mut() {
            t.expires_at = 0;
        }
    }
}
