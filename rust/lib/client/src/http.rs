use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::token::TokenSource;

/// Shared HTTP plumbing for the typed API clients.
///
/// Attaches the bearer token from the [`TokenSource`] and, when the server
/// answers 401, invalidates the token and retries the request once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_source,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    /// Send the request built by `build`, retrying once after a 401.
    ///
    /// Non-success statuses are mapped through [`ApiError::from_status`].
    pub async fn send<F>(&self, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut retried = false;
        loop {
            let req = self.authed(build(&self.http)).await?;
            let resp = req.send().await?;
            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }
            if status == reqwest::StatusCode::UNAUTHORIZED && !retried {
                tracing::debug!("401 from server, retrying with a fresh token");
                self.token_source.invalidate().await;
                retried = true;
                continue;
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }
    }

    /// Send and decode the JSON body as `R`.
    pub async fn send_json<R, F>(&self, build: F) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder + Send + Sync,
    {
        let resp = self.send(build).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }
}
