//! Thin reqwest wrapper around the Discord REST API (v10).

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::DiscordApiError;
use super::retry::{RetryConfig, retry_with_backoff};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Discord bot client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    retry: RetryConfig,
}

impl fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("retry", &self.retry)
            .finish()
    }
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self, DiscordApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(
                "DiscordBot (status-updates, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()
            .map_err(DiscordApiError::from_reqwest)?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            retry: RetryConfig::DEFAULT,
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Sends a request, retrying rate limits, and returns the raw response
    /// body (empty for `204 No Content`).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, DiscordApiError> {
        retry_with_backoff(self.retry, move || {
            self.send_once(method.clone(), path, body)
        })
        .await
    }

    /// Like [`request`](Self::request), decoding the body as JSON.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, DiscordApiError> {
        let bytes = self.request(method, path, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            DiscordApiError::permanent_without_source(format!(
                "failed to decode response from {path}: {e}"
            ))
        })
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, DiscordApiError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%method, %url, "Discord request");

        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(DiscordApiError::from_reqwest)?;
        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(DiscordApiError::from_reqwest)?;

        if status.is_success() {
            Ok(bytes.to_vec())
        } else {
            Err(DiscordApiError::from_response(
                status.as_u16(),
                &bytes,
                retry_after,
            ))
        }
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
