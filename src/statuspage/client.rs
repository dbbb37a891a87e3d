use std::fmt;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use tracing::debug;

use super::StatusSource;
use super::error::FetchError;
use crate::types::RemoteIncident;

pub const DEFAULT_API_BASE: &str = "https://api.statuspage.io";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies are truncated to this many characters in [`FetchError`].
const MAX_ERROR_BODY: usize = 512;

/// Statuspage REST client scoped to one page.
#[derive(Clone)]
pub struct StatuspageClient {
    http: reqwest::Client,
    api_base: String,
    page_id: String,
    api_key: String,
}

impl fmt::Debug for StatuspageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatuspageClient")
            .field("api_base", &self.api_base)
            .field("page_id", &self.page_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl StatuspageClient {
    pub fn new(
        api_base: impl Into<String>,
        page_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            page_id: page_id.into(),
            api_key: api_key.into(),
        })
    }

    fn incidents_url(&self) -> String {
        format!("{}/v1/pages/{}/incidents", self.api_base, self.page_id)
    }
}

impl StatusSource for StatuspageClient {
    async fn fetch_incidents(&self) -> Result<Vec<RemoteIncident>, FetchError> {
        let url = self.incidents_url();
        debug!(%url, "Fetching incidents");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("OAuth {}", self.api_key))
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let incidents: Vec<RemoteIncident> = serde_json::from_slice(&bytes)?;
        debug!(count = incidents.len(), "Fetched incidents");
        Ok(incidents)
    }
}
