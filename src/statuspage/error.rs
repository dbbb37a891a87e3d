use thiserror::Error;

/// A failed incident fetch. Any variant aborts the reconcile cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to status page failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status page returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode incident list: {0}")]
    Decode(#[from] serde_json::Error),
}
