//! Status source: where the reconciler reads incidents from.

mod client;
mod error;

use std::future::Future;

pub use client::{DEFAULT_API_BASE, StatuspageClient};
pub use error::FetchError;

use crate::types::RemoteIncident;

/// Fetches the provider's current incident list, updates newest first.
pub trait StatusSource {
    fn fetch_incidents(&self) -> impl Future<Output = Result<Vec<RemoteIncident>, FetchError>> + Send;
}

impl<T: StatusSource + Send + Sync> StatusSource for std::sync::Arc<T> {
    fn fetch_incidents(&self) -> impl Future<Output = Result<Vec<RemoteIncident>, FetchError>> + Send {
        (**self).fetch_incidents()
    }
}
