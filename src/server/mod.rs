//! HTTP server for the status updates bot.
//!
//! # Endpoints
//!
//! - `POST /interactions` - Signed Discord interaction callbacks
//! - `GET /health` - Returns 200 if the server is running

use std::fmt::Display;
use std::sync::Arc;

use axum::http::StatusCode;
use ed25519_dalek::VerifyingKey;

use crate::effects::DiscordInterpreter;
use crate::persistence::IncidentStore;
use crate::types::GuildId;

pub mod interaction;

pub use interaction::{InteractionError, interaction_handler};

/// Shared application state, passed to handlers via Axum's `State` extractor.
pub struct AppState<D> {
    inner: Arc<AppStateInner<D>>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<D> {
    /// Application public key for interaction signatures.
    public_key: VerifyingKey,

    guild_id: GuildId,

    /// Read-only from the server's side.
    store: Arc<dyn IncidentStore>,

    discord: D,
}

impl<D> AppState<D> {
    pub fn new(
        public_key: VerifyingKey,
        guild_id: GuildId,
        store: Arc<dyn IncidentStore>,
        discord: D,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                public_key,
                guild_id,
                store,
                discord,
            }),
        }
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.inner.public_key
    }

    pub fn guild_id(&self) -> GuildId {
        self.inner.guild_id
    }

    pub fn store(&self) -> &dyn IncidentStore {
        self.inner.store.as_ref()
    }

    pub fn discord(&self) -> &D {
        &self.inner.discord
    }
}

/// Liveness probe.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Builds the axum Router with all endpoints.
pub fn build_router<D>(app_state: AppState<D>) -> axum::Router
where
    D: DiscordInterpreter + Send + Sync + 'static,
    D::Error: Display,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/interactions", post(interaction_handler::<D>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
