//! Interaction endpoint handler.
//!
//! Verifies Discord's Ed25519 signature, answers PINGs, and handles clicks on
//! the "Receive Updates" button by adding the clicking member to the
//! incident's role and thread.

use std::fmt::Display;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::effects::{DiscordInterpreter, Sink, SinkError};
use crate::interactions::{
    Interaction, InteractionKind, InteractionResponse, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    parse_signature_header, verify_signature,
};
use crate::persistence::StoreError;
use crate::render::{opt_in_confirmation, parse_opt_in_custom_id};
use crate::types::IncidentId;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error("signature header is not valid hex")]
    MalformedSignature,

    #[error("invalid request signature")]
    InvalidSignature,

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unsupported interaction type {0}")]
    UnsupportedType(u8),

    #[error("unknown component action {0:?}")]
    UnknownAction(String),

    #[error("interaction has no invoking user")]
    MissingUser,

    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),

    #[error("failed to load incident: {0}")]
    Store(#[from] StoreError),

    #[error("failed to add member to incident role: {0}")]
    AddRole(SinkError),

    #[error("failed to add member to incident thread: {0}")]
    AddToThread(SinkError),
}

impl InteractionError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            InteractionError::MissingHeader(_) | InteractionError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            InteractionError::MalformedSignature => {
                (StatusCode::BAD_REQUEST, "Failed to decode signature".to_string())
            }
            InteractionError::InvalidJson(_)
            | InteractionError::UnsupportedType(_)
            | InteractionError::MissingUser => (StatusCode::BAD_REQUEST, self.to_string()),
            InteractionError::UnknownAction(_) => (StatusCode::BAD_REQUEST, "not found".to_string()),
            InteractionError::IncidentNotFound(_) => {
                (StatusCode::NOT_FOUND, "Incident not found".to_string())
            }
            InteractionError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch incident".to_string(),
            ),
            InteractionError::AddRole(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to add role".to_string(),
            ),
            InteractionError::AddToThread(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to add to thread".to_string(),
            ),
        }
    }
}

impl IntoResponse for InteractionError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self, "Interaction failed");
        } else {
            debug!(error = %self, %status, "Interaction rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `POST /interactions`.
///
/// # Response
///
/// - 200 OK: PONG, or the ephemeral opt-in confirmation
/// - 400 Bad Request: undecodable signature, bad JSON, unknown action
/// - 401 Unauthorized: missing signature headers or bad signature
/// - 404 Not Found: the button refers to an incident with no record
/// - 500 Internal Server Error: store or Discord failure
pub async fn interaction_handler<D>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, InteractionError>
where
    D: DiscordInterpreter + Send + Sync + 'static,
    D::Error: Display,
{
    let signature = get_header(&headers, SIGNATURE_HEADER)?;
    let timestamp = get_header(&headers, TIMESTAMP_HEADER)?;

    // Verify signature BEFORE any parsing.
    let signature =
        parse_signature_header(signature).ok_or(InteractionError::MalformedSignature)?;
    if !verify_signature(state.public_key(), timestamp, &body, &signature) {
        warn!("Interaction signature verification failed");
        return Err(InteractionError::InvalidSignature);
    }

    let interaction: Interaction = serde_json::from_slice(&body)?;
    let response = match interaction.kind() {
        InteractionKind::Ping => {
            debug!("Answering interaction ping");
            InteractionResponse::Pong
        }
        InteractionKind::MessageComponent => handle_component(&state, &interaction).await?,
        InteractionKind::Other(code) => return Err(InteractionError::UnsupportedType(code)),
    };

    Ok(Json(response.to_json()))
}

async fn handle_component<D>(
    state: &AppState<D>,
    interaction: &Interaction,
) -> Result<InteractionResponse, InteractionError>
where
    D: DiscordInterpreter + Send + Sync + 'static,
    D::Error: Display,
{
    let custom_id = interaction.custom_id().unwrap_or_default();
    let incident_id = parse_opt_in_custom_id(custom_id)
        .ok_or_else(|| InteractionError::UnknownAction(custom_id.to_string()))?;
    let user = interaction
        .invoking_user()
        .ok_or(InteractionError::MissingUser)?;

    let record = state
        .store()
        .get(&incident_id)?
        .ok_or_else(|| InteractionError::IncidentNotFound(incident_id.clone()))?;

    let sink = Sink::new(state.discord());
    sink.add_member_to_role(state.guild_id(), user, record.role_id())
        .await
        .map_err(InteractionError::AddRole)?;
    sink.add_member_to_thread(record.thread_id(), user)
        .await
        .map_err(InteractionError::AddToThread)?;

    info!(incident_id = %incident_id, user_id = %user, "Member opted in to incident updates");
    Ok(InteractionResponse::Message(opt_in_confirmation()))
}

fn get_header<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, InteractionError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(InteractionError::MissingHeader(name))
}
