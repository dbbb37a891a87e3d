//! Inbound interaction bodies and the replies sent back.
//!
//! Only the fields this bot reads are modelled; everything else Discord sends
//! is ignored.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::render::MessagePayload;
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Ping,
    MessageComponent,
    Other(u8),
}

impl InteractionKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => InteractionKind::Ping,
            3 => InteractionKind::MessageComponent,
            other => InteractionKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    data: Option<ComponentData>,
    /// Present for interactions inside a guild.
    #[serde(default)]
    member: Option<Member>,
    /// Present for interactions in DMs.
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
struct ComponentData {
    #[serde(default)]
    custom_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Member {
    user: User,
}

#[derive(Debug, Clone, Deserialize)]
struct User {
    id: UserId,
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        InteractionKind::from_code(self.kind)
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref()?.custom_id.as_deref()
    }

    /// The user who clicked, from the guild member or the DM user.
    pub fn invoking_user(&self) -> Option<UserId> {
        self.member
            .as_ref()
            .map(|m| m.user.id)
            .or_else(|| self.user.as_ref().map(|u| u.id))
    }
}

/// A reply to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
    /// Acknowledges a PING.
    Pong,
    /// Replies with a new message (`CHANNEL_MESSAGE_WITH_SOURCE`).
    Message(MessagePayload),
}

impl InteractionResponse {
    pub fn to_json(&self) -> Value {
        match self {
            InteractionResponse::Pong => json!({ "type": 1 }),
            InteractionResponse::Message(payload) => json!({
                "type": 4,
                "data": payload.to_json(),
            }),
        }
    }
}
