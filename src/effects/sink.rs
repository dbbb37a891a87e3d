//! Typed front end over a [`DiscordInterpreter`].
//!
//! Each method builds one effect, runs it, and checks that the response has
//! the expected shape, so callers deal in ids instead of response enums.

use std::fmt::Display;

use thiserror::Error;

use super::discord::{ChannelType, DiscordEffect, DiscordResponse};
use super::interpreter::DiscordInterpreter;
use crate::render::MessagePayload;
use crate::types::{ChannelId, GuildId, MessageId, RoleId, ThreadId, UserId};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} returned an unexpected response: {response:?}")]
    UnexpectedResponse {
        operation: &'static str,
        response: DiscordResponse,
    },
}

impl SinkError {
    pub fn operation(&self) -> &'static str {
        match self {
            SinkError::Failed { operation, .. } | SinkError::UnexpectedResponse { operation, .. } => {
                operation
            }
        }
    }
}

pub struct Sink<'a, D> {
    interpreter: &'a D,
}

impl<'a, D> Sink<'a, D>
where
    D: DiscordInterpreter + Sync,
    D::Error: Display,
{
    pub fn new(interpreter: &'a D) -> Self {
        Sink { interpreter }
    }

    async fn run(&self, effect: DiscordEffect) -> Result<DiscordResponse, SinkError> {
        let operation = effect.kind();
        self.interpreter
            .interpret(effect)
            .await
            .map_err(|e| SinkError::Failed {
                operation,
                message: e.to_string(),
            })
    }

    async fn run_unit(&self, effect: DiscordEffect) -> Result<(), SinkError> {
        let operation = effect.kind();
        match self.run(effect).await? {
            DiscordResponse::Done => Ok(()),
            response => Err(SinkError::UnexpectedResponse {
                operation,
                response,
            }),
        }
    }

    pub async fn create_message(
        &self,
        channel: ChannelId,
        payload: MessagePayload,
    ) -> Result<MessageId, SinkError> {
        match self.run(DiscordEffect::CreateMessage { channel, payload }).await? {
            DiscordResponse::MessageCreated { id } => Ok(id),
            response => Err(SinkError::UnexpectedResponse {
                operation: "create_message",
                response,
            }),
        }
    }

    pub async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        payload: MessagePayload,
    ) -> Result<(), SinkError> {
        self.run_unit(DiscordEffect::EditMessage {
            channel,
            message,
            payload,
        })
        .await
    }

    pub async fn crosspost_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), SinkError> {
        self.run_unit(DiscordEffect::CrosspostMessage { channel, message })
            .await
    }

    pub async fn get_channel_type(&self, channel: ChannelId) -> Result<ChannelType, SinkError> {
        match self.run(DiscordEffect::GetChannelType { channel }).await? {
            DiscordResponse::ChannelType(kind) => Ok(kind),
            response => Err(SinkError::UnexpectedResponse {
                operation: "get_channel_type",
                response,
            }),
        }
    }

    pub async fn create_role(&self, guild: GuildId, name: String) -> Result<RoleId, SinkError> {
        match self.run(DiscordEffect::CreateRole { guild, name }).await? {
            DiscordResponse::RoleCreated { id } => Ok(id),
            response => Err(SinkError::UnexpectedResponse {
                operation: "create_role",
                response,
            }),
        }
    }

    pub async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<(), SinkError> {
        self.run_unit(DiscordEffect::DeleteRole { guild, role }).await
    }

    pub async fn create_thread(
        &self,
        channel: ChannelId,
        message: MessageId,
        name: String,
        auto_archive_minutes: u32,
    ) -> Result<ThreadId, SinkError> {
        let effect = DiscordEffect::CreateThread {
            channel,
            message,
            name,
            auto_archive_minutes,
        };
        match self.run(effect).await? {
            DiscordResponse::ThreadCreated { id } => Ok(id),
            response => Err(SinkError::UnexpectedResponse {
                operation: "create_thread",
                response,
            }),
        }
    }

    pub async fn archive_and_lock_thread(&self, thread: ThreadId) -> Result<(), SinkError> {
        self.run_unit(DiscordEffect::ArchiveAndLockThread { thread })
            .await
    }

    pub async fn add_member_to_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), SinkError> {
        self.run_unit(DiscordEffect::AddMemberToRole { guild, user, role })
            .await
    }

    pub async fn add_member_to_thread(
        &self,
        thread: ThreadId,
        user: UserId,
    ) -> Result<(), SinkError> {
        self.run_unit(DiscordEffect::AddMemberToThread { thread, user })
            .await
    }
}
