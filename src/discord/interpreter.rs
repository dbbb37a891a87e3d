//! Discord effect interpreter over the REST API.
//!
//! Maps each [`DiscordEffect`] to its endpoint and decodes the ids Discord
//! returns. Rate limits are retried inside [`DiscordClient::request`].

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::effects::{ChannelType, DiscordEffect, DiscordInterpreter, DiscordResponse};
use crate::types::{MessageId, RoleId, Snowflake, ThreadId};

use super::client::DiscordClient;
use super::error::DiscordApiError;

#[derive(Debug, Deserialize)]
struct Created {
    id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "type")]
    kind: u8,
}

impl DiscordInterpreter for DiscordClient {
    type Error = DiscordApiError;

    async fn interpret(&self, effect: DiscordEffect) -> Result<DiscordResponse, Self::Error> {
        interpret_discord_effect(self, effect).await
    }
}

pub async fn interpret_discord_effect(
    client: &DiscordClient,
    effect: DiscordEffect,
) -> Result<DiscordResponse, DiscordApiError> {
    match effect {
        DiscordEffect::CreateMessage { channel, payload } => {
            let created: Created = client
                .request_json(
                    Method::POST,
                    &format!("/channels/{channel}/messages"),
                    Some(&payload.to_json()),
                )
                .await?;
            Ok(DiscordResponse::MessageCreated {
                id: MessageId(created.id),
            })
        }

        DiscordEffect::EditMessage {
            channel,
            message,
            payload,
        } => {
            client
                .request(
                    Method::PATCH,
                    &format!("/channels/{channel}/messages/{message}"),
                    Some(&payload.to_json()),
                )
                .await?;
            Ok(DiscordResponse::Done)
        }

        DiscordEffect::CrosspostMessage { channel, message } => {
            client
                .request(
                    Method::POST,
                    &format!("/channels/{channel}/messages/{message}/crosspost"),
                    None,
                )
                .await?;
            Ok(DiscordResponse::Done)
        }

        DiscordEffect::GetChannelType { channel } => {
            let fetched: Channel = client
                .request_json(Method::GET, &format!("/channels/{channel}"), None)
                .await?;
            Ok(DiscordResponse::ChannelType(ChannelType::from_code(
                fetched.kind,
            )))
        }

        DiscordEffect::CreateRole { guild, name } => {
            let created: Created = client
                .request_json(
                    Method::POST,
                    &format!("/guilds/{guild}/roles"),
                    Some(&json!({ "name": name })),
                )
                .await?;
            Ok(DiscordResponse::RoleCreated {
                id: RoleId(created.id),
            })
        }

        DiscordEffect::DeleteRole { guild, role } => {
            client
                .request(Method::DELETE, &format!("/guilds/{guild}/roles/{role}"), None)
                .await?;
            Ok(DiscordResponse::Done)
        }

        DiscordEffect::AddMemberToRole { guild, user, role } => {
            client
                .request(
                    Method::PUT,
                    &format!("/guilds/{guild}/members/{user}/roles/{role}"),
                    None,
                )
                .await?;
            Ok(DiscordResponse::Done)
        }

        DiscordEffect::CreateThread {
            channel,
            message,
            name,
            auto_archive_minutes,
        } => {
            let body: Value = json!({
                "name": name,
                "auto_archive_duration": auto_archive_minutes,
            });
            let created: Created = client
                .request_json(
                    Method::POST,
                    &format!("/channels/{channel}/messages/{message}/threads"),
                    Some(&body),
                )
                .await?;
            Ok(DiscordResponse::ThreadCreated {
                id: ThreadId(created.id),
            })
        }

        DiscordEffect::ArchiveAndLockThread { thread } => {
            client
                .request(
                    Method::PATCH,
                    &format!("/channels/{thread}"),
                    Some(&json!({ "archived": true, "locked": true })),
                )
                .await?;
            Ok(DiscordResponse::Done)
        }

        DiscordEffect::AddMemberToThread { thread, user } => {
            client
                .request(
                    Method::PUT,
                    &format!("/channels/{thread}/thread-members/{user}"),
                    None,
                )
                .await?;
            Ok(DiscordResponse::Done)
        }
    }
}
