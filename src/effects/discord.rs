//! Discord effect types.
//!
//! Every Discord operation the bot performs is described here as data. The
//! reconciler and the interaction server build these values; an interpreter
//! (see [`super::interpreter`]) executes them.

use crate::render::MessagePayload;
use crate::types::{ChannelId, GuildId, MessageId, RoleId, ThreadId, UserId};

/// Threads created for incidents archive after a day of inactivity.
pub const THREAD_AUTO_ARCHIVE_MINUTES: u32 = 1440;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiscordEffect {
    // ─── Messages ─────────────────────────────────────────────────────────────
    CreateMessage {
        channel: ChannelId,
        payload: MessagePayload,
    },

    /// Replaces the components of an existing message.
    EditMessage {
        channel: ChannelId,
        message: MessageId,
        payload: MessagePayload,
    },

    /// Publishes a message from an announcement channel to its followers.
    CrosspostMessage {
        channel: ChannelId,
        message: MessageId,
    },

    GetChannelType { channel: ChannelId },

    // ─── Roles ────────────────────────────────────────────────────────────────
    CreateRole { guild: GuildId, name: String },

    DeleteRole { guild: GuildId, role: RoleId },

    AddMemberToRole {
        guild: GuildId,
        user: UserId,
        role: RoleId,
    },

    // ─── Threads ──────────────────────────────────────────────────────────────
    /// Starts a public thread anchored on `message`.
    CreateThread {
        channel: ChannelId,
        message: MessageId,
        name: String,
        auto_archive_minutes: u32,
    },

    ArchiveAndLockThread { thread: ThreadId },

    AddMemberToThread { thread: ThreadId, user: UserId },
}

impl DiscordEffect {
    /// Short, stable name for logs and test assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            DiscordEffect::CreateMessage { .. } => "create_message",
            DiscordEffect::EditMessage { .. } => "edit_message",
            DiscordEffect::CrosspostMessage { .. } => "crosspost_message",
            DiscordEffect::GetChannelType { .. } => "get_channel_type",
            DiscordEffect::CreateRole { .. } => "create_role",
            DiscordEffect::DeleteRole { .. } => "delete_role",
            DiscordEffect::AddMemberToRole { .. } => "add_member_to_role",
            DiscordEffect::CreateThread { .. } => "create_thread",
            DiscordEffect::ArchiveAndLockThread { .. } => "archive_and_lock_thread",
            DiscordEffect::AddMemberToThread { .. } => "add_member_to_thread",
        }
    }
}

/// Discord channel types the bot cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    GuildText,
    GuildAnnouncement,
    Other(u8),
}

impl ChannelType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ChannelType::GuildText,
            5 => ChannelType::GuildAnnouncement,
            other => ChannelType::Other(other),
        }
    }

    pub fn supports_crosspost(self) -> bool {
        matches!(self, ChannelType::GuildAnnouncement)
    }
}

/// Response from a Discord effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordResponse {
    /// Response to `CreateMessage`.
    MessageCreated { id: MessageId },

    /// Response to `GetChannelType`.
    ChannelType(ChannelType),

    /// Response to `CreateRole`.
    RoleCreated { id: RoleId },

    /// Response to `CreateThread`.
    ThreadCreated { id: ThreadId },

    /// Any operation that returns nothing of interest.
    Done,
}
