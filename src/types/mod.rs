//! Core domain types for the status updates bot.
//!
//! Provider incidents, the durable incident record, and the identifier
//! newtypes that keep Discord snowflakes from being mixed up.

pub mod ids;
pub mod incident;
pub mod record;

pub use ids::{ChannelId, GuildId, IncidentId, MessageId, RoleId, Snowflake, ThreadId, UserId};
pub use incident::{
    ComponentStatus, IncidentComponent, IncidentStatus, IncidentUpdate, OrderedIncident,
    RemoteIncident,
};
pub use record::{Artifacts, IncidentRecord};
