//! Effects-as-data for Discord operations.
//!
//! Core logic describes what it wants done as [`DiscordEffect`] values. This
//! enables:
//! - Testability via mock interpreters that record every effect
//! - Logging of intended operations by name
//! - A single place ([`crate::discord`]) that knows the REST wire format

pub mod discord;
pub mod interpreter;
pub mod sink;

pub use discord::{ChannelType, DiscordEffect, DiscordResponse, THREAD_AUTO_ARCHIVE_MINUTES};
pub use interpreter::DiscordInterpreter;
pub use sink::{Sink, SinkError};
