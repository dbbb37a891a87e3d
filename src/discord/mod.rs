//! Discord REST client and effect interpreter.
//!
//! Key implementation details:
//! - Bot-token authentication against API v10
//! - Snowflakes decoded from their string form
//! - Rate-limited (429) requests re-sent after `retry_after`; nothing else
//!   is retried

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::{DEFAULT_API_BASE, DiscordClient};
pub use error::{DiscordApiError, DiscordErrorKind};
pub use interpreter::interpret_discord_effect;
pub use retry::{RetryConfig, retry_with_backoff};
