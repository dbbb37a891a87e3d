//! The interpreter seam between deciding on Discord effects and executing them.
//!
//! Production code uses [`crate::discord::DiscordClient`]; tests use a
//! recording mock that returns synthetic ids.

use std::future::Future;
use std::sync::Arc;

use super::discord::{DiscordEffect, DiscordResponse};

/// Executes Discord effects.
pub trait DiscordInterpreter {
    type Error;

    fn interpret(
        &self,
        effect: DiscordEffect,
    ) -> impl Future<Output = Result<DiscordResponse, Self::Error>> + Send;
}

impl<T: DiscordInterpreter + Send + Sync> DiscordInterpreter for Arc<T> {
    type Error = T::Error;

    fn interpret(
        &self,
        effect: DiscordEffect,
    ) -> impl Future<Output = Result<DiscordResponse, Self::Error>> + Send {
        (**self).interpret(effect)
    }
}
