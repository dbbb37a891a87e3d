//! Status Updates Bot - mirrors a hosted status page's incidents into a Discord channel.
//!
//! Each poll cycle fetches the provider's incidents and reconciles them
//! against a local store: new incidents get an announcement, a role, and a
//! thread; newer updates edit the announcement and post into the thread;
//! terminal incidents have their artifacts cleaned up. A small HTTP server
//! answers signed Discord interactions so members can opt in to an
//! incident's role and thread.

pub mod config;
pub mod discord;
pub mod effects;
pub mod interactions;
pub mod persistence;
pub mod reconciler;
pub mod render;
pub mod scheduler;
pub mod server;
pub mod statuspage;
pub mod types;

#[cfg(test)]
mod test_utils;
