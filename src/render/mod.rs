//! Pure rendering of incidents into Discord message payloads.
//!
//! Nothing in here performs I/O. The reconciler hands the resulting
//! [`MessagePayload`]s to the Discord sink.

pub mod components;
pub mod severity;
pub mod view;

pub use components::{Button, ButtonStyle, Component, MessagePayload};
pub use severity::Severity;
pub use view::{
    announcement, full_view, opt_in_confirmation, opt_in_custom_id, parse_opt_in_custom_id,
    thread_update, update_view,
};
