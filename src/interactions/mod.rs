//! Discord interaction handling: request signatures and payload types.
//!
//! The HTTP endpoint itself lives in [`crate::server`].

pub mod payload;
pub mod signature;

pub use payload::{Interaction, InteractionKind, InteractionResponse};
pub use signature::{
    SIGNATURE_HEADER, SignatureError, TIMESTAMP_HEADER, parse_public_key, parse_signature_header,
    sign_request, verify_signature,
};
