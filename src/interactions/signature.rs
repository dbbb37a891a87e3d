//! Discord interaction signature verification using Ed25519.
//!
//! Discord signs every interaction request with the application's private
//! key. The signature covers the `X-Signature-Timestamp` header value
//! followed by the raw body, and arrives hex-encoded in
//! `X-Signature-Ed25519`. Requests must be verified before the body is
//! parsed; Discord periodically sends bad signatures to check this.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("public key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("public key must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("public key is not a valid Ed25519 point")]
    InvalidKey,
}

/// Parses the application public key from the developer portal (64 hex chars).
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, SignatureError> {
    let bytes = hex::decode(hex_key.trim())?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::InvalidKey)
}

/// Decodes an `X-Signature-Ed25519` header value.
///
/// Returns `None` for anything that is not exactly 64 hex-encoded bytes.
/// Never panics.
pub fn parse_signature_header(header: &str) -> Option<Signature> {
    let bytes = hex::decode(header.trim()).ok()?;
    let bytes: [u8; 64] = bytes.as_slice().try_into().ok()?;
    Some(Signature::from_bytes(&bytes))
}

fn signed_message(timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);
    message
}

/// Checks `signature` over `timestamp || body`.
pub fn verify_signature(
    key: &VerifyingKey,
    timestamp: &str,
    body: &[u8],
    signature: &Signature,
) -> bool {
    key.verify(&signed_message(timestamp, body), signature).is_ok()
}

/// Produces the header value Discord would send. Used by tests and local tooling.
pub fn sign_request(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
    hex::encode(key.sign(&signed_message(timestamp, body)).to_bytes())
}
