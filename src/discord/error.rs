//! Discord API error types.
//!
//! Errors are classified for retry decisions:
//!
//! - **RateLimited** (HTTP 429): the request was not executed, so it is safe
//!   to re-send after `retry_after`.
//! - **Transient** (5xx, network errors): may or may not have been applied.
//!   Not retried, since re-sending a message create could duplicate it.
//! - **Permanent** (other 4xx, undecodable responses).

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Upper bound on a server-requested rate-limit wait.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscordErrorKind {
    RateLimited,
    Transient,
    Permanent,
}

impl DiscordErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, DiscordErrorKind::RateLimited)
    }
}

#[derive(Debug, Error)]
pub struct DiscordApiError {
    pub kind: DiscordErrorKind,

    pub status_code: Option<u16>,

    pub message: String,

    /// How long Discord asked us to wait, for rate-limited responses.
    pub retry_after: Option<Duration>,

    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for DiscordApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Discord API error (HTTP {}): {}", code, self.message),
            None => write!(f, "Discord API error: {}", self.message),
        }
    }
}

/// The JSON error body Discord returns alongside non-2xx statuses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<u64>,
    /// Seconds, possibly fractional.
    #[serde(default)]
    retry_after: Option<f64>,
}

impl DiscordApiError {
    pub fn rate_limited(message: impl Into<String>, retry_after: Duration) -> Self {
        Self {
            kind: DiscordErrorKind::RateLimited,
            status_code: Some(429),
            message: message.into(),
            retry_after: Some(retry_after),
            source: None,
        }
    }

    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: DiscordErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            retry_after: None,
            source: None,
        }
    }

    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: DiscordErrorKind::Transient,
            status_code: None,
            message: message.into(),
            retry_after: None,
            source: None,
        }
    }

    /// Classifies a transport-level failure (no response received).
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            DiscordErrorKind::Transient
        } else {
            DiscordErrorKind::Permanent
        };

        Self {
            kind,
            status_code: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            retry_after: None,
            source: Some(err),
        }
    }

    /// Classifies a non-2xx response from its status and body.
    ///
    /// `retry_after_header` is the `Retry-After` header in seconds, used when
    /// the body does not carry its own `retry_after`.
    pub fn from_response(status: u16, body: &[u8], retry_after_header: Option<f64>) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let message = match (parsed.message, parsed.code) {
            (Some(message), Some(code)) => format!("{message} (code {code})"),
            (Some(message), None) => message,
            (None, _) => String::from_utf8_lossy(body).trim().to_string(),
        };

        let kind = match status {
            429 => DiscordErrorKind::RateLimited,
            500..=599 => DiscordErrorKind::Transient,
            _ => DiscordErrorKind::Permanent,
        };

        let retry_after = match kind {
            DiscordErrorKind::RateLimited => parsed
                .retry_after
                .or(retry_after_header)
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(|secs| Duration::from_secs_f64(secs.min(MAX_RETRY_AFTER.as_secs_f64()))),
            _ => None,
        };

        Self {
            kind,
            status_code: Some(status),
            message,
            retry_after,
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_body_is_parsed() {
        let body = br#"{"message": "You are being rate limited.", "retry_after": 0.25, "global": false}"#;
        let err = DiscordApiError::from_response(429, body, None);

        assert_eq!(err.kind, DiscordErrorKind::RateLimited);
        assert!(err.kind.is_retriable());
        assert_eq!(err.retry_after, Some(Duration::from_millis(250)));
        assert_eq!(err.message, "You are being rate limited.");
    }

    #[test]
    fn oversized_retry_after_is_capped() {
        let body = br#"{"message": "x", "retry_after": 1e30}"#;
        let err = DiscordApiError::from_response(429, body, None);
        assert_eq!(err.retry_after, Some(MAX_RETRY_AFTER));

        let err = DiscordApiError::from_response(429, b"", Some(f64::MAX));
        assert_eq!(err.retry_after, Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn invalid_retry_after_is_ignored() {
        let err = DiscordApiError::from_response(429, br#"{"retry_after": -1.0}"#, None);
        assert_eq!(err.retry_after, None);

        let err = DiscordApiError::from_response(429, b"", Some(f64::NAN));
        assert_eq!(err.retry_after, None);
    }

    #[test]
    fn rate_limit_falls_back_to_header() {
        let err = DiscordApiError::from_response(429, b"", Some(2.0));
        assert_eq!(err.retry_after, Some(Duration::from_secs(2)));
    }

    #[test]
    fn client_errors_are_permanent() {
        let body = br#"{"message": "Unknown Message", "code": 10008}"#;
        let err = DiscordApiError::from_response(404, body, None);

        assert_eq!(err.kind, DiscordErrorKind::Permanent);
        assert!(!err.kind.is_retriable());
        assert_eq!(err.retry_after, None);
        assert_eq!(
            err.to_string(),
            "Discord API error (HTTP 404): Unknown Message (code 10008)"
        );
    }

    #[test]
    fn server_errors_are_transient_but_not_retried() {
        let err = DiscordApiError::from_response(502, b"Bad Gateway", None);
        assert_eq!(err.kind, DiscordErrorKind::Transient);
        assert!(!err.kind.is_retriable());
        assert_eq!(err.message, "Bad Gateway");
    }
}
