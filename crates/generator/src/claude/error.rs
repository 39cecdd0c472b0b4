//! Ways a page generation call to Claude can fail.

use reqwest::StatusCode;
use thiserror::Error;

/// Seconds to wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER: u64 = 60;

/// A failed generation call.
///
/// The display text is what the caller of `/generate` sees after
/// `Generation failed: `.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// The request never produced a response.
    #[error("could not reach Claude: {0}")]
    Transport(#[from] reqwest::Error),

    /// Claude refused the request, typically an oversized or unreadable image.
    #[error("Claude rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The configured API key was refused.
    #[error("Claude rejected the API key")]
    Unauthorized,

    /// The API key cannot be sent as a header.
    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,

    /// A 2xx body that is not a Messages API response.
    #[error("unexpected response from Claude: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The model answered without any text.
    #[error("response contained no text")]
    EmptyResponse,
}

impl ClaudeError {
    /// Classify a non-success response.
    ///
    /// `body` is read only for statuses whose message is worth surfacing.
    #[must_use]
    pub fn from_status(status: StatusCode, retry_after: Option<&str>, body: &str) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(
                retry_after
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER),
            ),
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            _ => Self::Rejected {
                status: status.as_u16(),
                message: error_message(body).unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                }),
            },
        }
    }
}

/// `error.message` from a JSON error body, or the body itself when it is
/// not JSON.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .pointer("/error/message")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string),
        Err(_) => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_surfaces_error_message() {
        let body = r#"{
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "Image too large"}
        }"#;
        let err = ClaudeError::from_status(StatusCode::BAD_REQUEST, None, body);
        assert_eq!(
            err.to_string(),
            "Claude rejected the request (400): Image too large"
        );
    }

    #[test]
    fn test_rejected_falls_back_to_text_or_reason() {
        let err = ClaudeError::from_status(StatusCode::BAD_GATEWAY, None, "upstream down");
        assert!(matches!(
            err,
            ClaudeError::Rejected { status: 502, ref message } if message == "upstream down"
        ));

        let err = ClaudeError::from_status(StatusCode::INTERNAL_SERVER_ERROR, None, "");
        assert!(
            matches!(err, ClaudeError::Rejected { ref message, .. } if message == "Internal Server Error")
        );

        let err = ClaudeError::from_status(StatusCode::BAD_REQUEST, None, r#"{"detail":"x"}"#);
        assert!(
            matches!(err, ClaudeError::Rejected { ref message, .. } if message == "Bad Request")
        );
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        assert!(matches!(
            ClaudeError::from_status(StatusCode::TOO_MANY_REQUESTS, Some("7"), ""),
            ClaudeError::RateLimited(7)
        ));
        assert!(matches!(
            ClaudeError::from_status(StatusCode::TOO_MANY_REQUESTS, Some("soon"), ""),
            ClaudeError::RateLimited(DEFAULT_RETRY_AFTER)
        ));
    }

    #[test]
    fn test_unauthorized() {
        let err = ClaudeError::from_status(StatusCode::UNAUTHORIZED, None, "{}");
        assert!(matches!(err, ClaudeError::Unauthorized));
        assert_eq!(err.to_string(), "Claude rejected the API key");
    }
}
