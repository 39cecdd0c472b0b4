//! Error responses for the generation service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::claude::ClaudeError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid request fields.
    #[error("{0}")]
    BadRequest(String),

    /// The completion call failed.
    #[error("Generation failed: {0}")]
    Claude(#[from] ClaudeError),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Claude(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Claude(e) = &self {
            let event_id = sentry::capture_error(e);
            tracing::error!(
                error = %e,
                sentry_event_id = %event_id,
                "Generation failed"
            );
        }

        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claude_error_surfaces_message() {
        let response = AppError::Claude(ClaudeError::RateLimited(30)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(
            body["error"],
            "Generation failed: rate limited, retry after 30 seconds"
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
