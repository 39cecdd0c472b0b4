//! Unified error handling for the handler service.
//!
//! JSON endpoints answer `{"success": false, "error": ..., "hint"?: ...}`.
//! The OAuth endpoints are browser redirects and answer plain text through
//! [`TextError`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::landing::LandingError;
use crate::shopify::ShopifyError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid request fields.
    #[error("{0}")]
    BadRequest(String),

    /// Request failed an authenticity check.
    #[error("{0}")]
    Unauthorized(String),

    /// A required environment value is absent.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Resource absent, expired or already consumed.
    #[error("{message}")]
    NotFound {
        message: String,
        hint: Option<String>,
    },

    /// Shopify OAuth or Admin API call failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LandingError> for AppError {
    fn from(err: LandingError) -> Self {
        match err {
            LandingError::InvalidColor { .. } => Self::BadRequest(err.to_string()),
            LandingError::Template(e) => Self::Internal(format!("template: {e}")),
        }
    }
}

impl AppError {
    /// Not-found with a human hint.
    #[must_use]
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Configuration(_) | Self::Shopify(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Configuration(_) => "Server configuration error".to_string(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(ShopifyError::OAuth(_)) => "Token exchange failed".to_string(),
            Self::Shopify(_) => "Shopify API error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Log server-side failures; send unexpected ones to Sentry.
    fn report(&self) {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Shopify(_) => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
            }
            Self::Configuration(e) => {
                tracing::error!(error = %e, "Request rejected: server is misconfigured");
            }
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        let mut body = json!({
            "success": false,
            "error": self.public_message(),
        });
        match &self {
            Self::NotFound {
                hint: Some(hint), ..
            } => {
                body["hint"] = json!(hint);
            }
            Self::Shopify(e) => {
                body["details"] = e.public_detail();
            }
            _ => {}
        }

        (self.status(), Json(body)).into_response()
    }
}

/// Plain-text rendition of [`AppError`] for browser-facing endpoints.
#[derive(Debug)]
pub struct TextError(pub AppError);

impl From<AppError> for TextError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ConfigError> for TextError {
    fn from(err: ConfigError) -> Self {
        Self(err.into())
    }
}

impl From<ShopifyError> for TextError {
    fn from(err: ShopifyError) -> Self {
        Self(err.into())
    }
}

impl From<RepositoryError> for TextError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for TextError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.report();

        let message = match &err {
            AppError::Shopify(ShopifyError::OAuth(detail)) => {
                format!("Token exchange failed: {detail}")
            }
            other => other.public_message(),
        };

        (err.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::not_found("gone", "retry").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Configuration(ConfigError::MissingEnvVar("HOST".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_configuration_error_hides_variable_name() {
        let response =
            AppError::Configuration(ConfigError::MissingEnvVar("SHOPIFY_API_SECRET".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Server configuration error");
        assert!(!body.to_string().contains("SHOPIFY_API_SECRET"));
    }

    #[tokio::test]
    async fn test_not_found_carries_hint() {
        let body = body_json(AppError::not_found("Data not found", "Generate again").into_response())
            .await;
        assert_eq!(body["error"], "Data not found");
        assert_eq!(body["hint"], "Generate again");
    }

    #[tokio::test]
    async fn test_shopify_error_surfaces_remote_detail() {
        let err = AppError::Shopify(ShopifyError::Api {
            status: 422,
            detail: json!({"errors": "bad asset"}),
        });
        let body = body_json(err.into_response()).await;
        assert_eq!(body["details"]["errors"], "bad asset");
    }

    #[tokio::test]
    async fn test_text_error_is_plain() {
        let response = TextError::from(AppError::BadRequest("Missing shop parameter".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"Missing shop parameter");
    }

    #[tokio::test]
    async fn test_text_error_reports_token_exchange_detail() {
        let response =
            TextError::from(ShopifyError::OAuth("code already used".into())).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"Token exchange failed: code already used");
    }
}
