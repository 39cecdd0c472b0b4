//! Shopify integration: OAuth install flow and theme asset publishing.
//!
//! # Architecture
//!
//! - [`ShopifyClient`] talks to a shop's OAuth endpoints and the Admin REST
//!   API (themes and assets). It is shop-agnostic: every call names the shop.
//! - [`oauth`] builds and verifies the signed `state` parameter and the
//!   callback HMAC.
//!
//! # Example
//!
//! ```rust,ignore
//! use section_forge_server::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new("2025-01");
//!
//! let theme_id = client.main_theme_id(&shop, &token).await?;
//! let asset = client
//!     .put_theme_asset(&shop, &token, theme_id, "sections/landing.liquid", &body)
//!     .await?;
//! ```

mod client;
pub mod oauth;

pub use client::{AccessToken, ShopifyClient};

use thiserror::Error;

/// Errors that can occur when interacting with Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The authorization code could not be exchanged for a token.
    #[error("Token exchange failed: {0}")]
    OAuth(String),

    /// The Admin API answered with a non-success status.
    #[error("Admin API error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error payload returned by Shopify.
        detail: serde_json::Value,
    },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The store has no published (`main`) theme.
    #[error("No main theme found for {0}")]
    NoMainTheme(String),
}

impl ShopifyError {
    /// Error detail safe to show to the caller.
    ///
    /// Remote payloads are Shopify's own messages; transport errors are
    /// summarized without URLs.
    #[must_use]
    pub fn public_detail(&self) -> serde_json::Value {
        match self {
            Self::Api { detail, .. } => detail.clone(),
            Self::OAuth(detail) => serde_json::Value::String(detail.clone()),
            Self::Http(e) if e.is_timeout() => "Shopify request timed out".into(),
            Self::Http(_) => "Shopify request failed".into(),
            other => other.to_string().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::OAuth("invalid_request".to_string());
        assert_eq!(err.to_string(), "Token exchange failed: invalid_request");

        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }

    #[test]
    fn test_api_error_exposes_remote_payload() {
        let err = ShopifyError::Api {
            status: 422,
            detail: serde_json::json!({"errors": {"asset": ["is invalid"]}}),
        };
        assert_eq!(
            err.public_detail(),
            serde_json::json!({"errors": {"asset": ["is invalid"]}})
        );
    }
}
