//! HTTP client for a shop's OAuth endpoints and the Admin REST API.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use section_forge_core::ShopDomain;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::ShopifyError;

/// A token returned by the OAuth code exchange.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct AccessToken {
    /// The access token (redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes as returned by Shopify (comma-separated).
    pub scope: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Body of the token endpoint, success or failure.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    scope: String,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThemesResponse {
    #[serde(default)]
    themes: Vec<Theme>,
}

#[derive(Debug, Deserialize)]
struct Theme {
    id: i64,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Serialize)]
struct AssetUpload<'a> {
    asset: AssetBody<'a>,
}

#[derive(Debug, Serialize)]
struct AssetBody<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    asset: serde_json::Value,
}

/// Shopify client.
///
/// Shop-agnostic and cheap to clone; every call names the target shop.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_version: String,
    /// Replaces `https://{shop}` for every request when set.
    origin: Option<String>,
}

impl ShopifyClient {
    /// Create a new client for the given Admin API version.
    #[must_use]
    pub fn new(api_version: impl Into<String>) -> Self {
        Self::build(api_version.into(), None)
    }

    /// Create a client that sends every request to `origin` instead of the
    /// shop's own host. Used to point the client at a local double.
    #[must_use]
    pub fn with_origin(api_version: impl Into<String>, origin: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self::build(api_version.into(), Some(origin))
    }

    fn build(api_version: String, origin: Option<String>) -> Self {
        Self {
            inner: Arc::new(ShopifyClientInner {
                client: reqwest::Client::new(),
                api_version,
                origin,
            }),
        }
    }

    fn origin(&self, shop: &ShopDomain) -> String {
        self.inner
            .origin
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    fn admin_url(&self, shop: &ShopDomain, path: &str) -> String {
        format!(
            "{}/admin/api/{}/{path}",
            self.origin(shop),
            self.inner.api_version
        )
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Build the shop's OAuth authorization URL.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Url` if the configured origin is not a valid URL.
    pub fn authorization_url(
        &self,
        shop: &ShopDomain,
        api_key: &str,
        scopes: &str,
        redirect_uri: &str,
        state: &str,
    ) -> Result<Url, ShopifyError> {
        let base = format!("{}/admin/oauth/authorize", self.origin(shop));
        let url = Url::parse_with_params(
            &base,
            &[
                ("client_id", api_key),
                ("scope", scopes),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify answers with a non-success
    /// status, an `error` field, or no token. The message carries Shopify's
    /// `error_description` when available.
    /// Returns `ShopifyError::Http` if the request fails.
    #[instrument(skip(self, api_secret, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        api_key: &str,
        api_secret: &SecretString,
        code: &str,
    ) -> Result<AccessToken, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.origin(shop));

        let params = [
            ("client_id", api_key),
            ("client_secret", api_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body: Option<TokenResponse> = serde_json::from_str(&text).ok();

        if let Some(body) = &body
            && let Some(error) = &body.error
        {
            let detail = body.error_description.clone().unwrap_or_else(|| error.clone());
            return Err(ShopifyError::OAuth(detail));
        }

        if !status.is_success() {
            let detail = if text.trim().is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                text
            };
            return Err(ShopifyError::OAuth(detail));
        }

        let body = body.ok_or_else(|| ShopifyError::OAuth("Unreadable token response".to_string()))?;
        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ShopifyError::OAuth("No access token in response".to_string()))?;

        Ok(AccessToken {
            access_token: SecretString::from(access_token),
            scope: body.scope,
        })
    }

    // =========================================================================
    // Themes
    // =========================================================================

    /// Find the id of the shop's published (`main`) theme.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Api` on a non-success status and
    /// `ShopifyError::NoMainTheme` if no theme has the `main` role.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn main_theme_id(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
    ) -> Result<i64, ShopifyError> {
        let url = self.admin_url(shop, "themes.json?role=main");

        let response = self
            .inner
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", access_token.expose_secret())
            .send()
            .await?;
        let response = check_status(response).await?;

        let themes: ThemesResponse = response.json().await?;
        themes
            .themes
            .into_iter()
            .find(|t| t.role == "main")
            .map(|t| t.id)
            .ok_or_else(|| ShopifyError::NoMainTheme(shop.to_string()))
    }

    /// Create or replace a theme asset.
    ///
    /// Returns Shopify's asset descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Api` with Shopify's error payload on a
    /// non-success status.
    #[instrument(skip(self, access_token, value), fields(shop = %shop, key = %key))]
    pub async fn put_theme_asset(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        theme_id: i64,
        key: &str,
        value: &str,
    ) -> Result<serde_json::Value, ShopifyError> {
        let url = self.admin_url(shop, &format!("themes/{theme_id}/assets.json"));

        let response = self
            .inner
            .client
            .put(&url)
            .header("X-Shopify-Access-Token", access_token.expose_secret())
            .json(&AssetUpload {
                asset: AssetBody { key, value },
            })
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: AssetResponse = response.json().await?;
        Ok(body.asset)
    }
}

/// Turn a non-success Admin API response into an error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ShopifyError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(ShopifyError::RateLimited(retry_after));
    }

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
    Err(ShopifyError::Api {
        status: status.as_u16(),
        detail,
    })
}
