//! Publish a generated section into a shop's live theme.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use section_forge_core::ShopDomain;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::landing::escape_json_braces;
use crate::shopify::ShopifyClient;

/// Result of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishedSection {
    /// Theme asset key, e.g. `sections/landing-1735689600000.liquid`.
    pub filename: String,
    /// Asset descriptor returned by Shopify.
    pub asset: serde_json::Value,
}

/// Theme asset key for a section created at `now`.
#[must_use]
pub fn asset_key(now: DateTime<Utc>) -> String {
    format!("sections/landing-{}.liquid", now.timestamp_millis())
}

/// Liquid body followed by its `{% schema %}` block.
///
/// Braces inside schema strings are escaped so a default value cannot close
/// the block.
///
/// # Errors
///
/// Returns `serde_json::Error` if the schema cannot be serialized.
pub fn asset_document(
    liquid_code: &str,
    schema: &serde_json::Value,
) -> Result<String, serde_json::Error> {
    let schema = escape_json_braces(&serde_json::to_string_pretty(schema)?);
    Ok(format!(
        "{liquid_code}\n{{% schema %}}\n{schema}\n{{% endschema %}}\n"
    ))
}

/// Upload a section to the shop's main theme.
///
/// # Errors
///
/// Returns `AppError::Shopify` if the theme lookup or the upload fails,
/// carrying Shopify's error payload.
#[instrument(skip(client, access_token, liquid_code, schema), fields(shop = %shop))]
pub async fn publish_section(
    client: &ShopifyClient,
    shop: &ShopDomain,
    access_token: &SecretString,
    liquid_code: &str,
    schema: &serde_json::Value,
) -> Result<PublishedSection, AppError> {
    let document = asset_document(liquid_code, schema)
        .map_err(|e| AppError::Internal(format!("schema serialization: {e}")))?;
    let filename = asset_key(Utc::now());

    let theme_id = client.main_theme_id(shop, access_token).await?;
    let asset = client
        .put_theme_asset(shop, access_token, theme_id, &filename, &document)
        .await?;

    info!(theme_id, filename = %filename, "Published section");

    Ok(PublishedSection { filename, asset })
}
