//! `POST /api/publish` - push a section into the shop's live theme.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use section_forge_core::ShopDomain;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::handoff::parse_shop;
use crate::error::AppError;
use crate::services::{normalize_schema, publish_section};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct PublishRequest {
    shop: Option<String>,
    liquid_code: Option<String>,
    #[serde(default)]
    schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(super) struct PublishResponse {
    success: bool,
    message: String,
    filename: String,
    shop: ShopDomain,
    asset: serde_json::Value,
}

#[instrument(skip_all)]
pub(super) async fn publish(
    State(state): State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, AppError> {
    let access_token = state.config().publish_token()?;
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (Some(shop), Some(liquid_code)) = (
        body.shop.filter(|s| !s.trim().is_empty()),
        body.liquid_code.filter(|l| !l.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Missing required fields: shop, liquid_code, schema".to_string(),
        ));
    };
    let shop = parse_shop(&shop)?;
    let schema = normalize_schema(body.schema)?;

    let published =
        publish_section(state.shopify(), &shop, access_token, &liquid_code, &schema).await?;

    Ok(Json(PublishResponse {
        success: true,
        message: "Section published to the live theme".to_string(),
        filename: published.filename,
        shop,
        asset: published.asset,
    }))
}
