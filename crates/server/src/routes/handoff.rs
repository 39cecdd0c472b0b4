//! Handoff endpoints: `POST /api/store_data` and `GET /api/get_data`.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use section_forge_core::{DataKey, ShopDomain};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::AppError;
use crate::services::{HandoffService, normalize_schema};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct StoreDataRequest {
    shop: Option<String>,
    liquid_code: Option<String>,
    #[serde(default)]
    schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(super) struct StoreDataResponse {
    success: bool,
    data_key: String,
    session_id: String,
    shop: ShopDomain,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct GetDataQuery {
    data_key: Option<String>,
    shop: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct GetDataResponse {
    success: bool,
    liquid_code: String,
    schema: serde_json::Value,
    created_at: String,
}

/// Parse a present shop parameter, rejecting malformed domains.
pub(super) fn parse_shop(raw: &str) -> Result<ShopDomain, AppError> {
    ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))
}

/// `{HOST}/api/install?shop=..&data_key=..`
fn install_url(public_url: &str, shop: &ShopDomain, data_key: &DataKey) -> Result<String, AppError> {
    let url = Url::parse_with_params(
        &format!("{public_url}/api/install"),
        &[("shop", shop.as_str()), ("data_key", data_key.as_str())],
    )
    .map_err(|e| AppError::Internal(format!("install url: {e}")))?;
    Ok(url.into())
}

/// POST /api/store_data - store a generated section for the OAuth handoff.
#[instrument(skip_all)]
pub(super) async fn store_data(
    State(state): State<AppState>,
    body: Result<Json<StoreDataRequest>, JsonRejection>,
) -> Result<Json<StoreDataResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (Some(shop), Some(liquid_code)) = (
        body.shop.filter(|s| !s.trim().is_empty()),
        body.liquid_code.filter(|l| !l.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Missing required fields: shop, liquid_code, schema".to_string(),
        ));
    };
    if body.schema.is_null() {
        return Err(AppError::BadRequest(
            "Missing required fields: shop, liquid_code, schema".to_string(),
        ));
    }

    let shop = parse_shop(&shop)?;
    let schema = normalize_schema(body.schema)?;
    let public_url = state.config().public_url()?;

    let stored = HandoffService::new(state.db())
        .store(&shop, liquid_code, schema)
        .await?;
    let redirect_url = install_url(public_url, &shop, &stored.data_key)?;

    Ok(Json(StoreDataResponse {
        success: true,
        data_key: stored.data_key.to_string(),
        session_id: stored.session_id.to_string(),
        shop,
        redirect_url,
    }))
}

/// GET /api/get_data - collect a stored section, once.
#[instrument(skip_all)]
pub(super) async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<GetDataQuery>,
) -> Result<Json<GetDataResponse>, AppError> {
    let (Some(data_key), Some(shop)) = (
        query.data_key.filter(|k| !k.trim().is_empty()),
        query.shop.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Missing required parameters: data_key, shop".to_string(),
        ));
    };

    let shop = parse_shop(&shop)?;
    // A key that cannot exist is reported like any other unknown key.
    let Ok(data_key) = DataKey::parse(data_key.trim()) else {
        return Err(AppError::not_found(
            "Data not found or expired",
            "The data_key is not one this service issued. Start again from the generator.",
        ));
    };

    let retrieved = HandoffService::new(state.db())
        .retrieve(&data_key, &shop)
        .await?;

    Ok(Json(GetDataResponse {
        success: true,
        liquid_code: retrieved.liquid_code,
        schema: retrieved.schema,
        created_at: retrieved.created_at.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_url_encodes_params() {
        let shop = ShopDomain::parse("a.myshopify.com").expect("shop");
        let key = DataKey::generate();
        let url = install_url("https://forge.test", &shop, &key).expect("url");

        assert_eq!(
            url,
            format!("https://forge.test/api/install?shop=a.myshopify.com&data_key={key}")
        );
    }

    #[test]
    fn test_parse_shop_rejects_foreign_hosts() {
        assert!(parse_shop("a.myshopify.com").is_ok());
        assert!(matches!(
            parse_shop("evil.example.com"),
            Err(AppError::BadRequest(_))
        ));
    }
}
