//! Shopify OAuth install flow: `GET /api/install` and `GET /api/callback`.
//!
//! Both endpoints are browser navigations, so failures are plain text.

use axum::{
    extract::{Query, RawQuery, State},
    response::Response,
};
use chrono::Utc;
use section_forge_core::{DataKey, ShopDomain};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use super::found;
use crate::config::ConfigError;
use crate::db::{ShopRepository, shops::split_scopes};
use crate::error::{AppError, TextError};
use crate::services::HandoffService;
use crate::shopify::oauth::{OAuthState, decode_state, encode_state, verify_callback_hmac};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct InstallQuery {
    shop: Option<String>,
    data_key: Option<String>,
}

fn bad_request(message: &str) -> TextError {
    TextError(AppError::BadRequest(message.to_string()))
}

fn parse_shop(raw: &str) -> Result<ShopDomain, TextError> {
    ShopDomain::parse(raw).map_err(|e| bad_request(&format!("Invalid shop: {e}")))
}

/// GET /api/install - redirect the merchant to Shopify's OAuth screen.
#[instrument(skip_all, fields(shop = tracing::field::Empty))]
pub(super) async fn install(
    State(state): State<AppState>,
    Query(query): Query<InstallQuery>,
) -> Result<Response, TextError> {
    let creds = state.config().install_credentials()?;

    let Some(shop) = query.shop.filter(|s| !s.trim().is_empty()) else {
        return Err(bad_request("Missing shop parameter"));
    };
    let shop = parse_shop(&shop)?;
    tracing::Span::current().record("shop", shop.as_str());

    let data_key = query
        .data_key
        .filter(|k| !k.trim().is_empty())
        .map(|k| DataKey::parse(k.trim()))
        .transpose()
        .map_err(|_| bad_request("Invalid data_key"))?;

    let oauth_state = OAuthState::new(data_key.as_ref(), Utc::now().timestamp());
    let signed_state = encode_state(&oauth_state, creds.api_secret)
        .map_err(|e| TextError(AppError::Internal(format!("state: {e}"))))?;

    let auth_url = state.shopify().authorization_url(
        &shop,
        creds.api_key,
        creds.scopes,
        &creds.redirect_uri,
        &signed_state,
    )?;

    info!(has_data_key = data_key.is_some(), "Redirecting to Shopify OAuth");
    Ok(found(auth_url.as_str()))
}

/// Value of the first `key` parameter.
fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.trim().is_empty())
}

/// Recover the handoff key from the state, if any.
///
/// A state that cannot be verified never fails the callback.
fn recover_data_key(
    state_param: Option<&str>,
    secret: &secrecy::SecretString,
) -> Option<DataKey> {
    let raw = state_param?;
    match decode_state(raw, secret, Utc::now().timestamp()).and_then(|s| s.data_key()) {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable OAuth state");
            None
        }
    }
}

/// `finish_url?shop=..[&data_key=..]`
fn finish_redirect(
    finish_url: &str,
    shop: &ShopDomain,
    data_key: Option<&DataKey>,
) -> Result<String, ConfigError> {
    let mut url = Url::parse(finish_url)
        .map_err(|e| ConfigError::InvalidEnvVar("FINISH_URL".to_string(), e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("shop", shop.as_str());
        if let Some(key) = data_key {
            query.append_pair("data_key", key.as_str());
        }
    }
    Ok(url.into())
}

/// GET /api/callback - finish OAuth and send the browser to the finish page.
#[instrument(skip_all, fields(shop = tracing::field::Empty))]
pub(super) async fn callback(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, TextError> {
    let params: Vec<(String, String)> =
        url::form_urlencoded::parse(raw_query.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();

    if let Some(error) = param(&params, "error") {
        let description = param(&params, "error_description").unwrap_or_default();
        warn!(error, description, "Shopify returned an OAuth error");
        return Err(bad_request(&format!("Authorization failed: {error}")));
    }

    let (Some(shop), Some(code)) = (param(&params, "shop"), param(&params, "code")) else {
        return Err(bad_request("Missing shop or code parameter"));
    };

    let config = state.config();
    let creds = config.callback_credentials()?;
    let finish_url = config.finish_url()?;

    let shop = parse_shop(shop)?;
    tracing::Span::current().record("shop", shop.as_str());

    if param(&params, "hmac").is_some() && !verify_callback_hmac(&params, creds.api_secret) {
        warn!(shop = %shop, "OAuth callback HMAC mismatch");
        return Err(TextError(AppError::Unauthorized(
            "HMAC verification failed".to_string(),
        )));
    }

    let data_key = recover_data_key(param(&params, "state"), creds.api_secret);

    let token = state
        .shopify()
        .exchange_code(&shop, creds.api_key, creds.api_secret, code)
        .await?;

    let pool = state.db().acquire().await?;
    ShopRepository::new(pool)
        .upsert(&shop, &token.access_token, &split_scopes(&token.scope))
        .await?;
    info!(shop = %shop, scope = %token.scope, "Stored shop access token");

    if let Some(key) = &data_key
        && let Err(e) = HandoffService::new(state.db())
            .mark_oauth_complete(key, &shop)
            .await
    {
        warn!(error = %e, "Failed to mark handoff oauth_complete");
    }

    let location = finish_redirect(&finish_url, &shop, data_key.as_ref())?;
    Ok(found(&location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_finish_redirect_forwards_shop_and_key() {
        let shop = ShopDomain::parse("a.myshopify.com").expect("shop");
        let key = DataKey::generate();

        let url = finish_redirect("https://forge.test/finish", &shop, Some(&key)).expect("url");
        assert_eq!(
            url,
            format!("https://forge.test/finish?shop=a.myshopify.com&data_key={key}")
        );

        let url = finish_redirect("https://forge.test/finish?lang=en", &shop, None).expect("url");
        assert_eq!(url, "https://forge.test/finish?lang=en&shop=a.myshopify.com");
    }

    #[test]
    fn test_finish_redirect_rejects_relative_url() {
        let shop = ShopDomain::parse("a.myshopify.com").expect("shop");
        assert!(matches!(
            finish_redirect("/finish", &shop, None),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_recover_data_key_degrades_to_none() {
        let secret = SecretString::from("shpss_secret");
        assert_eq!(recover_data_key(None, &secret), None);
        assert_eq!(recover_data_key(Some("garbage"), &secret), None);

        let key = DataKey::generate();
        let token = encode_state(
            &OAuthState::new(Some(&key), Utc::now().timestamp()),
            &secret,
        )
        .expect("encode");
        assert_eq!(recover_data_key(Some(&token), &secret), Some(key));
    }

    #[test]
    fn test_param_ignores_blank_values() {
        let params = vec![
            ("shop".to_string(), String::new()),
            ("code".to_string(), "abc".to_string()),
        ];
        assert_eq!(param(&params, "shop"), None);
        assert_eq!(param(&params, "code"), Some("abc"));
    }
}
