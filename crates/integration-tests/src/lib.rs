//! Integration test support for Section Forge.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, so no
//! server needs to be running. Shopify is replaced by a `wiremock` server
//! through [`ShopifyClient::with_origin`].
//!
//! # Running Tests
//!
//! ```bash
//! # Everything that needs no database
//! cargo test -p section-forge-integration-tests
//!
//! # Database-backed tests
//! DATABASE_URL=postgres://... cargo test -p section-forge-integration-tests -- --include-ignored
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::IpAddr;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use section_forge_server::{
    AppState, ServerConfig,
    config::ShopifyConfig,
    db::{Database, MIGRATOR},
    shopify::ShopifyClient,
};
use sha2::Sha256;
use tower::ServiceExt;

pub const API_KEY: &str = "test-client-id";
pub const API_SECRET: &str = "shpss_3f9a1c7e2b5d8046";
pub const PUBLIC_URL: &str = "https://forge.test";
pub const SHOP: &str = "demo-store.myshopify.com";
pub const API_VERSION: &str = "2025-01";

/// Configuration with no Shopify credentials and no public URL.
#[must_use]
pub fn bare_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://127.0.0.1:1/unreachable"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        public_url: None,
        finish_url: None,
        shopify: ShopifyConfig {
            api_version: API_VERSION.to_string(),
            ..ShopifyConfig::default()
        },
        sweep_interval: Duration::from_secs(60),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Configuration with every credential set.
#[must_use]
pub fn full_config() -> ServerConfig {
    let mut config = bare_config();
    config.public_url = Some(PUBLIC_URL.to_string());
    config.shopify = ShopifyConfig {
        api_key: Some(API_KEY.to_string()),
        api_secret: Some(SecretString::from(API_SECRET)),
        scopes: Some("write_themes,read_products".to_string()),
        access_token: Some(SecretString::from("shpat_static_publish_token")),
        api_version: API_VERSION.to_string(),
    };
    config
}

/// Router over `config`, with Shopify at `shopify_origin` if given.
#[must_use]
pub fn router(config: ServerConfig, shopify_origin: Option<&str>) -> Router {
    let db = Database::new(config.database_url.clone());
    router_with_db(config, db, shopify_origin)
}

/// Router over an explicit database gateway.
#[must_use]
pub fn router_with_db(config: ServerConfig, db: Database, shopify_origin: Option<&str>) -> Router {
    let shopify = shopify_origin.map_or_else(
        || ShopifyClient::new(API_VERSION.to_string()),
        |origin| ShopifyClient::with_origin(API_VERSION.to_string(), origin.to_string()),
    );
    section_forge_server::app(AppState::with_parts(config, db, shopify))
}

/// Send one request through the router.
///
/// # Panics
///
/// Panics if the router fails, which an axum router never does.
pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.expect("router is infallible")
}

/// `GET uri`.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

/// `POST uri` with a JSON body.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Response body as text.
///
/// # Panics
///
/// Panics if the body is not UTF-8.
pub async fn text_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// The `Location` header.
///
/// # Panics
///
/// Panics if the response is not a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
        .to_string()
}

/// Shopify-style `hmac` over sorted `key=value` pairs.
///
/// # Panics
///
/// Never: HMAC accepts keys of any length.
#[must_use]
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut pairs = params.to_vec();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A migrated test database, or `None` if `DATABASE_URL` is unset.
///
/// # Panics
///
/// Panics if the database is configured but unreachable or migrations fail.
pub async fn test_database() -> Option<(Database, SecretString)> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let url = SecretString::from(url);
    let pool = section_forge_server::db::create_pool(&url)
        .await
        .expect("connect to DATABASE_URL");
    MIGRATOR.run(&pool).await.expect("run migrations");
    Some((Database::from_pool(pool), url))
}
