//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health            - Liveness check
//! GET  /health/ready      - Readiness check (database reachable)
//!
//! # Rendering
//! POST /api/generate      - Render HTML, Liquid and schema from product data
//!
//! # Handoff
//! POST /api/store_data    - Store a generated section, return its data key
//! GET  /api/get_data      - Collect a stored section once
//!
//! # OAuth
//! GET  /api/install       - Redirect to the shop's OAuth screen
//! GET  /api/callback      - Exchange the code, store the token, redirect onward
//!
//! # Publishing
//! POST /api/publish       - Upload a section into the shop's main theme
//! ```
//!
//! Every response carries permissive CORS headers and any `OPTIONS` request
//! is answered with `200`.

mod generate;
mod handoff;
mod health;
mod oauth;
mod publish;

use axum::{
    Router,
    http::{HeaderValue, StatusCode, header::LOCATION},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::middleware::cors_middleware;
use crate::state::AppState;

/// Routes under `/api`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate::generate))
        .route("/store_data", post(handoff::store_data))
        .route("/get_data", get(handoff::get_data))
        .route("/install", get(oauth::install))
        .route("/callback", get(oauth::callback))
        .route("/publish", post(publish::publish))
}

/// All routes, without state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// The application router with CORS applied and state attached.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

/// `302 Found` redirect.
///
/// `axum::response::Redirect` only offers 303, 307 and 308.
fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location, "Redirect target is not a valid header value");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
