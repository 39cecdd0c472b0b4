//! HTTP routes for the generation service.

mod generate;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub use generate::generate;

/// Photos arrive inline as base64.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

async fn health() -> &'static str {
    "ok"
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
