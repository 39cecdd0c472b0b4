use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub(super) async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Connects on first use, then runs `SELECT 1`.
/// Returns 503 Service Unavailable if the database is not reachable.
pub(super) async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Ok(pool) = state.db().acquire().await else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
