//! `POST /api/generate` - render a landing page.

use axum::{
    Json,
    extract::rejection::JsonRejection,
};
use tracing::instrument;

use crate::error::AppError;
use crate::landing::{GenerateRequest, LandingPage, RenderedSection};

#[instrument(skip_all)]
pub(super) async fn generate(
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<RenderedSection>, AppError> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let page = LandingPage::from_request(request)?;
    let rendered = page.render()?;

    tracing::info!(
        product = %page.name,
        variants = page.variants.len(),
        "Rendered landing page"
    );
    Ok(Json(rendered))
}
