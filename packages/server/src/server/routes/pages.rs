use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::Deserialize;

use super::validation::{validate_options, validate_url};
use crate::domains::pages::models::{CaptureOptions, PageResult};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ProcessPageRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: CaptureOptions,
}

/// Capture and fully analyse one URL, waiting for the result.
///
/// Page-level failures still answer 200 with `success: false`.
pub async fn process_page_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<ProcessPageRequest>, JsonRejection>,
) -> Result<Json<PageResult>, ApiError> {
    let Json(request) = payload?;
    let url = validate_url(&request.url)?;
    let options = validate_options(request.options, &state.config)?;

    Ok(Json(state.jobs.process_single(&url, options).await))
}
