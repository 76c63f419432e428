use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_options, validate_urls};
use crate::domains::pages::models::CaptureOptions;
use crate::kernel::jobs::JobSnapshot;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub urls: Vec<String>,
    #[serde(flatten)]
    pub options: CaptureOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub total: usize,
}

/// Start a batch job. Returns as soon as the job is registered.
pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let Json(request) = payload?;
    let urls = validate_urls(&request.urls)?;
    let options = validate_options(request.options, &state.config)?;
    let total = urls.len();

    let job_id = state.jobs.create_job(urls, options)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateJobResponse {
            success: true,
            job_id,
            total,
        }),
    ))
}

/// Current progress and results of a job.
pub async fn job_status_handler(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobSnapshot>, ApiError> {
    Ok(Json(state.jobs.snapshot(job_id)?))
}
