use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    active_jobs: usize,
    tracked_jobs: usize,
}

/// Health check endpoint
///
/// Reports the number of jobs still processing and the size of the job table.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let store = state.store();
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_jobs: store.active_count(),
        tracked_jobs: store.len(),
    })
}
