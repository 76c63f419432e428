//! Application setup and server configuration.

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::domains::pages::pipeline::SCREENSHOTS_ROUTE;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    create_job_handler, health_handler, job_status_handler, process_page_handler, stream_handler,
};

/// Shared application state
pub type AppState = ServerDeps;

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    // CORS configuration - allow any origin for the operator UI
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let screenshots = ServeDir::new(&deps.config.screenshot_output_dir);

    Router::new()
        .route("/api/jobs", post(create_job_handler))
        .route("/api/jobs/{job_id}", get(job_status_handler))
        .route("/api/jobs/{job_id}/events", get(stream_handler))
        .route("/api/pages", post(process_page_handler))
        // Health check
        .route("/health", get(health_handler))
        // Segmented screenshots written by the capture tool
        .nest_service(SCREENSHOTS_ROUTE, screenshots)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(deps))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
