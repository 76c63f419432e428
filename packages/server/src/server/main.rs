// Main entry point for the segmentation server

use anyhow::{Context, Result};
use segmenter_core::kernel::scheduled_tasks::start_scheduler;
use segmenter_core::kernel::ServerDeps;
use segmenter_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,segmenter_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting page segmentation server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        project_root = %config.project_root.display(),
        python = %config.python_path,
        "Configuration loaded"
    );

    let addr = config.bind_address();
    let retention = config.job_retention;
    let deps = ServerDeps::new(config);

    // Background eviction of finished jobs
    let _scheduler = start_scheduler(deps.store().clone(), retention)
        .await
        .context("Failed to start scheduler")?;

    let app = build_app(deps);

    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
