//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (every minute)
//!     │
//!     └─► JobStore::evict_finished(retention)
//!             └─► drops finished jobs with no subscribers left
//! ```

use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::kernel::jobs::JobStore;

/// Start all scheduled tasks
pub async fn start_scheduler(store: JobStore, retention: Duration) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Job table eviction - runs every minute
    let eviction_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let store = store.clone();
        Box::pin(async move {
            run_eviction(&store, retention);
        })
    })?;

    scheduler.add(eviction_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started");
    Ok(scheduler)
}

/// Evict expired jobs, returning how many were removed.
pub fn run_eviction(store: &JobStore, retention: Duration) -> usize {
    let evicted = store.evict_finished(retention);
    if evicted > 0 {
        tracing::info!(evicted, remaining = store.len(), "Evicted finished jobs");
    }
    evicted
}
