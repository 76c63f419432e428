//! Job manager: creates batch jobs and drives them to completion.
//!
//! ```text
//! create_job(urls)
//!     │
//!     └─► tokio::spawn(process_job)
//!             ├─► for each URL, strictly in order:
//!             │       PageProcessor::process → push_result → publish(page-complete)
//!             └─► finish → broadcaster.finish(finished)
//! ```
//!
//! URLs of one job never run concurrently, which bounds each job to one
//! collaborator process at a time. Separate jobs interleave freely.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::broadcaster::{EventBroadcaster, Subscription};
use super::error::JobError;
use super::events::JobEvent;
use super::job::{BatchJob, JobSnapshot};
use super::job_store::JobStore;
use crate::domains::pages::models::{resolve_roles, AnalysisRole, CaptureOptions, PageResult};
use crate::domains::pages::PageProcessor;

#[derive(Clone)]
pub struct JobManager {
    store: JobStore,
    broadcaster: EventBroadcaster,
    processor: Arc<dyn PageProcessor>,
}

impl JobManager {
    pub fn new(
        store: JobStore,
        broadcaster: EventBroadcaster,
        processor: Arc<dyn PageProcessor>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            processor,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    /// Register a job and start processing it in the background.
    ///
    /// Returns immediately with the new job id.
    pub fn create_job(&self, urls: Vec<String>, options: CaptureOptions) -> Result<Uuid, JobError> {
        if urls.is_empty() {
            return Err(JobError::EmptyBatch);
        }

        let job_id = self.store.insert(BatchJob::new(urls, options));
        info!(%job_id, "Job created");

        let manager = self.clone();
        tokio::spawn(async move {
            manager.process_job(job_id).await;
        });

        Ok(job_id)
    }

    pub fn subscribe(&self, job_id: Uuid) -> Result<Subscription, JobError> {
        self.broadcaster.subscribe(job_id)
    }

    pub fn snapshot(&self, job_id: Uuid) -> Result<JobSnapshot, JobError> {
        self.store.snapshot(job_id).ok_or(JobError::NotFound(job_id))
    }

    /// Process every URL of a job in order, then finish it.
    ///
    /// Every URL yields exactly one result; nothing aborts the batch.
    pub async fn process_job(&self, job_id: Uuid) {
        let Some((urls, options)) = self
            .store
            .read_job(job_id, |job| (job.urls.clone(), job.options))
        else {
            warn!(%job_id, "Job vanished before processing started");
            return;
        };

        let roles = resolve_roles(&urls);
        let total = urls.len();

        for (position, (url, role)) in urls.iter().zip(roles).enumerate() {
            info!(%job_id, url = %url, %role, page = position + 1, total, "Processing page");
            let result = self.process_page(url, role, options).await;

            let index = self
                .store
                .with_job(job_id, |job| job.push_result(result.clone()))
                .flatten();
            match index {
                Some(index) => {
                    self.broadcaster.publish(
                        job_id,
                        &JobEvent::PageComplete {
                            job_id,
                            index,
                            result,
                        },
                    );
                }
                None => warn!(%job_id, url = %url, "Result dropped, job no longer accepts results"),
            }
        }

        let terminal = self.store.with_job(job_id, |job| job.finish()).flatten();
        if let Some(event) = terminal {
            if let JobEvent::Finished { duration_ms, total_completed, .. } = &event {
                info!(%job_id, total_completed, duration_ms, "Job finished");
            }
            self.broadcaster.finish(job_id, &event);
        }
    }

    /// Single page outside any batch, always with the full role.
    pub async fn process_single(&self, url: &str, options: CaptureOptions) -> PageResult {
        self.process_page(url, AnalysisRole::Full, options).await
    }

    /// Run the processor on its own task so a panic becomes a failed page.
    async fn process_page(&self, url: &str, role: AnalysisRole, options: CaptureOptions) -> PageResult {
        let processor = Arc::clone(&self.processor);
        let owned_url = url.to_string();
        let handle = tokio::spawn(async move { processor.process(&owned_url, role, &options).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(url, error = %e, "Page processing aborted");
                PageResult::failure(url, format!("Page processing aborted: {}", e))
            }
        }
    }
}
