//! Server dependencies (using traits for testability)
//!
//! Central container handed to the HTTP layer and background tasks. The
//! subprocess seam and the page-processing seam are trait objects so tests
//! can swap in scripted collaborators.

use std::sync::Arc;

use crate::config::Config;
use crate::domains::pages::{PagePipeline, PageProcessor, PipelineSettings};
use crate::kernel::jobs::{EventBroadcaster, JobManager, JobStore};
use crate::kernel::subprocess::{ProcessRunner, SubprocessRunner};

#[derive(Clone)]
pub struct ServerDeps {
    pub config: Arc<Config>,
    pub jobs: JobManager,
}

impl ServerDeps {
    /// Production wiring: real child processes.
    pub fn new(config: Config) -> Self {
        let runner = Arc::new(SubprocessRunner::new(config.subprocess_timeout));
        Self::with_runner(config, runner)
    }

    /// Real pipeline on top of the given subprocess runner.
    pub fn with_runner(config: Config, runner: Arc<dyn ProcessRunner>) -> Self {
        let pipeline = Arc::new(PagePipeline::new(runner, PipelineSettings::from(&config)));
        Self::with_processor(config, pipeline)
    }

    /// Bypass the pipeline entirely.
    pub fn with_processor(config: Config, processor: Arc<dyn PageProcessor>) -> Self {
        let store = JobStore::new();
        let broadcaster = EventBroadcaster::new(store.clone(), config.subscriber_buffer);
        Self {
            config: Arc::new(config),
            jobs: JobManager::new(store, broadcaster, processor),
        }
    }

    pub fn store(&self) -> &JobStore {
        self.jobs.store()
    }
}
