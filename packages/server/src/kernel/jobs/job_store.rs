//! In-memory job table shared by the job manager and the event broadcaster.
//!
//! Lives for the process lifetime; nothing is persisted. Finished jobs
//! without subscribers are evicted by [`JobStore::evict_finished`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::job::{BatchJob, JobSnapshot};

/// Cloneable handle to the process-wide job table.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, BatchJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: BatchJob) -> Uuid {
        let id = job.id;
        self.jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, job);
        id
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&id)
    }

    /// Run `f` against a job under the table's read lock.
    pub fn read_job<R>(&self, id: Uuid, f: impl FnOnce(&BatchJob) -> R) -> Option<R> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .map(f)
    }

    /// Run `f` against a job under the table's write lock.
    ///
    /// `f` must not call back into the store.
    pub fn with_job<R>(&self, id: Uuid, f: impl FnOnce(&mut BatchJob) -> R) -> Option<R> {
        self.jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&id)
            .map(f)
    }

    pub fn snapshot(&self, id: Uuid) -> Option<JobSnapshot> {
        self.read_job(id, BatchJob::snapshot)
    }

    /// Number of tracked jobs, finished or not.
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of jobs still processing URLs.
    pub fn active_count(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|job| !job.is_finished())
            .count()
    }

    /// Remove finished jobs nobody observes that finished over `retention` ago.
    pub fn evict_finished(&self, retention: Duration) -> usize {
        // Retention too large to represent: nothing ever expires
        let Ok(retention) = chrono::Duration::from_std(retention) else {
            return 0;
        };
        let now = Utc::now();
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();
        jobs.retain(|_, job| {
            let expired = job
                .finished_at
                .map(|at| now - at >= retention)
                .unwrap_or(false);
            !(expired && job.subscriber_count() == 0)
        });
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::pages::models::CaptureOptions;

    fn job() -> BatchJob {
        BatchJob::new(vec!["https://x.com/".into()], CaptureOptions::default())
    }

    #[test]
    fn insert_and_snapshot() {
        let store = JobStore::new();
        let id = store.insert(job());
        assert!(store.contains(id));
        assert_eq!(store.snapshot(id).unwrap().total, 1);
        assert!(store.snapshot(Uuid::new_v4()).is_none());
    }

    #[test]
    fn with_job_mutates_in_place() {
        let store = JobStore::new();
        let id = store.insert(job());
        store.with_job(id, |job| job.finish());
        assert_eq!(store.active_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn eviction_keeps_running_and_recent_jobs() {
        let store = JobStore::new();
        let running = store.insert(job());
        let finished = store.insert(job());
        store.with_job(finished, |job| job.finish());

        assert_eq!(store.evict_finished(Duration::from_secs(3600)), 0);
        assert_eq!(store.evict_finished(Duration::ZERO), 1);
        assert!(store.contains(running));
        assert!(!store.contains(finished));
    }
}
