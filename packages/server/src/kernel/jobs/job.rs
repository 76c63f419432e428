//! Batch job model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::broadcaster::Subscriber;
use super::events::JobEvent;
use crate::domains::pages::models::{CaptureOptions, PageResult};

// ============================================================================
// Enums
// ============================================================================

/// One-way lifecycle: `Started` → `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Started,
    Finished,
}

// ============================================================================
// Model
// ============================================================================

/// One batch request: a fixed URL list processed in order.
#[derive(Debug)]
pub struct BatchJob {
    pub id: Uuid,
    pub urls: Vec<String>,
    pub options: CaptureOptions,
    pub status: JobStatus,
    pub completed: Vec<PageResult>,
    pub(super) subscribers: Vec<Subscriber>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchJob {
    pub fn new(urls: Vec<String>, options: CaptureOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            urls,
            options,
            status: JobStatus::Started,
            completed: Vec::new(),
            subscribers: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn total(&self) -> usize {
        self.urls.len()
    }

    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Finished
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Milliseconds from start to finish, or to now while running.
    pub fn duration_ms(&self) -> i64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }

    /// Append a page result and return its index.
    ///
    /// Returns `None` once every URL has a result or the job is finished.
    pub fn push_result(&mut self, result: PageResult) -> Option<usize> {
        if self.is_finished() || self.completed.len() >= self.urls.len() {
            return None;
        }
        self.completed.push(result);
        Some(self.completed.len() - 1)
    }

    /// Transition to `Finished` and return the terminal event.
    ///
    /// Only the first call transitions; later calls return `None`.
    pub fn finish(&mut self) -> Option<JobEvent> {
        if self.is_finished() {
            return None;
        }
        self.status = JobStatus::Finished;
        self.finished_at = Some(Utc::now());
        Some(self.finished_event())
    }

    pub fn started_event(&self) -> JobEvent {
        JobEvent::Started {
            job_id: self.id,
            total: self.total(),
            completed: self.completed.len(),
        }
    }

    pub fn finished_event(&self) -> JobEvent {
        JobEvent::Finished {
            job_id: self.id,
            total_completed: self.completed.len(),
            duration_ms: self.duration_ms(),
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id,
            status: self.status,
            total: self.total(),
            completed_count: self.completed.len(),
            results: self.completed.clone(),
            started_at: self.started_at,
            duration_ms: self.finished_at.map(|_| self.duration_ms()),
            subscribers: self.subscribers.len(),
        }
    }
}

/// Read-only view of a job for status queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total: usize,
    pub completed_count: usize,
    pub results: Vec<PageResult>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    pub subscribers: usize,
}
