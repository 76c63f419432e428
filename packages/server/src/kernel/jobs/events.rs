use serde::Serialize;
use uuid::Uuid;

use crate::domains::pages::models::PageResult;

/// Events streamed to job subscribers.
///
/// Every subscriber sees one `Started`, then `PageComplete` events in
/// completion order, then exactly one `Finished` as the last event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum JobEvent {
    /// Snapshot sent first to every new subscriber.
    #[serde(rename_all = "camelCase")]
    Started {
        job_id: Uuid,
        total: usize,
        completed: usize,
    },

    /// One URL produced its result (success or failure).
    #[serde(rename_all = "camelCase")]
    PageComplete {
        job_id: Uuid,
        index: usize,
        #[serde(flatten)]
        result: PageResult,
    },

    /// Terminal event; the stream closes after it.
    #[serde(rename_all = "camelCase")]
    Finished {
        job_id: Uuid,
        total_completed: usize,
        duration_ms: i64,
    },
}

impl JobEvent {
    /// Event name, matching the serialized `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Started { .. } => "started",
            JobEvent::PageComplete { .. } => "page-complete",
            JobEvent::Finished { .. } => "finished",
        }
    }

    pub fn job_id(&self) -> Uuid {
        match self {
            JobEvent::Started { job_id, .. }
            | JobEvent::PageComplete { job_id, .. }
            | JobEvent::Finished { job_id, .. } => *job_id,
        }
    }

    pub fn page_index(&self) -> Option<usize> {
        match self {
            JobEvent::PageComplete { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Finished { .. })
    }
}
