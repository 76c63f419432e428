//! Batch job infrastructure.
//!
//! - [`JobStore`] - In-memory job table (process lifetime)
//! - [`JobManager`] - Creates jobs and drives their URLs through the page pipeline
//! - [`EventBroadcaster`] - Fans job events out to live subscribers
//! - [`JobEvent`] - `started` / `page-complete` / `finished`
//!
//! # Architecture
//!
//! ```text
//! POST /api/jobs ─► JobManager.create_job ─► JobStore.insert
//!                          │
//!                          └─► process_job (background task)
//!                                  ├─► PageProcessor.process(url)
//!                                  ├─► JobStore: push result
//!                                  └─► EventBroadcaster.publish ─► Subscription ─► SSE
//! ```

pub mod broadcaster;
pub mod error;
pub mod events;
mod job;
mod job_store;
pub mod manager;

pub use broadcaster::{EventBroadcaster, Subscription};
pub use error::JobError;
pub use events::JobEvent;
pub use job::{BatchJob, JobSnapshot, JobStatus};
pub use job_store::JobStore;
pub use manager::JobManager;
