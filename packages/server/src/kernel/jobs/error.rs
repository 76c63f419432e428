use thiserror::Error;
use uuid::Uuid;

/// Request-level job errors, surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("At least one URL is required")]
    EmptyBatch,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
