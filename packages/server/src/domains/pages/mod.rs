//! Pages domain - captures one URL, analyses its regions and reports a PageResult

pub mod activities;
pub mod error;
pub mod models;
pub mod pipeline;

pub use error::PipelineError;
pub use models::{AnalysisRole, CaptureOptions, PageResult};
pub use pipeline::{PageProcessor, PagePipeline, PipelineSettings};
