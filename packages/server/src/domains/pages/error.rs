use thiserror::Error;

use super::models::AnalysisRole;

/// Stage failures of the per-URL pipeline.
///
/// None of these escape the pipeline; each becomes a failed page result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Screenshot capture failed: {0}")]
    Capture(String),

    #[error("Could not determine output directory from capture output")]
    OutputDirNotFound,

    #[error("Missing required files for {role} analysis: {}", missing.join(", "))]
    MissingFiles {
        role: AnalysisRole,
        missing: Vec<String>,
    },

    #[error("AI analysis failed: {0}")]
    Analysis(String),

    #[error("AI analysis reported failure: {0}")]
    AnalysisReported(String),

    #[error("{0}")]
    MalformedJson(String),
}
