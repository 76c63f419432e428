//! AI analysis of captured regions through the external analysis tool.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::capture::CapturedPage;
use crate::domains::pages::error::PipelineError;
use crate::domains::pages::models::{AnalysisResults, AnalysisRole};
use crate::domains::pages::PipelineSettings;
use crate::kernel::output_parser::parse_json_output;
use crate::kernel::subprocess::{Invocation, ProcessRunner};

/// Shape of the document the analysis tool prints.
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: AnalysisResults,
}

/// Image and markup files the role needs that are not on disk.
pub async fn missing_inputs(page: &CapturedPage, role: AnalysisRole) -> Vec<String> {
    let mut missing = Vec::new();
    for region in role.required_regions() {
        for path in [page.image_path(*region), page.markup_path(*region)] {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                missing.push(
                    path.file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string()),
                );
            }
        }
    }
    missing
}

pub fn analysis_invocation(
    settings: &PipelineSettings,
    page: &CapturedPage,
    url: &str,
    role: AnalysisRole,
) -> Invocation {
    Invocation::new(&settings.python_path)
        .arg(&settings.analysis_script)
        .arg(page.dir.to_string_lossy())
        .arg(url)
        .arg(role.analysis_arg())
        .cwd(&settings.project_root)
        .timeout(settings.timeout)
}

/// Run the analysis tool for `role` and return the role-scoped results.
pub async fn analyze_page(
    runner: &dyn ProcessRunner,
    settings: &PipelineSettings,
    page: &CapturedPage,
    url: &str,
    role: AnalysisRole,
) -> Result<AnalysisResults, PipelineError> {
    info!(url, %role, dir = %page.dir.display(), "Running AI analysis");
    let outcome = runner
        .run(&analysis_invocation(settings, page, url, role))
        .await;
    if let Some(error) = outcome.error {
        return Err(PipelineError::Analysis(error));
    }

    let value = parse_json_output(&outcome.output).map_err(parse_failure)?;
    let results = decode_payload(value)?;
    Ok(results.scoped_to(role))
}

fn parse_failure(failure: Value) -> PipelineError {
    let message = failure
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Failed to parse JSON output");
    PipelineError::MalformedJson(message.to_string())
}

fn decode_payload(value: Value) -> Result<AnalysisResults, PipelineError> {
    let payload: AnalysisPayload = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Analysis output has an unexpected shape");
        PipelineError::MalformedJson(format!("Failed to parse JSON output: {}", e))
    })?;

    if !payload.success {
        return Err(PipelineError::AnalysisReported(
            payload.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(payload.results)
}
