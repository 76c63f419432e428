//! Per-URL pipeline: capture → input check → AI analysis → PageResult.
//!
//! ```text
//! PagePipeline::process(url, role)
//!     │
//!     ├─► capture_page      (capture tool, output dir + heights)
//!     ├─► missing_inputs    (region files required by the role)
//!     ├─► analyze_page      (analysis tool, JSON payload)
//!     └─► PageResult        (any stage error becomes a Failure)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use super::activities::{analyze_page, capture_page, missing_inputs};
use super::error::PipelineError;
use super::models::{AnalysisRole, CaptureOptions, PageAnalysis, PageResult, RegionImages};
use crate::config::Config;
use crate::kernel::subprocess::ProcessRunner;

/// Route prefix under which screenshot directories are served.
pub const SCREENSHOTS_ROUTE: &str = "/screenshots";

/// How the pipeline launches its collaborators.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct PipelineSettings {
    pub python_path: String,
    pub capture_module: String,
    pub analysis_script: String,
    pub project_root: PathBuf,
    pub timeout: Duration,
    #[builder(default = SCREENSHOTS_ROUTE.to_string())]
    pub public_prefix: String,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self::builder()
            .python_path(config.python_path.clone())
            .capture_module(config.capture_module.clone())
            .analysis_script(config.analysis_script.clone())
            .project_root(config.project_root.clone())
            .timeout(config.subprocess_timeout)
            .build()
    }
}

/// Turns one URL into exactly one PageResult.
#[async_trait]
pub trait PageProcessor: Send + Sync {
    async fn process(&self, url: &str, role: AnalysisRole, options: &CaptureOptions) -> PageResult;
}

pub struct PagePipeline {
    runner: Arc<dyn ProcessRunner>,
    settings: PipelineSettings,
}

impl PagePipeline {
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: PipelineSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run every stage, stopping at the first failure. No retries.
    pub async fn run(
        &self,
        url: &str,
        role: AnalysisRole,
        options: &CaptureOptions,
    ) -> Result<PageAnalysis, PipelineError> {
        let page = capture_page(self.runner.as_ref(), &self.settings, url, options).await?;

        let missing = missing_inputs(&page, role).await;
        if !missing.is_empty() {
            return Err(PipelineError::MissingFiles { role, missing });
        }

        let results = analyze_page(self.runner.as_ref(), &self.settings, &page, url, role).await?;

        Ok(PageAnalysis {
            images: RegionImages::for_role(&self.settings.public_prefix, &page.dir_name, role),
            output_dir: page.dir_name,
            analysis_role: role,
            heights: page.heights,
            results,
        })
    }
}

#[async_trait]
impl PageProcessor for PagePipeline {
    async fn process(&self, url: &str, role: AnalysisRole, options: &CaptureOptions) -> PageResult {
        match self.run(url, role, options).await {
            Ok(analysis) => {
                info!(url, %role, output_dir = %analysis.output_dir, "Page processed");
                PageResult::success(url, analysis)
            }
            Err(e) => {
                warn!(url, %role, error = %e, "Page failed");
                PageResult::failure(url, e.to_string())
            }
        }
    }
}
