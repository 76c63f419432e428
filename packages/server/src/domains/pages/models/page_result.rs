use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::{AnalysisRole, Region};

/// Optional region-height hints passed to the capture tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_height: Option<u32>,
}

/// Heights the capture tool reported measuring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredHeights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<u32>,
}

impl MeasuredHeights {
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.footer.is_none()
    }
}

/// Public paths of the region screenshots, scoped to the analysis role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionImages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl RegionImages {
    /// Image URLs under `public_prefix` (e.g. `/screenshots`) for `dir_name`.
    pub fn for_role(public_prefix: &str, dir_name: &str, role: AnalysisRole) -> Self {
        let path = |region: Region| {
            format!(
                "{}/{}/{}",
                public_prefix.trim_end_matches('/'),
                dir_name,
                region.image_file()
            )
        };
        let scoped = |region: Region| role.includes(region).then(|| path(region));
        Self {
            header: scoped(Region::Header),
            body: path(Region::Body),
            footer: scoped(Region::Footer),
        }
    }
}

/// Results section of the analysis tool's JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitelinks: Option<Value>,
}

impl AnalysisResults {
    /// Drop everything the role did not ask for.
    pub fn scoped_to(self, role: AnalysisRole) -> Self {
        match role {
            AnalysisRole::Full => self,
            AnalysisRole::BodyOnly => Self {
                body: self.body,
                ..Self::default()
            },
        }
    }
}

/// Everything a successfully processed page produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub output_dir: String,
    pub analysis_role: AnalysisRole,
    pub images: RegionImages,
    #[serde(skip_serializing_if = "MeasuredHeights::is_empty")]
    pub heights: MeasuredHeights,
    #[serde(flatten)]
    pub results: AnalysisResults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageOutcome {
    Success(PageAnalysis),
    Failure { error: String },
}

/// Outcome record for one URL within a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub url: String,
    pub success: bool,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn success(url: impl Into<String>, analysis: PageAnalysis) -> Self {
        Self {
            url: url.into(),
            success: true,
            outcome: PageOutcome::Success(analysis),
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            outcome: PageOutcome::Failure {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PageOutcome::Failure { error } => Some(error),
            PageOutcome::Success(_) => None,
        }
    }

    pub fn analysis(&self) -> Option<&PageAnalysis> {
        match &self.outcome {
            PageOutcome::Success(analysis) => Some(analysis),
            PageOutcome::Failure { .. } => None,
        }
    }
}
