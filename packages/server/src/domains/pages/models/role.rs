//! Analysis roles and homepage classification.
//!
//! Only the homepage of a batch gets the expensive header/footer/site-link
//! analysis; every other page is analysed body-only.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Paths that mark a URL as a site's homepage.
const HOMEPAGE_PATHS: &[&str] = &["", "/", "/index.html", "/home"];

/// Vertical slice of a captured page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Header,
    Body,
    Footer,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::Body => "body",
            Region::Footer => "footer",
        }
    }

    pub fn image_file(&self) -> String {
        format!("{}.png", self.as_str())
    }

    pub fn markup_file(&self) -> String {
        format!("{}.html", self.as_str())
    }
}

/// Per-URL analysis depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisRole {
    /// Header, body, footer and site-link extraction
    #[serde(rename = "full")]
    Full,
    #[serde(rename = "body-only")]
    BodyOnly,
}

impl AnalysisRole {
    /// Argument understood by the analysis tool.
    pub fn analysis_arg(&self) -> &'static str {
        match self {
            AnalysisRole::Full => "all",
            AnalysisRole::BodyOnly => "body",
        }
    }

    /// Regions whose image and markup must exist before analysis runs.
    pub fn required_regions(&self) -> &'static [Region] {
        match self {
            AnalysisRole::Full => &[Region::Header, Region::Body, Region::Footer],
            AnalysisRole::BodyOnly => &[Region::Body],
        }
    }

    pub fn includes(&self, region: Region) -> bool {
        self.required_regions().contains(&region)
    }
}

impl fmt::Display for AnalysisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisRole::Full => write!(f, "full"),
            AnalysisRole::BodyOnly => write!(f, "body-only"),
        }
    }
}

/// Whether the URL's path is one of the homepage forms.
pub fn is_homepage(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| HOMEPAGE_PATHS.contains(&parsed.path()))
        .unwrap_or(false)
}

/// Index of the batch's homepage.
///
/// The first syntactic homepage wins when several match. With no match at
/// all, the first URL stands in for the homepage.
pub fn homepage_index(urls: &[String]) -> Option<usize> {
    if urls.is_empty() {
        return None;
    }
    Some(urls.iter().position(|u| is_homepage(u)).unwrap_or(0))
}

/// Role of every URL in a batch, in batch order.
pub fn resolve_roles(urls: &[String]) -> Vec<AnalysisRole> {
    let homepage = homepage_index(urls);
    (0..urls.len())
        .map(|i| {
            if Some(i) == homepage {
                AnalysisRole::Full
            } else {
                AnalysisRole::BodyOnly
            }
        })
        .collect()
}
