//! Screenshot capture through the external capture tool.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domains::pages::error::PipelineError;
use crate::domains::pages::models::{CaptureOptions, MeasuredHeights, Region};
use crate::domains::pages::PipelineSettings;
use crate::kernel::output_parser::{extract_heights, extract_output_dir};
use crate::kernel::subprocess::{Invocation, ProcessRunner};

/// Where the capture tool wrote a page's regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage {
    pub dir: PathBuf,
    pub dir_name: String,
    pub heights: MeasuredHeights,
}

impl CapturedPage {
    pub fn image_path(&self, region: Region) -> PathBuf {
        self.dir.join(region.image_file())
    }

    pub fn markup_path(&self, region: Region) -> PathBuf {
        self.dir.join(region.markup_file())
    }
}

pub fn capture_invocation(
    settings: &PipelineSettings,
    url: &str,
    options: &CaptureOptions,
) -> Invocation {
    let mut invocation = Invocation::new(&settings.python_path)
        .args(["-m", settings.capture_module.as_str(), url])
        .cwd(&settings.project_root)
        .timeout(settings.timeout);
    if let Some(height) = options.header_height {
        invocation = invocation.arg("--header-height").arg(height.to_string());
    }
    if let Some(height) = options.footer_height {
        invocation = invocation.arg("--footer-height").arg(height.to_string());
    }
    invocation
}

/// Run the capture tool and locate its output directory.
pub async fn capture_page(
    runner: &dyn ProcessRunner,
    settings: &PipelineSettings,
    url: &str,
    options: &CaptureOptions,
) -> Result<CapturedPage, PipelineError> {
    info!(url, "Capturing screenshots");
    let outcome = runner
        .run(&capture_invocation(settings, url, options))
        .await;
    if let Some(error) = outcome.error {
        return Err(PipelineError::Capture(error));
    }

    let raw_dir = extract_output_dir(&outcome.output).ok_or(PipelineError::OutputDirNotFound)?;
    let dir = resolve_dir(&settings.project_root, &raw_dir);
    let dir_name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or(PipelineError::OutputDirNotFound)?;

    let heights = extract_heights(&outcome.output);
    debug!(url, dir = %dir.display(), ?heights, "Capture finished");

    Ok(CapturedPage {
        dir,
        dir_name,
        heights: MeasuredHeights {
            header: heights.header,
            footer: heights.footer,
        },
    })
}

fn resolve_dir(project_root: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw.trim().trim_end_matches(|c: char| c == '/' || c == '\\'));
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> PipelineSettings {
        PipelineSettings::builder()
            .python_path("python3")
            .capture_module("screenshot_urlbox.processor")
            .analysis_script("ui/run_header_footer_analysis.py")
            .project_root("/srv/app")
            .timeout(Duration::from_secs(30))
            .build()
    }

    #[test]
    fn invocation_passes_height_hints() {
        let options = CaptureOptions {
            header_height: Some(120),
            footer_height: None,
        };
        let invocation = capture_invocation(&settings(), "https://x.com/", &options);
        assert_eq!(invocation.program(), "python3");
        assert_eq!(
            invocation.arguments(),
            &["-m", "screenshot_urlbox.processor", "https://x.com/", "--header-height", "120"]
        );
    }

    #[test]
    fn relative_dirs_resolve_against_project_root() {
        assert_eq!(
            resolve_dir(Path::new("/srv/app"), "out/site_1/"),
            PathBuf::from("/srv/app/out/site_1")
        );
        assert_eq!(
            resolve_dir(Path::new("/srv/app"), "/data/site_2"),
            PathBuf::from("/data/site_2")
        );
    }
}
