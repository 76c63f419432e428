//! Canned collaborator output for driving the real pipeline with a
//! scripted subprocess runner.

use std::path::Path;

use segmenter_core::kernel::ProcessOutcome;
use serde_json::json;

/// Capture tool stdout pointing at `dir`, with measured heights.
pub fn capture_stdout(dir: &Path, header: u32, footer: u32) -> ProcessOutcome {
    ProcessOutcome::success(format!(
        "Loading page...\nOutput saved in: {}\nMeasured Header Height: {}px\nMeasured Footer Height: {}px\n",
        dir.display(),
        header,
        footer
    ))
}

/// Analysis tool stdout for a successful run.
pub fn analysis_stdout() -> ProcessOutcome {
    ProcessOutcome::success(
        json!({
            "success": true,
            "results": {
                "header": { "navigation": ["Home", "Shop"] },
                "footer": { "copyright": "2024 Example" },
                "body": { "sections": 3 },
                "sitelinks": null
            }
        })
        .to_string(),
    )
}

/// Lay down the region files the capture tool would have written.
pub fn write_regions(dir: &Path, regions: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for region in regions {
        std::fs::write(dir.join(format!("{region}.png")), b"png").unwrap();
        std::fs::write(dir.join(format!("{region}.html")), b"<div></div>").unwrap();
    }
}

pub fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
