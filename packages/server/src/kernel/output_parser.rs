//! Extraction of structured fields from collaborator output.
//!
//! The capture tool prints free-form progress text; the analysis tool prints a
//! single JSON document. Misses come back as `None`; broken JSON comes back as
//! an `Err` holding a failure payload.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::warn;

/// Label of the line announcing the capture output directory.
pub const OUTPUT_DIR_LABEL: &str = "Output saved in";
pub const HEADER_HEIGHT_LABEL: &str = "Measured Header Height";
pub const FOOTER_HEIGHT_LABEL: &str = "Measured Footer Height";

const LOG_PREVIEW_CHARS: usize = 500;
const RAW_OUTPUT_CHARS: usize = 200;

lazy_static! {
    /// `Label: value` at the very start of a line.
    static ref FIELD_LINE: Regex = Regex::new(r"(?m)^([^:\r\n]+):[ \t]*(\S[^\r\n]*)").unwrap();
    /// Same, allowing indentation and a leading `>` marker.
    static ref MARKED_FIELD_LINE: Regex =
        Regex::new(r"(?m)^[ \t]*>?[ \t]*([^:\r\n]+):[ \t]*(\S[^\r\n]*)").unwrap();
    static ref PIXELS: Regex = Regex::new(r"^(\d+)\s*(?:px)?$").unwrap();
}

/// Header and footer heights reported by the capture tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionHeights {
    pub header: Option<u32>,
    pub footer: Option<u32>,
}

/// Extract the value of a `Label: value` line.
///
/// Tries the bare form at the start of a line first, then a variant allowing
/// indentation and an optional leading `>` marker. Logs a preview of `text`
/// when neither matches.
pub fn extract_field(text: &str, label: &str) -> Option<String> {
    let value = match_field(text, label);
    if value.is_none() {
        warn!(
            label,
            output = %preview(text, LOG_PREVIEW_CHARS),
            "Could not find field in subprocess output"
        );
    }
    value
}

/// Output directory path announced by the capture tool.
pub fn extract_output_dir(text: &str) -> Option<String> {
    extract_field(text, OUTPUT_DIR_LABEL)
}

/// Header and footer heights, each independently optional.
pub fn extract_heights(text: &str) -> RegionHeights {
    RegionHeights {
        header: match_field(text, HEADER_HEIGHT_LABEL).and_then(|v| parse_pixels(&v)),
        footer: match_field(text, FOOTER_HEIGHT_LABEL).and_then(|v| parse_pixels(&v)),
    }
}

/// Parse collaborator output as JSON.
///
/// On failure the error is `{"success": false, "error": ..., "raw_output": ...}`
/// with the first 200 characters of the input.
pub fn parse_json_output(text: &str) -> Result<Value, Value> {
    serde_json::from_str::<Value>(text.trim()).map_err(|e| {
        warn!(
            error = %e,
            output = %preview(text, LOG_PREVIEW_CHARS),
            "Failed to parse subprocess output as JSON"
        );
        json!({
            "success": false,
            "error": format!("Failed to parse JSON output: {}", e),
            "raw_output": preview(text, RAW_OUTPUT_CHARS),
        })
    })
}

fn match_field(text: &str, label: &str) -> Option<String> {
    [&*FIELD_LINE, &*MARKED_FIELD_LINE]
        .into_iter()
        .find_map(|re| field_value(re, text, label))
}

fn field_value(re: &Regex, text: &str, label: &str) -> Option<String> {
    re.captures_iter(text)
        .filter(|caps| &caps[1] == label)
        .find_map(|caps| {
            let value = caps[2].trim();
            (!value.is_empty()).then(|| value.to_string())
        })
}

fn parse_pixels(value: &str) -> Option<u32> {
    PIXELS
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
