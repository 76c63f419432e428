//! Request validation shared by the job and page endpoints.

use url::Url;

use crate::config::Config;
use crate::domains::pages::models::CaptureOptions;
use crate::kernel::jobs::JobError;

/// Trim a URL and require an absolute http(s) address.
pub fn validate_url(raw: &str) -> Result<String, JobError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| JobError::InvalidUrl(trimmed.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(trimmed.to_string()),
        _ => Err(JobError::InvalidUrl(trimmed.to_string())),
    }
}

/// Validate a batch, skipping blank entries.
pub fn validate_urls(raw: &[String]) -> Result<Vec<String>, JobError> {
    let urls = raw
        .iter()
        .filter(|u| !u.trim().is_empty())
        .map(|u| validate_url(u))
        .collect::<Result<Vec<_>, _>>()?;
    if urls.is_empty() {
        return Err(JobError::EmptyBatch);
    }
    Ok(urls)
}

/// Height hints must lie within `1..=MAX_*_HEIGHT`.
pub fn validate_options(options: CaptureOptions, config: &Config) -> Result<CaptureOptions, JobError> {
    check_height("headerHeight", options.header_height, config.max_header_height)?;
    check_height("footerHeight", options.footer_height, config.max_footer_height)?;
    Ok(options)
}

fn check_height(name: &str, value: Option<u32>, max: u32) -> Result<(), JobError> {
    match value {
        Some(height) if height == 0 || height > max => Err(JobError::InvalidOption(format!(
            "{} must be between 1 and {}, got {}",
            name, max, height
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn urls_are_trimmed_and_blanks_skipped() {
        let raw = vec![" https://x.com/ ".to_string(), "".into(), "http://x.com/a".into()];
        assert_eq!(
            validate_urls(&raw).unwrap(),
            vec!["https://x.com/", "http://x.com/a"]
        );
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert_eq!(
            validate_url("ftp://x.com/file"),
            Err(JobError::InvalidUrl("ftp://x.com/file".into()))
        );
        assert_err!(validate_url("x.com/products"));
        assert_ok!(validate_url("http://localhost:8080/"));
    }

    #[test]
    fn blank_batch_is_empty() {
        assert_eq!(validate_urls(&["  ".to_string()]), Err(JobError::EmptyBatch));
    }

    #[test]
    fn heights_are_bounded() {
        let config = Config::default();
        let ok = CaptureOptions {
            header_height: Some(500),
            footer_height: Some(1),
        };
        assert_eq!(validate_options(ok, &config), Ok(ok));

        let too_tall = CaptureOptions {
            header_height: None,
            footer_height: Some(801),
        };
        assert!(matches!(
            validate_options(too_tall, &config),
            Err(JobError::InvalidOption(message)) if message.contains("footerHeight")
        ));
    }
}
