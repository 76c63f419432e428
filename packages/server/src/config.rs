use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Interpreter used to launch the capture and analysis collaborators
    pub python_path: String,
    pub subprocess_timeout: Duration,
    /// Working directory for collaborators
    pub project_root: PathBuf,
    pub capture_module: String,
    pub analysis_script: String,
    pub screenshot_output_dir: PathBuf,
    pub max_header_height: u32,
    pub max_footer_height: u32,
    pub subscriber_buffer: usize,
    pub job_retention: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let project_root = PathBuf::from(env_or("PROJECT_ROOT", "."));
        let output_dir = PathBuf::from(env_or("SCREENSHOT_OUTPUT_DIR", "screenshot_urlbox/output"));

        let config = Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: parse_env("SERVER_PORT", 3000)?,
            python_path: env_or("PYTHON_PATH", "python3"),
            subprocess_timeout: Duration::from_millis(parse_env("PYTHON_TIMEOUT_MS", 300_000)?),
            screenshot_output_dir: if output_dir.is_absolute() {
                output_dir
            } else {
                project_root.join(output_dir)
            },
            project_root,
            capture_module: env_or("CAPTURE_MODULE", "screenshot_urlbox.processor"),
            analysis_script: env_or("ANALYSIS_SCRIPT", "ui/run_header_footer_analysis.py"),
            max_header_height: parse_env("MAX_HEADER_HEIGHT", 500)?,
            max_footer_height: parse_env("MAX_FOOTER_HEIGHT", 800)?,
            subscriber_buffer: parse_env("SUBSCRIBER_BUFFER", 256)?,
            job_retention: Duration::from_secs(parse_env("JOB_RETENTION_SECS", 3600)?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.subprocess_timeout.is_zero() {
            errors.push("PYTHON_TIMEOUT_MS must be positive");
        }
        if self.port == 0 {
            errors.push("SERVER_PORT must be between 1 and 65535");
        }
        if self.max_header_height == 0 || self.max_footer_height == 0 {
            errors.push("MAX_HEADER_HEIGHT and MAX_FOOTER_HEIGHT must be positive");
        }
        if self.subscriber_buffer == 0 {
            errors.push("SUBSCRIBER_BUFFER must be positive");
        }

        if !errors.is_empty() {
            bail!("Configuration errors: {}", errors.join("; "));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            python_path: "python3".to_string(),
            subprocess_timeout: Duration::from_millis(300_000),
            project_root: PathBuf::from("."),
            capture_module: "screenshot_urlbox.processor".to_string(),
            analysis_script: "ui/run_header_footer_analysis.py".to_string(),
            screenshot_output_dir: PathBuf::from("screenshot_urlbox/output"),
            max_header_height: 500,
            max_footer_height: 800,
            subscriber_buffer: 256,
            job_retention: Duration::from_secs(3600),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            subprocess_timeout: Duration::ZERO,
            ..Config::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("PYTHON_TIMEOUT_MS"));
    }

    #[test]
    fn all_errors_are_reported_together() {
        let config = Config {
            port: 0,
            max_footer_height: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("SERVER_PORT"));
        assert!(err.contains("MAX_FOOTER_HEIGHT"));
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 8081,
            ..Config::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:8081");
    }
}
