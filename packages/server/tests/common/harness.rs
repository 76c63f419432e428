//! Test harness wiring the HTTP app to scripted collaborators.
//!
//! # Example using test-context
//!
//! ```ignore
//! use test_context::test_context;
//!
//! #[test_context(TestHarness)]
//! #[tokio::test]
//! async fn my_test(ctx: &mut TestHarness) {
//!     let (status, body) = ctx.get_json("/health").await;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use segmenter_core::kernel::test_dependencies::{ScriptedProcessor, ScriptedRunner};
use segmenter_core::kernel::ServerDeps;
use segmenter_core::server::build_app;
use segmenter_core::Config;
use serde_json::Value;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestHarness {
    pub deps: ServerDeps,
    pub processor: Arc<ScriptedProcessor>,
    /// Served under `/screenshots`.
    pub screenshots: TempDir,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::with_processor(ScriptedProcessor::new())
    }
}

impl TestHarness {
    fn test_config(screenshots: &TempDir) -> Config {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Config {
            project_root: screenshots.path().to_path_buf(),
            screenshot_output_dir: screenshots.path().to_path_buf(),
            subscriber_buffer: 16,
            ..Config::default()
        }
    }

    /// Harness whose pages are handled by a scripted processor.
    pub fn with_processor(processor: ScriptedProcessor) -> Self {
        let screenshots = TempDir::new().unwrap();
        let processor = Arc::new(processor);
        let deps = ServerDeps::with_processor(Self::test_config(&screenshots), processor.clone());
        Self {
            deps,
            processor,
            screenshots,
        }
    }

    /// Harness running the real pipeline over a scripted subprocess runner.
    pub fn with_runner(screenshots: TempDir, runner: Arc<ScriptedRunner>) -> Self {
        let deps = ServerDeps::with_runner(Self::test_config(&screenshots), runner);
        Self {
            deps,
            processor: Arc::new(ScriptedProcessor::new()),
            screenshots,
        }
    }

    pub fn app(&self) -> Router {
        build_app(self.deps.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::get(path).body(Body::empty()).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Read an SSE stream to its end and return `(event name, data)` pairs.
    pub async fn read_events(&self, job_id: Uuid) -> (StatusCode, Vec<(String, Value)>) {
        let request = Request::get(format!("/api/jobs/{job_id}/events"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = tokio::time::timeout(Duration::from_secs(5), self.send(request))
            .await
            .expect("event stream did not end");
        (status, parse_sse(&String::from_utf8_lossy(&bytes)))
    }

    /// Poll until the job reports `finished`.
    pub async fn wait_finished(&self, job_id: Uuid) -> Value {
        for _ in 0..200 {
            let (_, snapshot) = self.get_json(&format!("/api/jobs/{job_id}")).await;
            if snapshot["status"] == "finished" {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not finish");
    }
}

/// Split an SSE body into named events, ignoring keep-alive comments.
pub fn parse_sse(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut name = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    name = Some(value.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data = serde_json::from_str(value.trim()).ok();
                }
            }
            Some((name?, data?))
        })
        .collect()
}
