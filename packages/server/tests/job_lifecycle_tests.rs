//! Integration tests for batch jobs observed over SSE.
//!
//! - Event order: started, one page-complete per URL, a single finished
//! - Late and post-completion subscribers get the full history replayed
//! - A failing URL does not stop the rest of the batch

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use segmenter_core::kernel::test_dependencies::{ScriptedProcessor, ScriptedRunner};
use segmenter_core::kernel::ProcessOutcome;
use serde_json::{json, Value};
use tempfile::TempDir;
use test_context::test_context;
use uuid::Uuid;

use crate::common::{analysis_stdout, capture_stdout, urls, write_regions, TestHarness};

async fn create_job(ctx: &TestHarness, batch: &[&str]) -> Uuid {
    let (status, body) = ctx.post_json("/api/jobs", json!({ "urls": urls(batch) })).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    body["jobId"].as_str().unwrap().parse().unwrap()
}

fn names(events: &[(String, Value)]) -> Vec<&str> {
    events.iter().map(|(name, _)| name.as_str()).collect()
}

// =============================================================================
// Replay
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn finished_job_replays_full_history(ctx: &TestHarness) {
    let job_id = create_job(ctx, &["https://x.com/about", "https://x.com/", "https://x.com/faq"]).await;
    ctx.wait_finished(job_id).await;

    let (status, events) = ctx.read_events(job_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names(&events),
        vec!["started", "page-complete", "page-complete", "page-complete", "finished"]
    );

    let (_, started) = &events[0];
    assert_eq!(started["type"], "started");
    assert_eq!(started["jobId"], job_id.to_string());
    assert_eq!(started["total"], 3);

    let roles: Vec<_> = events[1..4]
        .iter()
        .map(|(_, page)| page["analysisRole"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(roles, vec!["body-only", "full", "body-only"]);

    let indexes: Vec<_> = events[1..4].iter().map(|(_, page)| page["index"].clone()).collect();
    assert_eq!(indexes, vec![json!(0), json!(1), json!(2)]);

    let (_, finished) = &events[4];
    assert_eq!(finished["totalCompleted"], 3);
    assert!(finished["durationMs"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn late_subscriber_sees_every_page_once() {
    let ctx = TestHarness::with_processor(ScriptedProcessor::new().gated());
    let job_id = create_job(&ctx, &["https://x.com/", "https://x.com/a", "https://x.com/b"]).await;

    // First page completes before anyone is watching
    ctx.processor.release(1);
    for _ in 0..200 {
        let (_, snapshot) = ctx.get_json(&format!("/api/jobs/{job_id}")).await;
        if snapshot["completedCount"] == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (stream, _) = tokio::join!(ctx.read_events(job_id), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.processor.release(2);
    });
    let (status, events) = stream;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names(&events),
        vec!["started", "page-complete", "page-complete", "page-complete", "finished"]
    );
    let (_, started) = &events[0];
    assert_eq!(started["completed"], 1);

    let pages: Vec<_> = events[1..4]
        .iter()
        .map(|(_, page)| page["url"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(pages, urls(&["https://x.com/", "https://x.com/a", "https://x.com/b"]));
}

#[tokio::test]
async fn concurrent_subscribers_each_get_one_terminal_event() {
    let ctx = TestHarness::with_processor(ScriptedProcessor::new().gated());
    let job_id = create_job(&ctx, &["https://x.com/", "https://x.com/a"]).await;

    let (first, second, _) = tokio::join!(ctx.read_events(job_id), ctx.read_events(job_id), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.processor.release(2);
    });

    for (_, events) in [first, second] {
        assert_eq!(events.iter().filter(|(name, _)| name == "finished").count(), 1);
        assert_eq!(events.iter().filter(|(name, _)| name == "page-complete").count(), 2);
    }
}

// =============================================================================
// Real pipeline over scripted collaborators
// =============================================================================

#[tokio::test]
async fn failing_capture_mid_batch_does_not_stop_the_job() {
    let screenshots = TempDir::new().unwrap();
    let home_dir = screenshots.path().join("home_example");
    let shop_dir = screenshots.path().join("shop_example");
    write_regions(&home_dir, &["header", "body", "footer"]);
    write_regions(&shop_dir, &["body"]);

    let runner = Arc::new(
        ScriptedRunner::new()
            .on("processor https://home.example/", capture_stdout(&home_dir, 90, 200))
            .on(
                "processor https://broken.example/",
                ProcessOutcome::failure("", "net::ERR_NAME_NOT_RESOLVED"),
            )
            .on("processor https://shop.example/", capture_stdout(&shop_dir, 80, 150))
            .on("run_header_footer_analysis.py", analysis_stdout()),
    );
    let ctx = TestHarness::with_runner(screenshots, runner.clone());

    let job_id = create_job(
        &ctx,
        &["https://home.example/", "https://broken.example/", "https://shop.example/products"],
    )
    .await;
    let snapshot = ctx.wait_finished(job_id).await;
    let results = snapshot["results"].as_array().unwrap();

    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["analysisRole"], "full");
    assert_eq!(results[0]["images"]["header"], "/screenshots/home_example/header.png");
    assert_eq!(results[0]["header"]["navigation"], json!(["Home", "Shop"]));

    assert_eq!(results[1]["success"], false);
    assert_eq!(
        results[1]["error"],
        "Screenshot capture failed: net::ERR_NAME_NOT_RESOLVED"
    );

    assert_eq!(results[2]["success"], true);
    assert_eq!(results[2]["analysisRole"], "body-only");
    assert_eq!(results[2]["images"]["body"], "/screenshots/shop_example/body.png");
    assert!(results[2].get("header").is_none());

    let analysis = runner.calls_for("run_header_footer_analysis.py");
    assert_eq!(analysis.len(), 2);
    assert!(analysis[0].command_line().ends_with("https://home.example/ all"));
    assert!(analysis[1].command_line().ends_with("https://shop.example/products body"));
}

#[tokio::test]
async fn missing_region_files_skip_analysis() {
    let screenshots = TempDir::new().unwrap();
    let dir = screenshots.path().join("partial");
    write_regions(&dir, &["body"]);

    let runner = Arc::new(
        ScriptedRunner::new()
            .on("screenshot_urlbox.processor", capture_stdout(&dir, 0, 0))
            .on("run_header_footer_analysis.py", analysis_stdout()),
    );
    let ctx = TestHarness::with_runner(screenshots, runner.clone());

    let job_id = create_job(&ctx, &["https://partial.example/"]).await;
    let snapshot = ctx.wait_finished(job_id).await;

    let result = &snapshot["results"][0];
    assert_eq!(result["success"], false);
    assert_eq!(
        result["error"],
        "Missing required files for full analysis: header.png, header.html, footer.png, footer.html"
    );
    assert_eq!(runner.calls_matching("run_header_footer_analysis.py"), 0);
}
