// Test doubles for the subprocess and page-processing seams
//
// Shared by unit tests and the integration tests under tests/.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::subprocess::{Invocation, ProcessOutcome, ProcessRunner};
use crate::domains::pages::models::{
    AnalysisResults, AnalysisRole, CaptureOptions, MeasuredHeights, PageAnalysis, PageResult,
    RegionImages,
};
use crate::domains::pages::PageProcessor;

// =============================================================================
// Scripted Runner
// =============================================================================

/// Answers invocations from canned outcomes.
///
/// Rules are checked in insertion order; the first rule whose needle appears
/// in the command line wins. Unmatched invocations fail.
pub struct ScriptedRunner {
    rules: Vec<(String, ProcessOutcome)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Invocation>>,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: impl Into<String>, outcome: ProcessOutcome) -> Self {
        self.rules.push((needle.into(), outcome));
        self
    }

    /// Sleep before answering each invocation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, needle: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.command_line().contains(needle))
            .collect()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls_for(needle).len()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> ProcessOutcome {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let command_line = invocation.command_line();
        self.rules
            .iter()
            .find(|(needle, _)| command_line.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| {
                ProcessOutcome::failure("", format!("no scripted response for: {}", command_line))
            })
    }
}

// =============================================================================
// Scripted Page Processor
// =============================================================================

/// Page processor that succeeds unless told otherwise.
///
/// URLs registered with `failing` produce failures, URLs registered with
/// `panicking` panic mid-processing. With `gated`, every page waits for a
/// permit from [`ScriptedProcessor::release`] before it completes.
pub struct ScriptedProcessor {
    failing: HashSet<String>,
    panicking: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<(String, AnalysisRole)>>,
}

impl Default for ScriptedProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProcessor {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            panicking: HashSet::new(),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn panicking(mut self, url: impl Into<String>) -> Self {
        self.panicking.insert(url.into());
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `pages` more pages complete
    pub fn release(&self, pages: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(pages);
        }
    }

    /// URLs and roles in the order they were processed
    pub fn calls(&self) -> Vec<(String, AnalysisRole)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn success_for(url: &str, role: AnalysisRole) -> PageResult {
        let dir_name = format!("page_{}", url.len());
        PageResult::success(
            url,
            PageAnalysis {
                images: RegionImages::for_role("/screenshots", &dir_name, role),
                output_dir: dir_name,
                analysis_role: role,
                heights: MeasuredHeights::default(),
                results: AnalysisResults::default(),
            },
        )
    }
}

#[async_trait]
impl PageProcessor for ScriptedProcessor {
    async fn process(&self, url: &str, role: AnalysisRole, _options: &CaptureOptions) -> PageResult {
        self.calls.lock().unwrap().push((url.to_string(), role));
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.panicking.contains(url) {
            panic!("scripted panic for {}", url);
        }
        if self.failing.contains(url) {
            return PageResult::failure(url, format!("Screenshot capture failed: scripted failure for {}", url));
        }
        Self::success_for(url, role)
    }
}
