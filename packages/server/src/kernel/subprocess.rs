//! Subprocess runner for the external capture and analysis tools.
//!
//! Every invocation resolves to a [`ProcessOutcome`]; launch failures, non-zero
//! exits and timeouts are all reported through `error` rather than as `Err`.
//!
//! ```ignore
//! let outcome = runner
//!     .run(&Invocation::new("python3").arg("-m").arg("screenshot_urlbox.processor").arg(url))
//!     .await;
//! ```

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long to keep draining pipes after the child was killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Fluent description of one external command.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Program and arguments joined for logging.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a subprocess run.
///
/// `error` is `None` only for a zero exit code. Whatever the process wrote to
/// stdout before it ended is always kept in `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub output: String,
    pub error: Option<String>,
}

impl ProcessOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Seam between the pipeline and the operating system.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> ProcessOutcome;
}

/// Runs invocations as real child processes on the tokio runtime.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    default_timeout: Duration,
}

impl SubprocessRunner {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }
}

#[async_trait]
impl ProcessRunner for SubprocessRunner {
    async fn run(&self, invocation: &Invocation) -> ProcessOutcome {
        let command_line = invocation.command_line();
        let timeout = invocation.timeout.unwrap_or(self.default_timeout);
        info!(command = %command_line, timeout_ms = timeout.as_millis() as u64, "Launching subprocess");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            // Explicitly set stdin to null to prevent hanging on interactive prompts
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref cwd) = invocation.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %command_line, error = %e, "Failed to start subprocess");
                return ProcessOutcome::failure(
                    String::new(),
                    format!("failed to start {}: {}", invocation.program, e),
                );
            }
        };

        let stdout = StreamCollector::spawn(child.stdout.take());
        let stderr = StreamCollector::spawn(child.stderr.take());

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(e)) => Err(format!("failed to wait for {}: {}", invocation.program, e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(command = %command_line, error = %e, "Failed to kill timed out subprocess");
                }
                Err(format!(
                    "{} timed out after {}ms",
                    invocation.program,
                    timeout.as_millis()
                ))
            }
        };

        let output = stdout.finish().await;
        let stderr = stderr.finish().await;

        match status {
            Ok(status) if status.success() => {
                debug!(command = %command_line, stdout_bytes = output.len(), "Subprocess finished");
                ProcessOutcome::success(output)
            }
            Ok(status) => {
                let error = exit_error(status, &stderr);
                warn!(command = %command_line, error = %error, "Subprocess exited with failure");
                ProcessOutcome::failure(output, error)
            }
            Err(error) => {
                warn!(command = %command_line, error = %error, "Subprocess did not complete");
                ProcessOutcome::failure(output, error)
            }
        }
    }
}

fn exit_error(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match status.code() {
        Some(code) => format!("exited with code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Drains one pipe into a shared buffer so a killed process still yields
/// the bytes it wrote.
struct StreamCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl StreamCollector {
    fn spawn<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let handle = reader.map(|mut reader| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buffer
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .extend_from_slice(&chunk[..n]),
                    }
                }
            })
        });
        Self { buffer, handle }
    }

    async fn finish(mut self) -> String {
        if let Some(handle) = self.handle.take() {
            let abort = handle.abort_handle();
            // Grandchildren may keep the pipe open after the child is gone
            if tokio::time::timeout(DRAIN_GRACE, handle).await.is_err() {
                abort.abort();
            }
        }
        let bytes = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(|e| e.into_inner()));
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
