//! Process Runner
//!
//! Spawns the external analysis engine and captures its output. Arguments
//! are always passed as a vector; nothing is ever interpreted by a shell.
//! Standard output is streamed incrementally so callers can observe
//! liveness; standard error is buffered and attached (redacted) to
//! failures.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::utils::error::{RelayError, RelayResult};
use crate::utils::redact::{excerpt, redact};

/// Upper bound on the stderr excerpt attached to a failure
const STDERR_EXCERPT_CHARS: usize = 2000;

/// Channel over which newly-arrived stdout chunks are forwarded
pub type OutputSink = mpsc::UnboundedSender<String>;

/// Description of one engine invocation
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Binary to spawn (resolved via PATH)
    pub program: String,
    /// Argument vector, passed verbatim to the process
    pub args: Vec<String>,
    /// Optional hard timeout; the child is killed on expiry
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Create a spec for the given program with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the hard timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Seam between the orchestrator and the real subprocess layer, so tier
/// logic can be exercised against a scripted engine in tests.
#[async_trait]
pub trait EngineInvoker: Send + Sync {
    /// Run the command to completion, streaming stdout chunks into
    /// `on_output` as they arrive, and resolve with the full stdout on
    /// exit code 0.
    async fn invoke(&self, spec: &CommandSpec, on_output: Option<OutputSink>)
        -> RelayResult<String>;
}

/// Subprocess-backed engine invoker
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new runner instance
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineInvoker for ProcessRunner {
    async fn invoke(
        &self,
        spec: &CommandSpec,
        on_output: Option<OutputSink>,
    ) -> RelayResult<String> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RelayError::engine_not_found(&spec.program)
            } else {
                RelayError::Io(e)
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::config("child stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RelayError::config("child stderr was not piped"))?;

        // Buffer stderr in full off to the side; it is only surfaced on
        // failure, and only after redaction.
        let stderr_task = tokio::spawn(async move {
            let mut reader = stderr;
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf).await;
            buf
        });

        // Stream stdout; each send carries only the newly-arrived chunk.
        let stdout_task = tokio::spawn(async move {
            let mut reader = stdout;
            let mut collected: Vec<u8> = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        collected.extend_from_slice(&buf[..n]);
                        if let Some(sink) = &on_output {
                            let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                            // A dropped receiver is fine; keep collecting
                            let _ = sink.send(chunk);
                        }
                    }
                }
            }
            collected
        });

        let waited = match spec.timeout {
            Some(limit) => timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let status = match waited {
            Some(result) => result?,
            None => {
                let seconds = spec.timeout.map(|d| d.as_secs()).unwrap_or_default();
                warn!(program = %spec.program, seconds, "engine call timed out, killing child");
                let _ = child.start_kill();
                let _ = child.wait().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(RelayError::Timeout { seconds });
            }
        };

        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();

        if status.success() {
            debug!(program = %spec.program, bytes = stdout_bytes.len(), "engine call succeeded");
            return Ok(String::from_utf8_lossy(&stdout_bytes).into_owned());
        }

        let stderr_text = redact(&String::from_utf8_lossy(&stderr_bytes));
        let message = stderr_text
            .lines()
            .find(|l| !l.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "engine exited with a failure status".to_string());
        Err(RelayError::engine_failure(
            status.code(),
            message,
            excerpt(&stderr_text, STDERR_EXCERPT_CHARS),
        ))
    }
}
