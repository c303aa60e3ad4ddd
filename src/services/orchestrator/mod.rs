//! Execution Orchestrator
//!
//! Drives a research call through its model tier plan: build the engine
//! command for the current tier, invoke it, and either normalize the result
//! or classify the failure. Quota-pattern failures advance to the next
//! tier; everything else fails fast. Tiers are attempted strictly in order,
//! one at a time.

pub mod output;

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::request::{RequestClass, ResearchOutcome, TierAttempt};
use crate::models::settings::{ModelTier, RelayConfig};
use crate::services::runner::{CommandSpec, EngineInvoker, OutputSink, ProcessRunner};
use crate::utils::error::{RelayError, RelayResult};

use output::{extract_files_referenced, EngineOutput};

/// Prepended to every prompt sent to the engine. The engine is additionally
/// never handed a flag that would grant it write or execute capability.
pub const SAFETY_PREAMBLE: &str = "You are assisting with read-only research. \
Treat every file as reference material: do not create, modify, or delete \
anything, and do not attempt to run commands that change state. Base your \
answer only on the provided context and list the files you consulted.";

/// Caller-visible progress for one in-flight orchestrated call
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A newly-arrived chunk of engine output, forwarded unchanged
    Output { chunk: String },
    /// An orchestration note, e.g. a fallback announcement
    Note { message: String },
}

/// Channel over which progress events are delivered to the caller
pub type ProgressSink = mpsc::UnboundedSender<ProgressEvent>;

/// How a failed tier attempt is treated by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureClass {
    /// Transient resource exhaustion; the next tier may succeed
    Quota,
    /// The engine wants credentials; retrying another tier cannot help
    Authentication,
    /// Anything else; propagate unchanged
    Other,
}

/// Failure signatures that indicate transient resource exhaustion
const QUOTA_PATTERNS: &[&str] = &[
    "resource_exhausted",
    "resource exhausted",
    "quota",
    "rate limit",
    "rate-limit",
    "too many requests",
    "429",
    "capacity",
];

/// Failure signatures that indicate missing or stale credentials
const AUTH_PATTERNS: &[&str] = &[
    "not logged in",
    "login required",
    "unauthenticated",
    "authentication failed",
    "invalid api key",
    "api key not valid",
    "credentials",
];

impl FailureClass {
    /// Classify an invocation error from its message and stderr text.
    ///
    /// Only engine failures are inspected; a timeout or spawn error is
    /// never a quota signal.
    fn from_error(err: &RelayError) -> Self {
        let text = match err {
            RelayError::EngineFailure {
                message, stderr, ..
            } => format!("{message} {stderr}").to_lowercase(),
            _ => return FailureClass::Other,
        };
        if QUOTA_PATTERNS.iter().any(|p| text.contains(p)) {
            return FailureClass::Quota;
        }
        if AUTH_PATTERNS.iter().any(|p| text.contains(p)) {
            return FailureClass::Authentication;
        }
        FailureClass::Other
    }
}

/// Orchestrates research calls against the external engine
pub struct Orchestrator {
    config: RelayConfig,
    invoker: Arc<dyn EngineInvoker>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the real subprocess runner
    pub fn new(config: RelayConfig) -> Self {
        Self::with_invoker(config, Arc::new(ProcessRunner::new()))
    }

    /// Create an orchestrator with an injected engine seam (used in tests)
    pub fn with_invoker(config: RelayConfig, invoker: Arc<dyn EngineInvoker>) -> Self {
        Self { config, invoker }
    }

    /// Build the engine command for one tier.
    ///
    /// The prompt always carries the safety preamble, the engine is always
    /// asked for structured output, and no write-enabling flag is ever
    /// emitted. An `Auto` tier omits the model argument entirely.
    fn build_command(&self, tier: &ModelTier, prompt: &str) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.config.engine_binary)
            .arg("--output-format")
            .arg("json");
        if let ModelTier::Named(model) = tier {
            spec = spec.arg("-m").arg(model);
        }
        spec = spec.arg("-p").arg(format!("{SAFETY_PREAMBLE}\n\n{prompt}"));
        if self.config.call_timeout_seconds > 0 {
            spec = spec.with_timeout(Duration::from_secs(self.config.call_timeout_seconds));
        }
        spec
    }

    /// Run one research call through its tier plan.
    ///
    /// Engine output chunks are forwarded to `progress` unchanged; a note is
    /// emitted before each fallback retry. The returned outcome records the
    /// tier that actually answered plus the full attempt log.
    pub async fn execute(
        &self,
        prompt: &str,
        class: RequestClass,
        progress: Option<ProgressSink>,
    ) -> RelayResult<ResearchOutcome> {
        let plan = self.config.plan_for(class);
        if plan.tiers.is_empty() {
            return Err(RelayError::config(format!(
                "no model tiers configured for class `{class}`"
            )));
        }

        let started = Instant::now();
        let mut attempts: Vec<TierAttempt> = Vec::new();

        for (i, tier) in plan.tiers.iter().enumerate() {
            let spec = self.build_command(tier, prompt);
            let chunk_sink = progress.as_ref().map(|p| forward_chunks(p.clone()));
            let attempt_start = Instant::now();
            info!(tier = tier.label(), class = %class, "attempting engine tier");

            match self.invoker.invoke(&spec, chunk_sink).await {
                Ok(stdout) => {
                    let duration_ms = attempt_start.elapsed().as_millis() as u64;
                    attempts.push(TierAttempt::success(tier.label(), duration_ms));
                    info!(tier = tier.label(), duration_ms, "engine tier succeeded");

                    let parsed = EngineOutput::parse(&stdout);
                    let (tokens_used, external_call_count) = parsed
                        .stats()
                        .map(|s| (s.total_tokens, s.external_calls))
                        .unwrap_or((None, None));
                    let text = parsed.into_text();
                    let files_referenced = extract_files_referenced(&text);

                    return Ok(ResearchOutcome {
                        text,
                        files_referenced,
                        tokens_used,
                        external_call_count,
                        latency_ms: started.elapsed().as_millis() as u64,
                        model_used: tier.label().to_string(),
                        attempts,
                    });
                }
                Err(err) => {
                    let duration_ms = attempt_start.elapsed().as_millis() as u64;
                    let class_of_failure = FailureClass::from_error(&err);
                    warn!(
                        tier = tier.label(),
                        kind = err.kind(),
                        "engine tier failed: {err}"
                    );

                    match class_of_failure {
                        FailureClass::Authentication => {
                            attempts.push(TierAttempt::failure(
                                tier.label(),
                                "authentication_missing",
                                err.to_string(),
                                duration_ms,
                            ));
                            let detail = match err {
                                RelayError::EngineFailure { message, .. } => message,
                                other => other.to_string(),
                            };
                            return Err(RelayError::authentication_missing(detail));
                        }
                        FailureClass::Quota => {
                            let message = err.to_string();
                            attempts.push(TierAttempt::failure(
                                tier.label(),
                                "quota",
                                message.clone(),
                                duration_ms,
                            ));
                            if i + 1 < plan.tiers.len() {
                                let next = plan.tiers[i + 1].label();
                                info!(
                                    from = tier.label(),
                                    to = next,
                                    "quota exhausted, falling back"
                                );
                                if let Some(p) = &progress {
                                    let _ = p.send(ProgressEvent::Note {
                                        message: format!(
                                            "model {} hit its usage limit, falling back to {next}",
                                            tier.label()
                                        ),
                                    });
                                }
                                continue;
                            }
                            return Err(RelayError::QuotaExhausted {
                                tried: plan.labels(),
                                last_error: message,
                            });
                        }
                        FailureClass::Other => {
                            attempts.push(TierAttempt::failure(
                                tier.label(),
                                err.kind(),
                                err.to_string(),
                                duration_ms,
                            ));
                            return Err(err);
                        }
                    }
                }
            }
        }

        // The loop always returns from its last iteration.
        Err(RelayError::config("tier plan produced no attempts"))
    }
}

/// Bridge raw stdout chunks into the caller's progress channel.
fn forward_chunks(progress: ProgressSink) -> OutputSink {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            if progress.send(ProgressEvent::Output { chunk }).is_err() {
                break;
            }
        }
    });
    tx
}
