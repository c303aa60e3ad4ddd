//! Liveness Notifier
//!
//! Emits periodic out-of-band status messages while an orchestrated call is
//! in flight, so callers waiting on a long engine run can tell the relay is
//! alive. Progress tracking is opt-in per call; every in-flight call owns
//! its own monitor and timer, so two overlapping calls can never leak
//! previews into each other.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::models::settings::RelayConfig;
use crate::services::orchestrator::ProgressEvent;
use crate::utils::redact::redact;

/// Callback receiving formatted status lines
pub type StatusEmitter = Arc<dyn Fn(String) + Send + Sync>;

/// Upper bound on the preview carried in one heartbeat
const PREVIEW_MAX_CHARS: usize = 160;

/// Factory for per-call monitors, carrying the configured heartbeat interval
pub struct LivenessMonitor {
    interval: Duration,
}

impl LivenessMonitor {
    /// Create a factory with an explicit heartbeat interval
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Create a factory from the relay configuration
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(Duration::from_secs(config.liveness_interval_seconds))
    }

    /// Begin monitoring one in-flight call.
    ///
    /// A repeating timer starts immediately; each tick emits a bounded
    /// status line with a preview of the most recent output. The timer runs
    /// until [`CallMonitor::finish`] or drop.
    pub fn begin(&self, label: &str, emitter: StatusEmitter) -> CallMonitor {
        let call_id = short_call_id();
        let latest: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
        let started = Instant::now();

        let ticker = {
            let latest = Arc::clone(&latest);
            let emitter = Arc::clone(&emitter);
            let label = label.to_string();
            let call_id = call_id.clone();
            let interval = self.interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let preview = {
                        let latest = match latest.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if latest.is_empty() {
                            "no output yet".to_string()
                        } else {
                            redact(&latest)
                        }
                    };
                    emitter(format!(
                        "[{label} {call_id}] still running ({}s elapsed): {preview}",
                        started.elapsed().as_secs()
                    ));
                }
            })
        };

        CallMonitor {
            label: label.to_string(),
            call_id,
            latest,
            started,
            emitter,
            ticker,
            pump: Mutex::new(None),
        }
    }
}

/// Monitor for a single in-flight call
pub struct CallMonitor {
    label: String,
    call_id: String,
    latest: Arc<Mutex<String>>,
    started: Instant,
    emitter: StatusEmitter,
    ticker: JoinHandle<()>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl CallMonitor {
    /// Record a newly-arrived output chunk for the next heartbeat preview.
    pub fn observe(&self, chunk: &str) {
        append_preview(&self.latest, chunk);
    }

    /// Pump an orchestrator progress channel into this monitor: output
    /// chunks feed the preview, orchestration notes are emitted at once.
    pub fn watch(&self, mut progress: mpsc::UnboundedReceiver<ProgressEvent>) {
        let latest = Arc::clone(&self.latest);
        let emitter = Arc::clone(&self.emitter);
        let label = self.label.clone();
        let call_id = self.call_id.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = progress.recv().await {
                match event {
                    ProgressEvent::Output { chunk } => append_preview(&latest, &chunk),
                    ProgressEvent::Note { message } => {
                        emitter(format!("[{label} {call_id}] {message}"));
                    }
                }
            }
        });
        let mut slot = match self.pump.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the timer unconditionally and emit one final status line
    /// synchronously.
    pub fn finish(self, status: &str) {
        self.ticker.abort();
        {
            let mut slot = match self.pump.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        (self.emitter)(format!(
            "[{} {}] {status} after {}s",
            self.label,
            self.call_id,
            self.started.elapsed().as_secs()
        ));
    }
}

impl Drop for CallMonitor {
    fn drop(&mut self) {
        self.ticker.abort();
        if let Ok(mut slot) = self.pump.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

/// Append a chunk to a preview buffer, keeping only the tail.
fn append_preview(latest: &Mutex<String>, chunk: &str) {
    let mut latest = match latest.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    latest.push_str(chunk);
    let count = latest.chars().count();
    if count > PREVIEW_MAX_CHARS {
        *latest = latest.chars().skip(count - PREVIEW_MAX_CHARS).collect();
    }
}

fn short_call_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
