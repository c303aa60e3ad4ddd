//! Liveness Notifier Integration Tests
//!
//! Heartbeat cadence, cancel-on-completion, and per-call isolation.

use farsight::{LivenessMonitor, ProgressEvent, StatusEmitter};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Duration;

fn collector() -> (StatusEmitter, Arc<Mutex<Vec<String>>>) {
    let collected: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let emitter: StatusEmitter = Arc::new(move |line| {
        sink.lock().unwrap().push(line);
    });
    (emitter, collected)
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn heartbeats_carry_latest_output_preview() {
    let (emitter, collected) = collector();
    let factory = LivenessMonitor::new(Duration::from_secs(25));
    let monitor = factory.begin("research", emitter);
    settle().await;

    monitor.observe("scanning module graph");
    tokio::time::advance(Duration::from_secs(25)).await;
    settle().await;

    let lines = collected.lock().unwrap().clone();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("still running"));
    assert!(lines[0].contains("scanning module graph"));

    drop(lines);
    monitor.observe(" - now summarizing");
    tokio::time::advance(Duration::from_secs(25)).await;
    settle().await;
    assert_eq!(collected.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn finish_cancels_timer_and_emits_exactly_one_final_line() {
    let (emitter, collected) = collector();
    let monitor = LivenessMonitor::new(Duration::from_secs(25)).begin("research", emitter);
    settle().await;

    monitor.finish("completed");
    let after_finish = collected.lock().unwrap().len();
    assert_eq!(after_finish, 1);
    assert!(collected.lock().unwrap()[0].contains("completed"));

    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(collected.lock().unwrap().len(), after_finish);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_monitor_stops_heartbeats() {
    let (emitter, collected) = collector();
    let monitor = LivenessMonitor::new(Duration::from_secs(25)).begin("research", emitter);
    settle().await;
    drop(monitor);

    tokio::time::advance(Duration::from_secs(300)).await;
    settle().await;
    assert!(collected.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn watch_feeds_previews_and_relays_notes() {
    let (emitter, collected) = collector();
    let monitor = LivenessMonitor::new(Duration::from_secs(25)).begin("research", emitter);
    let (tx, rx) = mpsc::unbounded_channel();
    monitor.watch(rx);
    settle().await;

    tx.send(ProgressEvent::Output {
        chunk: "partial result text".to_string(),
    })
    .unwrap();
    tx.send(ProgressEvent::Note {
        message: "model gemini-2.5-pro hit its usage limit, falling back to gemini-2.5-flash"
            .to_string(),
    })
    .unwrap();
    settle().await;

    // The note is relayed immediately, without waiting for a heartbeat
    let lines = collected.lock().unwrap().clone();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("falling back"));
    drop(lines);

    tokio::time::advance(Duration::from_secs(25)).await;
    settle().await;
    let lines = collected.lock().unwrap();
    assert!(lines.last().unwrap().contains("partial result text"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_have_independent_monitors() {
    let (emitter_a, collected_a) = collector();
    let (emitter_b, collected_b) = collector();
    let factory = LivenessMonitor::new(Duration::from_secs(25));
    let monitor_a = factory.begin("call-a", emitter_a);
    let monitor_b = factory.begin("call-b", emitter_b);
    settle().await;

    monitor_a.observe("alpha stream");
    monitor_b.observe("beta stream");
    tokio::time::advance(Duration::from_secs(25)).await;
    settle().await;

    let lines_a = collected_a.lock().unwrap();
    let lines_b = collected_b.lock().unwrap();
    assert!(lines_a[0].contains("alpha stream"));
    assert!(!lines_a[0].contains("beta stream"));
    assert!(lines_b[0].contains("beta stream"));
    assert!(!lines_b[0].contains("alpha stream"));
}
