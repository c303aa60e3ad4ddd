//! Full Request Flow Tests
//!
//! Orchestrate against a scripted engine, segment the oversized answer,
//! store it, and redeem the retrieval key segment by segment.

use async_trait::async_trait;
use farsight::{
    split, CommandSpec, EngineInvoker, Orchestrator, OutputSink, RelayConfig, RelayResult,
    RequestClass, SegmentStore,
};
use std::sync::Arc;
use tokio::time::Duration;

/// Engine double that answers every call with the same payload.
struct FixedEngine {
    stdout: String,
}

#[async_trait]
impl EngineInvoker for FixedEngine {
    async fn invoke(
        &self,
        _spec: &CommandSpec,
        on_output: Option<OutputSink>,
    ) -> RelayResult<String> {
        if let Some(sink) = on_output {
            let _ = sink.send(self.stdout.clone());
        }
        Ok(self.stdout.clone())
    }
}

#[tokio::test]
async fn oversized_answer_is_segmented_stored_and_retrievable() {
    let body: String = (0..300)
        .map(|i| format!("finding {i}: a detailed observation about the codebase\n"))
        .collect();
    let envelope = serde_json::json!({ "response": body.clone() }).to_string();
    let orch = Orchestrator::with_invoker(
        RelayConfig::default(),
        Arc::new(FixedEngine { stdout: envelope }),
    );

    let outcome = orch
        .execute("survey the codebase", RequestClass::Deep, None)
        .await
        .unwrap();
    assert_eq!(outcome.text, body);

    // Oversized for a small chunk target; partition and store
    let chunk_target = 2048;
    assert!(outcome.text.len() > chunk_target);
    let segments = split(&outcome.text, chunk_target);
    let total = segments.len() as u32;
    assert!(total > 1);

    let store = SegmentStore::new(Duration::from_secs(3600), Duration::from_secs(300));
    let key = store.put(segments);

    // First segment plus the key is what the caller gets back
    let first = store.get_segment(&key, 1).expect("first segment");
    assert_eq!(first.index, 1);
    assert_eq!(first.total_count, total);

    // Later the caller redeems the key for the rest
    let mut rebuilt = String::new();
    for index in 1..=total {
        rebuilt.push_str(&store.get_segment(&key, index).expect("segment").content);
    }
    assert_eq!(rebuilt, outcome.text);

    // Out-of-range redemption is absent, not an error
    assert!(store.get_segment(&key, total + 1).is_none());
}

#[tokio::test]
async fn small_answer_needs_no_segmentation() {
    let envelope = r#"{"response": "concise answer"}"#.to_string();
    let orch = Orchestrator::with_invoker(
        RelayConfig::default(),
        Arc::new(FixedEngine { stdout: envelope }),
    );
    let config = RelayConfig::default();

    let outcome = orch
        .execute("quick question", RequestClass::Fast, None)
        .await
        .unwrap();
    let segments = split(&outcome.text, config.chunk_target_bytes);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].content, "concise answer");
}
