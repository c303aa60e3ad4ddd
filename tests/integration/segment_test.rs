//! Segmenter and Segment Store Integration Tests
//!
//! Round-trip and lifetime properties of the chunking pipeline.

use farsight::{split, Segment, SegmentStore};
use tokio::time::Duration;

fn reassemble(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.content.as_str()).collect()
}

#[test]
fn twenty_five_hundred_chars_at_1024_yields_three_lossless_segments() {
    let text = "A".repeat(2500);
    let segments = split(&text, 1024);
    assert_eq!(segments.len(), 3);
    assert_eq!(reassemble(&segments), text);
    assert!(segments.iter().all(|s| s.total_count == 3));
    assert_eq!(
        segments.iter().map(|s| s.index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn round_trip_holds_for_mixed_content_and_sizes() {
    let text: String = (0..500)
        .map(|i| format!("entry {i}: some analysis text with detail\n"))
        .collect();
    for target in [16, 100, 999, 4096, text.len(), text.len() + 1] {
        let segments = split(&text, target);
        assert_eq!(reassemble(&segments), text, "target {target}");
    }
}

#[test]
fn text_at_or_under_target_is_a_single_segment() {
    let segments = split("small", 1024);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].index, 1);
    assert_eq!(segments[0].total_count, 1);
}

#[tokio::test]
async fn stored_single_segment_round_trips_and_bounds_index() {
    let store = SegmentStore::new(Duration::from_secs(3600), Duration::from_secs(300));
    let key = store.put(vec![Segment::new(1, 1, "x")]);

    let segment = store.get_segment(&key, 1).expect("segment 1 present");
    assert_eq!(segment.content, "x");
    assert!(store.get_segment(&key, 2).is_none());
    assert!(store.get_segment(&key, 0).is_none());
}

#[tokio::test]
async fn split_results_survive_store_and_reassemble() {
    let store = SegmentStore::new(Duration::from_secs(3600), Duration::from_secs(300));
    let text = "line of output\n".repeat(400);
    let segments = split(&text, 1000);
    let total = segments.len() as u32;
    let key = store.put(segments);

    let meta = store.metadata(&key).expect("metadata present");
    assert_eq!(meta.total_count, total);

    let mut rebuilt = String::new();
    for index in 1..=total {
        rebuilt.push_str(&store.get_segment(&key, index).expect("segment").content);
    }
    assert_eq!(rebuilt, text);
}

#[tokio::test(start_paused = true)]
async fn bundle_is_retrievable_before_ttl_and_absent_after() {
    let store = SegmentStore::new(Duration::from_secs(3600), Duration::from_secs(86_400));
    let key = store.put(vec![Segment::new(1, 1, "cached")]);

    tokio::time::advance(Duration::from_secs(3599)).await;
    assert!(store.get(&key).is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(store.get(&key).is_none());
    assert!(store.get_segment(&key, 1).is_none());
}

#[tokio::test]
async fn two_stores_are_isolated_instances() {
    let a = SegmentStore::new(Duration::from_secs(3600), Duration::from_secs(300));
    let b = SegmentStore::new(Duration::from_secs(3600), Duration::from_secs(300));
    let key = a.put(vec![Segment::new(1, 1, "only in a")]);
    assert!(a.get(&key).is_some());
    assert!(b.get(&key).is_none());
}

#[tokio::test]
async fn concurrent_puts_get_distinct_keys() {
    let store = std::sync::Arc::new(SegmentStore::new(
        Duration::from_secs(3600),
        Duration::from_secs(300),
    ));
    let mut handles = Vec::new();
    for i in 0..32 {
        let store = std::sync::Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.put(vec![Segment::new(1, 1, format!("bundle {i}"))])
        }));
    }
    let mut keys = std::collections::HashSet::new();
    for handle in handles {
        assert!(keys.insert(handle.await.unwrap()));
    }
    assert_eq!(store.len(), 32);
}
