//! Segment Store
//!
//! In-memory, time-bounded cache of segment bundles keyed by retrieval key.
//! Bundles are immutable after insertion; expiry is enforced both lazily on
//! read and by a periodic background sweep. The store is an owned instance
//! with its own lifecycle, so tests construct isolated stores instead of
//! sharing process-wide state.
//!
//! Keys are short-lived capability tokens: practically unguessable by
//! enumeration (timestamp + counter + random suffix), not cryptographic
//! credentials. A process restart discards every bundle.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::debug;

use crate::models::segment::{BundleMetadata, Segment};
use crate::models::settings::RelayConfig;

/// A stored collection of segments under one retrieval key.
///
/// Owned exclusively by the store; handed out by value so callers can never
/// mutate a stored bundle in place.
#[derive(Debug, Clone)]
pub struct SegmentBundle {
    /// Retrieval key the bundle is stored under
    pub key: String,
    /// The segments, in index order
    pub segments: Vec<Segment>,
    /// When the bundle was stored
    pub created_at: Instant,
    /// When the bundle stops being retrievable
    pub expires_at: Instant,
    /// Wall-clock expiry surfaced in metadata
    expires_at_utc: chrono::DateTime<chrono::Utc>,
}

impl SegmentBundle {
    /// The expiry test shared by the lazy read path and the sweep.
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Surfaced metadata view of this bundle
    pub fn metadata(&self) -> BundleMetadata {
        BundleMetadata {
            total_count: self.segments.len() as u32,
            expires_at: self.expires_at_utc.to_rfc3339(),
        }
    }
}

/// Time-bounded key→segment-list cache with lazy and periodic eviction
pub struct SegmentStore {
    bundles: Arc<Mutex<HashMap<String, SegmentBundle>>>,
    ttl: Duration,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SegmentStore {
    /// Create a store with explicit lifetimes
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            bundles: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            sweep_interval: sweep_interval.max(Duration::from_millis(1)),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a store from the relay configuration
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            Duration::from_secs(config.segment_ttl_seconds),
            Duration::from_secs(config.sweep_interval_seconds),
        )
    }

    fn lock_bundles(&self) -> MutexGuard<'_, HashMap<String, SegmentBundle>> {
        match self.bundles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Store a segment list under a fresh key and return the key.
    ///
    /// Restarts the background sweep if it is not running (it deactivates
    /// itself whenever the store drains).
    pub fn put(&self, segments: Vec<Segment>) -> String {
        let key = generate_key();
        let now = Instant::now();
        let bundle = SegmentBundle {
            key: key.clone(),
            segments,
            created_at: now,
            expires_at: now + self.ttl,
            expires_at_utc: chrono::Utc::now()
                + chrono::Duration::seconds(self.ttl.as_secs() as i64),
        };
        self.lock_bundles().insert(key.clone(), bundle);
        self.ensure_sweeper();
        key
    }

    /// Fetch a live bundle, evicting it lazily if it has expired.
    pub fn get(&self, key: &str) -> Option<SegmentBundle> {
        let mut bundles = self.lock_bundles();
        let expired = bundles
            .get(key)
            .map(|b| b.is_expired(Instant::now()))
            .unwrap_or(false);
        if expired {
            bundles.remove(key);
            return None;
        }
        bundles.get(key).cloned()
    }

    /// Fetch one segment by 1-based index.
    pub fn get_segment(&self, key: &str, index: u32) -> Option<Segment> {
        let bundle = self.get(key)?;
        if index == 0 {
            return None;
        }
        bundle.segments.get(index as usize - 1).cloned()
    }

    /// Metadata for a live bundle.
    pub fn metadata(&self, key: &str) -> Option<BundleMetadata> {
        self.get(key).map(|b| b.metadata())
    }

    /// Explicitly remove a bundle; returns whether anything was removed.
    pub fn evict(&self, key: &str) -> bool {
        self.lock_bundles().remove(key).is_some()
    }

    /// Number of live (unexpired) bundles.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock_bundles()
            .values()
            .filter(|b| !b.is_expired(now))
            .count()
    }

    /// Whether the store holds no live bundles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the background sweep. Stored bundles remain readable until they
    /// expire (lazy eviction still applies).
    pub fn shutdown(&self) {
        let mut slot = match self.sweeper.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Start the sweep task unless one is already running. Outside a tokio
    /// runtime the store falls back to lazy eviction only.
    fn ensure_sweeper(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let mut slot = match self.sweeper.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let bundles = Arc::clone(&self.bundles);
        let sweep_interval = self.sweep_interval;
        *slot = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let mut map = match bundles.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let before = map.len();
                map.retain(|_, bundle| !bundle.is_expired(now));
                let removed = before - map.len();
                if removed > 0 {
                    debug!(removed, "swept expired segment bundles");
                }
                if map.is_empty() {
                    // Deactivate; the next put restarts the sweep
                    break;
                }
            }
        }));
    }

    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.lock_bundles().len()
    }
}

impl Drop for SegmentStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Generate a fresh retrieval key: millisecond timestamp, process-wide
/// counter, and a random alphanumeric suffix. No two concurrent puts can
/// collide without also colliding on the counter.
fn generate_key() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("res-{:x}-{:x}-{}", millis as u64, counter, suffix)
}
