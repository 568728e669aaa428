//! In-process counter store.

use crate::domain::clock::Clock;
use crate::domain::store::{CounterStore, StoreError, StoreResult, WindowCounts};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Minimum time between two sweeps of expired entries.
const SWEEP_INTERVAL_MS: u64 = 5_000;

struct Entry {
    value: u64,
    expires_at_ms: u64,
}

impl Entry {
    fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at_ms > now_ms
    }
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, Entry>,
    next_sweep_ms: u64,
}

impl Entries {
    /// Drops expired entries at most once per [`SWEEP_INTERVAL_MS`].
    ///
    /// Between sweeps expired entries stay in the map; every read checks
    /// liveness itself.
    fn maybe_sweep(&mut self, now_ms: u64) {
        if now_ms < self.next_sweep_ms {
            return;
        }
        let before = self.map.len();
        self.map.retain(|_, e| e.is_live(now_ms));
        self.next_sweep_ms = now_ms + SWEEP_INTERVAL_MS;

        let swept = before - self.map.len();
        if swept > 0 {
            debug!("Swept {} expired counter keys", swept);
        }
    }
}

/// Counter store kept in process memory.
///
/// Counts are not shared between worker processes, so limits are only enforced
/// per process. Suitable for development, single-process deployments and tests.
/// Expiry follows the injected [`Clock`], which lets tests move time freely.
pub struct MemoryCounterStore {
    entries: Mutex<Entries>,
    clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            clock,
        }
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.entries
            .lock()
            .map(|entries| entries.map.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn stored_keys(&self) -> usize {
        self.entries.lock().map(|e| e.map.len()).unwrap_or(0)
    }

    fn poisoned() -> StoreError {
        warn!("Memory counter store lock poisoned");
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_window(
        &self,
        current_key: &str,
        previous_key: &str,
        ttl_seconds: u64,
    ) -> StoreResult<WindowCounts> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;

        entries.maybe_sweep(now);

        let fresh = || Entry {
            value: 0,
            expires_at_ms: now + ttl_seconds * 1000,
        };
        let entry = entries
            .map
            .entry(current_key.to_string())
            .or_insert_with(fresh);
        if !entry.is_live(now) {
            *entry = fresh();
        }
        entry.value += 1;
        let current = entry.value;

        let previous = entries
            .map
            .get(previous_key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value)
            .unwrap_or(0);

        Ok(WindowCounts { current, previous })
    }

    async fn peek(&self, key: &str) -> StoreResult<Option<u64>> {
        let now = self.clock.now_ms();
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries
            .map
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value))
    }

    async fn flush(&self, prefix: &str) -> StoreResult<u64> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        let mut deleted = 0;
        entries.map.retain(|key, e| {
            if !key.starts_with(prefix) {
                return true;
            }
            if e.is_live(now) {
                deleted += 1;
            }
            false
        });
        Ok(deleted)
    }

    async fn health_check(&self) -> bool {
        self.entries.lock().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryCounterStore) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = MemoryCounterStore::new(clock.clone());
        (clock, store)
    }

    #[tokio::test]
    async fn test_increment_creates_and_counts() {
        let (_clock, store) = store();

        let first = store.increment_window("k:2", "k:1", 20).await.unwrap();
        let second = store.increment_window("k:2", "k:1", 20).await.unwrap();

        assert_eq!(first, WindowCounts { current: 1, previous: 0 });
        assert_eq!(second, WindowCounts { current: 2, previous: 0 });
        assert_eq!(store.peek("k:2").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_reads_previous_bucket() {
        let (_clock, store) = store();

        for _ in 0..3 {
            store.increment_window("k:1", "k:0", 20).await.unwrap();
        }
        let counts = store.increment_window("k:2", "k:1", 20).await.unwrap();

        assert_eq!(counts, WindowCounts { current: 1, previous: 3 });
    }

    #[tokio::test]
    async fn test_expiry_is_set_on_first_increment_only() {
        let (clock, store) = store();

        store.increment_window("k:1", "k:0", 20).await.unwrap();
        clock.advance_secs(15);
        store.increment_window("k:1", "k:0", 20).await.unwrap();
        assert_eq!(store.peek("k:1").await.unwrap(), Some(2));

        // 20s after creation, regardless of the later increment
        clock.advance_secs(5);
        assert_eq!(store.peek("k:1").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_flush_by_prefix() {
        let (_clock, store) = store();

        store.increment_window("a:1", "a:0", 20).await.unwrap();
        store.increment_window("a:2", "a:1", 20).await.unwrap();
        store.increment_window("b:1", "b:0", 20).await.unwrap();

        assert_eq!(store.flush("a:").await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_swept_lazily() {
        let (clock, store) = store();

        store.increment_window("a:1", "a:0", 1).await.unwrap();
        store.increment_window("b:1", "b:0", 1).await.unwrap();
        assert_eq!(store.stored_keys(), 2);

        // Expired, but inside the sweep interval: reads ignore the stale entries
        clock.advance_ms(1_000);
        assert!(store.is_empty());
        let counts = store.increment_window("a:2", "a:1", 1).await.unwrap();
        assert_eq!(counts, WindowCounts { current: 1, previous: 0 });
        assert_eq!(store.stored_keys(), 3);

        // An expired key being incremented again starts from zero
        let counts = store.increment_window("b:1", "b:0", 1).await.unwrap();
        assert_eq!(counts.current, 1);

        // Next sweep drops everything that has expired since
        clock.advance_ms(SWEEP_INTERVAL_MS + 1_000);
        store.increment_window("c:1", "c:0", 20).await.unwrap();
        assert_eq!(store.stored_keys(), 1);
    }

    #[tokio::test]
    async fn test_flush_counts_only_live_keys() {
        let (clock, store) = store();

        store.increment_window("a:1", "a:0", 1).await.unwrap();
        clock.advance_ms(500);
        store.increment_window("a:2", "a:1", 20).await.unwrap();
        clock.advance_ms(600);

        assert_eq!(store.flush("a:").await.unwrap(), 1);
        assert_eq!(store.stored_keys(), 0);
    }
}
