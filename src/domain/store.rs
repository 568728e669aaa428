//! Counter store contract.
//!
//! The store, not the process, is authoritative for counts: worker processes
//! share no memory, so every increment is a round trip to the store.

use async_trait::async_trait;

/// Errors returned by counter stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable, failing, or slower than the call timeout.
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for counter store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Counts returned by [`CounterStore::increment_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowCounts {
    /// Value of the current bucket after the increment.
    pub current: u64,
    /// Value of the previous bucket, 0 when absent or expired.
    pub previous: u64,
}

/// Network-accessible key-value store holding bucket counters.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisCounterStore`] - shared Redis-protocol store
/// - [`crate::infrastructure::store::MemoryCounterStore`] - single-process store
/// - [`crate::infrastructure::store::NullCounterStore`] - always unavailable
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `current_key` and reads `previous_key`.
    ///
    /// The current key is created at 0 if absent. Its expiry is set to
    /// `ttl_seconds` only when the increment created it, and in the same atomic
    /// step, so no separate "set expiry" call can race with other processes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or fails.
    async fn increment_window(
        &self,
        current_key: &str,
        previous_key: &str,
        ttl_seconds: u64,
    ) -> StoreResult<WindowCounts>;

    /// Reads a counter without modifying it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or fails.
    async fn peek(&self, key: &str) -> StoreResult<Option<u64>>;

    /// Deletes every key starting with `prefix`. Operational use only.
    ///
    /// Returns the number of deleted keys.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or fails.
    async fn flush(&self, prefix: &str) -> StoreResult<u64>;

    /// Checks if the store is reachable.
    async fn health_check(&self) -> bool;
}
