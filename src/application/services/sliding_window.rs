//! Sliding window counter over two adjacent fixed buckets.
//!
//! A true sliding log stores every request timestamp. Instead, each key keeps
//! two counters in the shared store: the current fixed bucket and the one
//! before it. The rolling count is estimated as
//!
//! ```text
//! estimate = previous × (1 − elapsed) + current
//! ```
//!
//! where `elapsed` is the fraction of the current bucket that has passed. This
//! is O(1) space per key and assumes requests in the previous bucket were
//! evenly spread; the error is bounded by the weight given to the previous
//! bucket.

use crate::domain::clock::Clock;
use crate::domain::key::RateLimitKey;
use crate::domain::store::{CounterStore, StoreError};
use std::sync::Arc;
use std::time::Duration;

/// Estimate produced by one increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowEstimate {
    pub estimated_count: f64,
    pub current: u64,
    pub previous: u64,
    /// Time at which the estimate was taken, Unix milliseconds.
    pub now_ms: u64,
}

/// Per-key approximate request counter backed by a [`CounterStore`].
///
/// Holds no counts itself; safe to share between tasks and to run in many
/// processes at once. Concurrency is delegated to the store's atomic increment.
pub struct SlidingWindowCounter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SlidingWindowCounter {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            store,
            clock,
            timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Counts one request against `key` and returns the rolling estimate.
    ///
    /// Performs exactly one store round trip, bounded by the configured timeout.
    /// No retries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store fails or the call times out.
    pub async fn increment(
        &self,
        key: &RateLimitKey,
        window_seconds: u64,
    ) -> Result<WindowEstimate, StoreError> {
        let now_ms = self.clock.now_ms();
        let window_ms = window_seconds * 1000;
        let bucket = now_ms / window_ms;

        let current_key = key.bucket_key(bucket);
        let previous_key = key.bucket_key(bucket.saturating_sub(1));
        let ttl_seconds = window_seconds * 2;

        let counts = tokio::time::timeout(
            self.timeout,
            self.store
                .increment_window(&current_key, &previous_key, ttl_seconds),
        )
        .await
        .map_err(|_| {
            StoreError::Unavailable(format!(
                "counter store call exceeded {}ms",
                self.timeout.as_millis()
            ))
        })??;

        Ok(WindowEstimate {
            estimated_count: estimate(counts.previous, counts.current, now_ms, window_ms),
            current: counts.current,
            previous: counts.previous,
            now_ms,
        })
    }

    /// Reads the estimate for `key` without counting a request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store fails or the call times out.
    pub async fn peek(
        &self,
        key: &RateLimitKey,
        window_seconds: u64,
    ) -> Result<WindowEstimate, StoreError> {
        let now_ms = self.clock.now_ms();
        let window_ms = window_seconds * 1000;
        let bucket = now_ms / window_ms;

        let read = async {
            let current = self.store.peek(&key.bucket_key(bucket)).await?;
            let previous = self
                .store
                .peek(&key.bucket_key(bucket.saturating_sub(1)))
                .await?;
            Ok::<_, StoreError>((current.unwrap_or(0), previous.unwrap_or(0)))
        };

        let (current, previous) = tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| StoreError::Unavailable("counter store read timed out".to_string()))??;

        Ok(WindowEstimate {
            estimated_count: estimate(previous, current, now_ms, window_ms),
            current,
            previous,
            now_ms,
        })
    }
}

/// Weighted two-bucket estimate.
pub fn estimate(previous: u64, current: u64, now_ms: u64, window_ms: u64) -> f64 {
    let elapsed = (now_ms % window_ms) as f64 / window_ms as f64;
    previous as f64 * (1.0 - elapsed) + current as f64
}
