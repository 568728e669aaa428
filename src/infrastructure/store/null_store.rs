//! Counter store that is never available.

use crate::domain::store::{CounterStore, StoreError, StoreResult, WindowCounts};
use async_trait::async_trait;
use tracing::debug;

/// A counter store that fails every call with [`StoreError::Unavailable`].
///
/// Installed when the configured Redis store cannot be reached at startup, so
/// admission follows the configured fail mode instead of the process refusing
/// to start.
pub struct NullCounterStore {
    reason: String,
}

impl NullCounterStore {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!("Using NullCounterStore ({})", reason);
        Self { reason }
    }

    fn unavailable(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl Default for NullCounterStore {
    fn default() -> Self {
        Self::new("counter store not connected")
    }
}

#[async_trait]
impl CounterStore for NullCounterStore {
    async fn increment_window(
        &self,
        _current_key: &str,
        _previous_key: &str,
        _ttl_seconds: u64,
    ) -> StoreResult<WindowCounts> {
        Err(self.unavailable())
    }

    async fn peek(&self, _key: &str) -> StoreResult<Option<u64>> {
        Err(self.unavailable())
    }

    async fn flush(&self, _prefix: &str) -> StoreResult<u64> {
        Err(self.unavailable())
    }

    async fn health_check(&self) -> bool {
        false
    }
}
