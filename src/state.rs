//! Shared application state.

use std::sync::Arc;

use crate::application::services::RateLimiter;
use crate::domain::store::CounterStore;

/// State injected into handlers and middleware.
///
/// Cheap to clone; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub store: Arc<dyn CounterStore>,
    /// Message returned in 429 bodies.
    pub rate_limit_message: Arc<str>,
}

impl AppState {
    pub fn new(limiter: Arc<RateLimiter>, rate_limit_message: impl Into<Arc<str>>) -> Self {
        let store = limiter.counter().store().clone();
        Self {
            limiter,
            store,
            rate_limit_message: rate_limit_message.into(),
        }
    }
}
