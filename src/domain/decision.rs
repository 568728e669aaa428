//! Admission decision engine.

use serde::Serialize;

use super::policy::RateLimitPolicy;

/// Outcome of comparing an estimated count against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u64,
    pub estimated_count: f64,
    pub remaining: u64,
    /// Seconds until the current fixed bucket rolls over.
    pub reset_seconds: u64,
}

/// Decides whether a request is admitted.
///
/// The boundary is inclusive: the request that brings the estimate to exactly
/// `limit` is allowed, the next one is not.
pub fn decide(policy: &RateLimitPolicy, estimated_count: f64, now_ms: u64) -> Decision {
    let limit = policy.limit();
    let allowed = estimated_count <= limit as f64;
    let remaining = (limit as f64 - estimated_count).floor().max(0.0) as u64;

    Decision {
        allowed,
        limit,
        estimated_count,
        remaining,
        reset_seconds: reset_seconds(policy, now_ms),
    }
}

/// `window - (now mod window)` rounded up to whole seconds.
pub fn reset_seconds(policy: &RateLimitPolicy, now_ms: u64) -> u64 {
    let window_ms = policy.window_ms();
    let until_rollover_ms = window_ms - now_ms % window_ms;
    until_rollover_ms.div_ceil(1000)
}
