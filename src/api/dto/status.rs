//! DTOs for the rate limit status endpoint.

use serde::Serialize;

use crate::application::services::Inspection;
use crate::domain::policy::RateLimitPolicy;

/// The caller's standing in one scope.
#[derive(Debug, Serialize)]
pub struct RateLimitStatusResponse {
    pub scope: String,
    pub client: String,
    pub policy: PolicyDto,

    /// Absent when the counter store could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowDto>,
}

#[derive(Debug, Serialize)]
pub struct PolicyDto {
    pub limit: u64,
    pub window_seconds: u64,
}

impl From<&RateLimitPolicy> for PolicyDto {
    fn from(policy: &RateLimitPolicy) -> Self {
        Self {
            limit: policy.limit(),
            window_seconds: policy.window_seconds(),
        }
    }
}

/// Counters of the current and previous bucket and the resulting estimate.
#[derive(Debug, Serialize)]
pub struct WindowDto {
    pub current: u64,
    pub previous: u64,
    pub estimated_count: f64,
    pub remaining: u64,
    pub reset_seconds: u64,
}

impl From<&Inspection> for WindowDto {
    fn from(inspection: &Inspection) -> Self {
        Self {
            current: inspection.estimate.current,
            previous: inspection.estimate.previous,
            estimated_count: inspection.estimate.estimated_count,
            remaining: inspection.decision.remaining,
            reset_seconds: inspection.decision.reset_seconds,
        }
    }
}
