//! Admission control: identity, policy, counting and decision in one call.

use super::sliding_window::{SlidingWindowCounter, WindowEstimate};
use crate::domain::client_identity::{ClientIdentifier, ClientIdentity};
use crate::domain::decision::{Decision, decide, reset_seconds};
use crate::domain::key::RateLimitKey;
use crate::domain::policy::{PolicyTable, RateLimitPolicy, Scope};
use crate::domain::store::StoreError;
use axum::http::HeaderMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::{debug, warn};

/// Admission policy while the counter store is unavailable.
///
/// Chosen once per deployment; never decided per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailMode {
    /// Admit requests without rate-limit headers.
    #[default]
    Open,
    /// Deny every request with 429.
    Closed,
}

impl FromStr for FailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" | "fail-open" => Ok(Self::Open),
            "closed" | "fail-closed" => Ok(Self::Closed),
            other => Err(format!(
                "fail mode must be 'open' or 'closed', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for FailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Within quota.
    Admitted(Decision),
    /// Quota exhausted.
    Denied(Decision),
    /// Store unavailable, fail-open: admitted without accounting.
    Bypassed { reason: String },
    /// Store unavailable, fail-closed: rejected without accounting.
    Blocked {
        policy: RateLimitPolicy,
        /// Seconds until the current fixed bucket rolls over.
        retry_after: u64,
        reason: String,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Admitted(_) | Self::Bypassed { .. })
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::Admitted(_) => "admitted",
            Self::Denied(_) => "denied",
            Self::Bypassed { .. } => "bypassed",
            Self::Blocked { .. } => "blocked",
        }
    }
}

/// Result of [`RateLimiter::inspect`].
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub key: RateLimitKey,
    pub policy: RateLimitPolicy,
    pub estimate: WindowEstimate,
    pub decision: Decision,
}

/// Orchestrates client identification, policy lookup, counting and decision.
///
/// Holds no mutable state; one instance is shared by all request tasks.
pub struct RateLimiter {
    identifier: ClientIdentifier,
    policies: PolicyTable,
    counter: SlidingWindowCounter,
    fail_mode: FailMode,
    key_prefix: String,
}

impl RateLimiter {
    pub fn new(
        identifier: ClientIdentifier,
        policies: PolicyTable,
        counter: SlidingWindowCounter,
        fail_mode: FailMode,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            identifier,
            policies,
            counter,
            fail_mode,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn fail_mode(&self) -> FailMode {
        self.fail_mode
    }

    pub fn counter(&self) -> &SlidingWindowCounter {
        &self.counter
    }

    pub fn identify(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> ClientIdentity {
        self.identifier.resolve(peer, headers)
    }

    pub fn key_for(&self, scope: &Scope, identity: &ClientIdentity) -> RateLimitKey {
        RateLimitKey::new(&self.key_prefix, scope, identity)
    }

    /// Counts the request and decides whether it is admitted.
    ///
    /// Never fails: store errors are mapped through the configured [`FailMode`].
    pub async fn check(&self, scope: &Scope, peer: Option<IpAddr>, headers: &HeaderMap) -> Admission {
        let identity = self.identify(peer, headers);
        let admission = self.check_identity(scope, &identity).await;

        metrics::counter!(
            "rate_limit_decisions_total",
            "scope" => scope.to_string(),
            "outcome" => admission.outcome()
        )
        .increment(1);

        admission
    }

    /// Same as [`Self::check`] for an already resolved identity.
    pub async fn check_identity(&self, scope: &Scope, identity: &ClientIdentity) -> Admission {
        let policy = *self.policies.resolve(scope);
        let key = self.key_for(scope, identity);

        match self.counter.increment(&key, policy.window_seconds()).await {
            Ok(estimate) => {
                let decision = decide(&policy, estimate.estimated_count, estimate.now_ms);
                if decision.allowed {
                    debug!(
                        client = %identity,
                        scope = %scope,
                        estimate = decision.estimated_count,
                        remaining = decision.remaining,
                        "Request admitted"
                    );
                    Admission::Admitted(decision)
                } else {
                    warn!(
                        client = %identity,
                        trusted = identity.trusted,
                        scope = %scope,
                        estimate = decision.estimated_count,
                        limit = decision.limit,
                        retry_after = decision.reset_seconds,
                        "Rate limit exceeded"
                    );
                    Admission::Denied(decision)
                }
            }
            Err(StoreError::Unavailable(reason)) => self.on_store_unavailable(scope, policy, reason),
        }
    }

    /// Current estimate and decision for `identity` without counting a request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be read.
    pub async fn inspect(
        &self,
        scope: &Scope,
        identity: &ClientIdentity,
    ) -> Result<Inspection, StoreError> {
        let policy = *self.policies.resolve(scope);
        let key = self.key_for(scope, identity);
        let estimate = self.counter.peek(&key, policy.window_seconds()).await?;
        let decision = decide(&policy, estimate.estimated_count, estimate.now_ms);

        Ok(Inspection {
            key,
            policy,
            estimate,
            decision,
        })
    }

    fn on_store_unavailable(
        &self,
        scope: &Scope,
        policy: RateLimitPolicy,
        reason: String,
    ) -> Admission {
        match self.fail_mode {
            FailMode::Open => {
                warn!(scope = %scope, error = %reason, "Counter store unavailable, admitting request (fail-open)");
                Admission::Bypassed { reason }
            }
            FailMode::Closed => {
                warn!(scope = %scope, error = %reason, "Counter store unavailable, rejecting request (fail-closed)");
                let retry_after = reset_seconds(&policy, self.counter.clock().now_ms());
                Admission::Blocked {
                    policy,
                    retry_after,
                    reason,
                }
            }
        }
    }
}
