//! Rate limit keys and their per-bucket store keys.

use super::client_identity::ClientIdentity;
use super::policy::Scope;

/// Default namespace for counter keys in the shared store.
pub const DEFAULT_KEY_PREFIX: &str = "ratelimit:";

/// Composite of scope and client identity.
///
/// Rendered bucket keys look like `ratelimit:{api:default:203.0.113.7}:28512345`.
/// The braces form a Redis Cluster hash tag, so both buckets of one key map to
/// the same slot and can be touched by a single script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    base: String,
}

impl RateLimitKey {
    pub fn new(prefix: &str, scope: &Scope, identity: &ClientIdentity) -> Self {
        Self::from_parts(prefix, scope, &identity.as_key_part())
    }

    pub fn from_parts(prefix: &str, scope: &Scope, client: &str) -> Self {
        Self {
            base: format!("{prefix}{{{scope}:{client}}}"),
        }
    }

    /// Store key of the fixed bucket `bucket_id`.
    pub fn bucket_key(&self, bucket_id: u64) -> String {
        format!("{}:{}", self.base, bucket_id)
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}
