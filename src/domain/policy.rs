//! Rate limit policies and the per-scope policy table.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Errors raised while building the policy table at startup.
///
/// All of these are fatal: a misconfigured table must prevent the process from
/// starting rather than fail per request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid rate limit policy for scope '{scope}': {reason}")]
    InvalidPolicyConfig { scope: String, reason: String },
}

impl PolicyError {
    fn invalid(scope: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPolicyConfig {
            scope: scope.to_string(),
            reason: reason.into(),
        }
    }
}

/// Longest accepted window (one year).
///
/// Keeps millisecond bucket arithmetic and the `2 * window` TTL far from `u64` overflow.
pub const MAX_WINDOW_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Maximum `limit` requests per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitPolicy {
    limit: u64,
    window_seconds: u64,
}

impl RateLimitPolicy {
    /// Creates a validated policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPolicyConfig`] if `limit` or `window_seconds` is
    /// zero, or the window exceeds [`MAX_WINDOW_SECONDS`].
    pub fn new(limit: u64, window_seconds: u64) -> Result<Self, PolicyError> {
        Self::for_scope(Scope::DEFAULT, limit, window_seconds)
    }

    fn for_scope(scope: &str, limit: u64, window_seconds: u64) -> Result<Self, PolicyError> {
        if limit == 0 {
            return Err(PolicyError::invalid(scope, "limit must be greater than 0"));
        }
        if window_seconds == 0 {
            return Err(PolicyError::invalid(
                scope,
                "window must be greater than 0 seconds",
            ));
        }
        if window_seconds > MAX_WINDOW_SECONDS {
            return Err(PolicyError::invalid(
                scope,
                format!("window must be at most {MAX_WINDOW_SECONDS} seconds"),
            ));
        }
        Ok(Self {
            limit,
            window_seconds,
        })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    pub fn window_ms(&self) -> u64 {
        self.window_seconds * 1000
    }
}

impl fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.limit, self.window_seconds)
    }
}

/// Named group of routes sharing one policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(String);

impl Scope {
    pub const DEFAULT: &'static str = "api:default";
    pub const STATUS: &'static str = "api:status";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn default_scope() -> Self {
        Self::new(Self::DEFAULT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static mapping from scope to policy, built once at startup.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    default: RateLimitPolicy,
    overrides: HashMap<String, RateLimitPolicy>,
}

impl PolicyTable {
    pub fn new(default: RateLimitPolicy, overrides: HashMap<String, RateLimitPolicy>) -> Self {
        Self { default, overrides }
    }

    /// Builds a table from a default `(limit, window)` and an override string.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPolicyConfig`] if the default or any override is invalid.
    pub fn from_config(
        default_limit: u64,
        default_window_seconds: u64,
        overrides: &str,
    ) -> Result<Self, PolicyError> {
        let default = RateLimitPolicy::new(default_limit, default_window_seconds)?;
        let overrides = Self::parse_overrides(overrides)?;
        Ok(Self::new(default, overrides))
    }

    /// Parses per-scope overrides in the form `scope=limit/window;scope=limit/window`.
    ///
    /// Whitespace around entries is ignored and empty entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPolicyConfig`] on malformed entries,
    /// non-positive values, or a scope listed twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use rzero::domain::policy::PolicyTable;
    ///
    /// let overrides = PolicyTable::parse_overrides("api:auth=5/60; api:docs=30/60").unwrap();
    /// assert_eq!(overrides["api:auth"].limit(), 5);
    /// ```
    pub fn parse_overrides(raw: &str) -> Result<HashMap<String, RateLimitPolicy>, PolicyError> {
        let mut overrides = HashMap::new();

        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (scope, rule) = entry
                .split_once('=')
                .ok_or_else(|| PolicyError::invalid(entry, "expected 'scope=limit/window'"))?;
            let scope = scope.trim();
            if scope.is_empty() {
                return Err(PolicyError::invalid(entry, "scope must not be empty"));
            }

            let (limit, window) = rule
                .trim()
                .split_once('/')
                .ok_or_else(|| PolicyError::invalid(scope, "expected 'limit/window'"))?;
            let limit = limit
                .trim()
                .parse::<u64>()
                .map_err(|_| PolicyError::invalid(scope, format!("invalid limit '{limit}'")))?;
            let window = window
                .trim()
                .trim_end_matches('s')
                .parse::<u64>()
                .map_err(|_| PolicyError::invalid(scope, format!("invalid window '{window}'")))?;

            let policy = RateLimitPolicy::for_scope(scope, limit, window)?;
            if overrides.insert(scope.to_string(), policy).is_some() {
                return Err(PolicyError::invalid(scope, "scope configured more than once"));
            }
        }

        Ok(overrides)
    }

    /// Returns the policy for `scope`, falling back to the default.
    pub fn resolve(&self, scope: &Scope) -> &RateLimitPolicy {
        self.overrides.get(scope.as_str()).unwrap_or(&self.default)
    }

    pub fn default_policy(&self) -> &RateLimitPolicy {
        &self.default
    }

    /// Overrides sorted by scope, for display.
    pub fn overrides(&self) -> Vec<(&str, &RateLimitPolicy)> {
        let mut entries: Vec<_> = self
            .overrides
            .iter()
            .map(|(scope, policy)| (scope.as_str(), policy))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
