//! # rZer0
//!
//! A small HTTP service guarded by a distributed, proxy-aware sliding-window
//! rate limiter, built with Axum and Redis.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Client identity, policies, keys, decisions and the store contract
//! - **Application Layer** ([`application`]) - Sliding window counting and admission control
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis, in-memory and null counter stores
//! - **API Layer** ([`api`]) - REST handlers, DTOs and middleware
//!
//! ## Features
//!
//! - Two-bucket sliding window approximation, one atomic store round-trip per request
//! - Counters shared by every worker process through Redis
//! - Client IP taken from forwarding headers only when the peer is a trusted proxy
//! - Per-scope policies and configurable fail-open / fail-closed behavior
//!
//! ## Quick Start
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379/0"  # Optional, in-memory otherwise
//! export RATE_LIMIT_REQUESTS=100
//! export RATE_LIMIT_WINDOW=60
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod telemetry;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{Admission, FailMode, RateLimiter, SlidingWindowCounter};
    pub use crate::domain::client_identity::{ClientIdentifier, TrustedProxies};
    pub use crate::domain::policy::{PolicyTable, RateLimitPolicy, Scope};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
