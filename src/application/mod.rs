//! Application layer services implementing admission control.
//!
//! This layer orchestrates domain operations: it resolves identities and
//! policies, drives the counter store and applies the fail mode. Services
//! consume the [`crate::domain::store::CounterStore`] trait and provide a clean
//! API for HTTP middleware and the admin tool.
//!
//! # Available Services
//!
//! - [`services::sliding_window::SlidingWindowCounter`] - Two-bucket rolling counter
//! - [`services::rate_limiter::RateLimiter`] - Per-request admission decision

pub mod services;
