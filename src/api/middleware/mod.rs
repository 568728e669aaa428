//! HTTP middleware for request processing and protection.
//!
//! Provides rate limiting, response compression and observability middleware.

pub mod compression;
pub mod rate_limit;
pub mod timing;
pub mod tracing;
