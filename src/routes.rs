//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /`                   - Greeting (scope `api:default`)
//! - `GET  /rate-limit/status`  - Caller's own window (scope `api:status`)
//! - `GET  /health`             - Health check incl. counter store (not rate limited)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Compression** - Gzip for responses of 500 bytes and more
//! - **Timing** - `X-Process-Time` and `X-Timestamp` on every response
//! - **Rate limiting** - Per-client sliding window, shared across processes
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, not_found_handler};
use crate::api::middleware::{compression, timing, tracing};
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limit_enabled` - when `false`, no limiter layer is installed
pub fn app_router(state: AppState, rate_limit_enabled: bool) -> NormalizePath<Router> {
    let router = Router::new()
        .merge(api::routes::api_routes(&state, rate_limit_enabled))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(timing::layer))
        .layer(compression::layer())
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
