//! API route configuration.
//!
//! Rate-limited routes are grouped by scope; each group shares one policy from
//! the [`crate::domain::policy::PolicyTable`].

use crate::api::handlers::{rate_limit_status_handler, root_handler};
use crate::api::middleware::rate_limit::{self, ScopedLimiter};
use crate::domain::policy::Scope;
use crate::state::AppState;
use axum::{Router, middleware, routing::get};

/// Routes in the `api:default` scope.
///
/// # Endpoints
///
/// - `GET /` - Greeting
pub fn default_routes() -> Router<AppState> {
    Router::new().route("/", get(root_handler))
}

/// Routes in the `api:status` scope.
///
/// # Endpoints
///
/// - `GET /rate-limit/status` - Caller's current window
pub fn status_routes() -> Router<AppState> {
    Router::new().route("/rate-limit/status", get(rate_limit_status_handler))
}

/// Attaches the rate limiter for `scope` to every route of `router`.
///
/// Uses `route_layer`, so unmatched paths fall through to the fallback
/// without being counted.
pub fn limited(router: Router<AppState>, state: &AppState, scope: &str) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        ScopedLimiter::new(state.clone(), scope),
        rate_limit::layer,
    ))
}

/// All scoped API routes, rate limited when `enabled`.
pub fn api_routes(state: &AppState, enabled: bool) -> Router<AppState> {
    if enabled {
        limited(default_routes(), state, Scope::DEFAULT)
            .merge(limited(status_routes(), state, Scope::STATUS))
    } else {
        default_routes().merge(status_routes())
    }
}
