//! Handler for the rate limit status endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
};
use std::net::SocketAddr;
use tracing::debug;

use crate::api::dto::status::{PolicyDto, RateLimitStatusResponse, WindowDto};
use crate::domain::policy::Scope;
use crate::state::AppState;

/// Reports the caller's own window in the `api:status` scope.
///
/// # Endpoint
///
/// `GET /rate-limit/status`
///
/// The request itself is counted by the scope's limiter before this handler
/// runs, so `current` includes it. Reading the window never counts again.
///
/// # Response
///
/// ```json
/// {
///   "scope": "api:status",
///   "client": "203.0.113.9",
///   "policy": { "limit": 100, "window_seconds": 60 },
///   "window": {
///     "current": 1,
///     "previous": 0,
///     "estimated_count": 1.0,
///     "remaining": 99,
///     "reset_seconds": 42
///   }
/// }
/// ```
pub async fn rate_limit_status_handler(
    State(state): State<AppState>,
    req: Request,
) -> Json<RateLimitStatusResponse> {
    let scope = Scope::new(Scope::STATUS);
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let identity = state.limiter.identify(peer, req.headers());
    let policy = *state.limiter.policies().resolve(&scope);

    let window = match state.limiter.inspect(&scope, &identity).await {
        Ok(inspection) => Some(WindowDto::from(&inspection)),
        Err(e) => {
            debug!(scope = %scope, error = %e, "Rate limit window unavailable");
            None
        }
    };

    Json(RateLimitStatusResponse {
        scope: scope.to_string(),
        client: identity.to_string(),
        policy: PolicyDto::from(&policy),
        window,
    })
}
