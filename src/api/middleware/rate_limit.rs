//! Rate limiting middleware backed by the shared sliding window counter.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::application::services::Admission;
use crate::domain::decision::Decision;
use crate::domain::policy::Scope;
use crate::error::{AppError, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
use crate::state::AppState;

/// Application state bound to the scope of one route group.
#[derive(Clone)]
pub struct ScopedLimiter {
    pub state: AppState,
    pub scope: Scope,
}

impl ScopedLimiter {
    pub fn new(state: AppState, scope: impl Into<String>) -> Self {
        Self {
            state,
            scope: Scope::new(scope),
        }
    }
}

/// Counts the request against its scope and either forwards it or rejects it.
///
/// # Key Extraction
///
/// The client is the peer socket address unless the peer is a trusted proxy, in
/// which case `CF-Connecting-IP` and then the left-most `X-Forwarded-For` entry
/// are used. Requires `into_make_service_with_connect_info::<SocketAddr>()`;
/// without connection info every client shares the `unknown` key.
///
/// # Responses
///
/// - **Admitted**: the downstream response gets `X-RateLimit-Limit`,
///   `X-RateLimit-Remaining` and `X-RateLimit-Reset`, whatever its status
/// - **Denied**: `429 Too Many Requests` with `Retry-After`; no handler runs
/// - **Store unavailable**: fail-open forwards without rate-limit headers,
///   fail-closed answers 429
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/", get(root_handler))
///     .route_layer(middleware::from_fn_with_state(
///         ScopedLimiter::new(state.clone(), Scope::DEFAULT),
///         rate_limit::layer,
///     ));
/// ```
pub async fn layer(
    State(scoped): State<ScopedLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let admission = scoped
        .state
        .limiter
        .check(&scoped.scope, peer, req.headers())
        .await;

    match admission {
        Admission::Admitted(decision) => {
            let mut response = next.run(req).await;
            apply_rate_limit_headers(response.headers_mut(), &decision);
            Ok(response)
        }
        Admission::Bypassed { .. } => Ok(next.run(req).await),
        Admission::Denied(decision) => Err(AppError::rate_limited(
            scoped.state.rate_limit_message.as_ref(),
            decision.limit,
            decision.reset_seconds,
        )),
        Admission::Blocked {
            policy,
            retry_after,
            ..
        } => Err(AppError::rate_limited(
            scoped.state.rate_limit_message.as_ref(),
            policy.limit(),
            retry_after,
        )),
    }
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_seconds));
}
