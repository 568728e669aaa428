//! Response timing headers.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::time::Instant;

/// Time spent handling the request, in milliseconds with two decimals.
pub const X_PROCESS_TIME: HeaderName = HeaderName::from_static("x-process-time");

/// Unix time in seconds at which the response left the service.
pub const X_TIMESTAMP: HeaderName = HeaderName::from_static("x-timestamp");

/// Stamps every response with [`X_PROCESS_TIME`] and [`X_TIMESTAMP`].
///
/// Installed around the whole router, so 404 and 429 responses are stamped
/// too.
///
/// # Example Headers
///
/// ```text
/// x-process-time: 0.42
/// x-timestamp: 1792245839
/// ```
pub async fn layer(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(req).await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.2}", elapsed_ms)) {
        headers.insert(X_PROCESS_TIME, value);
    }
    headers.insert(X_TIMESTAMP, HeaderValue::from(Utc::now().timestamp()));

    response
}
