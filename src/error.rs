//! HTTP-facing error type.
//!
//! Every error renders as
//!
//! ```json
//! { "error": { "code": "rate_limited", "message": "...", "details": { ... } } }
//! ```

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

pub const RETRY_AFTER: HeaderName = HeaderName::from_static("retry-after");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug)]
pub enum AppError {
    NotFound {
        message: String,
        details: Value,
    },
    RateLimited {
        message: String,
        limit: u64,
        retry_after: u64,
        details: Value,
    },
}

impl AppError {
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(message: impl Into<String>, limit: u64, retry_after: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            limit,
            retry_after,
            details: json!({ "limit": limit, "retry_after": retry_after }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details, rate_limit) = match self {
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details, None)
            }
            AppError::RateLimited {
                message,
                limit,
                retry_after,
                details,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                message,
                details,
                Some((limit, retry_after)),
            ),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();

        if let Some((limit, retry_after)) = rate_limit {
            let headers = response.headers_mut();
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
        }

        response
    }
}
