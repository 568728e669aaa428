//! HTTP request handlers for API endpoints.

pub mod health;
pub mod root;
pub mod status;

pub use health::health_handler;
pub use root::root_handler;
pub use status::rate_limit_status_handler;

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// Fallback for unmatched routes.
pub async fn not_found_handler(uri: Uri) -> AppError {
    AppError::not_found("Route not found", json!({ "path": uri.path() }))
}
