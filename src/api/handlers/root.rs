//! Handler for the root endpoint.

use axum::Json;

use crate::api::dto::root::RootResponse;

/// Returns a static greeting.
///
/// # Endpoint
///
/// `GET /`
///
/// # Response
///
/// ```json
/// { "message": "Hello World!", "status": "running" }
/// ```
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Hello World!",
        status: "running",
    })
}
