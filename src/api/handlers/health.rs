//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use chrono_tz::Europe::Berlin;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// Date and time are reported in `Europe/Berlin` local time.
///
/// # Endpoint
///
/// `GET /health`
///
/// Not rate limited, so orchestrator probes keep working under load.
///
/// # Response Codes
///
/// - **200 OK**: Counter store reachable
/// - **503 Service Unavailable**: Counter store unreachable (requests are still
///   served according to the configured fail mode)
///
/// # Response
///
/// ```json
/// {
///   "status": "online",
///   "date": "17:10:2026",
///   "time": "14:03:59",
///   "version": "0.1.0",
///   "checks": {
///     "counter_store": { "status": "ok", "message": "Counter store connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_counter_store(&state).await;
    let healthy = store_check.status == "ok";

    let (date, time) = local_date_time(Utc::now());
    let response = HealthResponse {
        status: if healthy { "online" } else { "degraded" }.to_string(),
        date,
        time,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            counter_store: store_check,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// `DD:MM:YYYY` and `HH:MM:SS` of `now` in Berlin local time.
fn local_date_time(now: DateTime<Utc>) -> (String, String) {
    let local = now.with_timezone(&Berlin);
    (
        local.format("%d:%m:%Y").to_string(),
        local.format("%H:%M:%S").to_string(),
    )
}

/// Checks counter store connectivity.
async fn check_counter_store(state: &AppState) -> CheckStatus {
    if state.store.health_check().await {
        CheckStatus {
            status: "ok".to_string(),
            message: Some("Counter store connected".to_string()),
        }
    } else {
        CheckStatus {
            status: "error".to_string(),
            message: Some(format!(
                "Counter store unreachable (fail mode: {})",
                state.limiter.fail_mode()
            )),
        }
    }
}
