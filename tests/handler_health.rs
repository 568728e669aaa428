mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use common::{CLIENT_PEER, TestConfig};
use rzero::api::handlers::health_handler;

#[tokio::test]
async fn test_health_endpoint_success() {
    let (state, _clock) = common::memory_state(&TestConfig::default());
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "online");
    assert_eq!(json["checks"]["counter_store"]["status"], "ok");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let (state, _clock) = common::memory_state(&TestConfig::default());
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server.get("/health").await;

    let json = response.json::<serde_json::Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["checks"].get("counter_store").is_some());

    // DD:MM:YYYY and HH:MM:SS
    let date = json["date"].as_str().unwrap();
    assert_eq!(date.split(':').count(), 3);
    assert_eq!(date.len(), 10);
    let time = json["time"].as_str().unwrap();
    assert_eq!(time.split(':').count(), 3);
    assert_eq!(time.len(), 8);
}

#[tokio::test]
async fn test_health_reports_unavailable_store() {
    let state = common::unavailable_state(&TestConfig::default());
    let server = common::server(state, CLIENT_PEER);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["counter_store"]["status"], "error");
}

#[tokio::test]
async fn test_health_is_not_rate_limited() {
    let (state, _clock) = common::memory_state(&TestConfig {
        limit: 1,
        ..TestConfig::default()
    });
    let server = common::server(state, CLIENT_PEER);

    for _ in 0..5 {
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }

    // Health probes did not consume the quota
    server.get("/").await.assert_status_ok();
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let (state, _clock) = common::memory_state(&TestConfig::default());
    let server = common::server(state, CLIENT_PEER);

    server.get("/health/").await.assert_status_ok();
}
