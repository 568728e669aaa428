mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use common::{CLIENT_PEER, TestConfig};
use rzero::api::middleware::compression;

fn server() -> TestServer {
    let app = Router::new()
        .route("/large", get(|| async { "sliding window ".repeat(100) }))
        .route("/small", get(|| async { "ok" }))
        .layer(compression::layer());

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_large_responses_are_gzipped() {
    let server = server();

    let response = server
        .get("/large")
        .add_header("accept-encoding", "gzip")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-encoding"), "gzip");
}

#[tokio::test]
async fn test_small_responses_are_not_compressed() {
    let server = server();

    let response = server
        .get("/small")
        .add_header("accept-encoding", "gzip")
        .await;

    response.assert_status_ok();
    assert!(!response.headers().contains_key("content-encoding"));
}

#[tokio::test]
async fn test_compression_requires_accept_encoding() {
    let server = server();

    let response = server.get("/large").await;

    response.assert_status_ok();
    assert!(!response.headers().contains_key("content-encoding"));
    assert_eq!(response.text(), "sliding window ".repeat(100));
}

#[tokio::test]
async fn test_app_router_compresses_only_above_threshold() {
    let (state, _clock) = common::memory_state(&TestConfig::default());
    let server = common::server(state, CLIENT_PEER);

    let response = server
        .get("/health")
        .add_header("accept-encoding", "gzip")
        .await;

    response.assert_status_ok();
    assert!(!response.headers().contains_key("content-encoding"));
}
