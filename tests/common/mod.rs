#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo};
use axum_test::TestServer;
use rzero::application::services::{FailMode, RateLimiter, SlidingWindowCounter};
use rzero::domain::client_identity::{ClientIdentifier, TrustedProxies};
use rzero::domain::clock::ManualClock;
use rzero::domain::policy::PolicyTable;
use rzero::domain::store::CounterStore;
use rzero::infrastructure::store::{MemoryCounterStore, NullCounterStore};
use rzero::routes::app_router;
use rzero::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

/// Start of a 10 second bucket, so offsets in tests map to whole buckets.
pub const T0: u64 = 1_700_000_000_000;

pub const TEST_MESSAGE: &str = "Too many requests, please slow down.";
pub const CLIENT_PEER: &str = "203.0.113.9:40000";
pub const PROXY_PEER: &str = "10.0.0.5:40000";

/// Inserts a fixed `ConnectInfo<SocketAddr>` as if the request came from `peer`.
#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            peer: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    peer: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.peer));
        self.inner.call(req)
    }
}

/// Limiter settings for one test.
pub struct TestConfig {
    pub limit: u64,
    pub window_seconds: u64,
    pub overrides: &'static str,
    pub trusted_proxies: &'static str,
    pub fail_mode: FailMode,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            window_seconds: 10,
            overrides: "",
            trusted_proxies: "",
            fail_mode: FailMode::Open,
        }
    }
}

pub fn build_state(
    config: &TestConfig,
    store: Arc<dyn CounterStore>,
    clock: Arc<ManualClock>,
) -> AppState {
    let identifier = ClientIdentifier::new(
        TrustedProxies::parse_list(config.trusted_proxies).expect("valid proxy list"),
    );
    let policies = PolicyTable::from_config(config.limit, config.window_seconds, config.overrides)
        .expect("valid policies");
    let counter = SlidingWindowCounter::new(store, clock, Duration::from_millis(50));
    let limiter = RateLimiter::new(identifier, policies, counter, config.fail_mode, "rl:");

    AppState::new(Arc::new(limiter), TEST_MESSAGE)
}

/// State over an in-memory store with a manual clock starting at [`T0`].
pub fn memory_state(config: &TestConfig) -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MemoryCounterStore::new(clock.clone()));
    (build_state(config, store, clock.clone()), clock)
}

/// State whose counter store is always unavailable.
pub fn unavailable_state(config: &TestConfig) -> AppState {
    let clock = Arc::new(ManualClock::new(T0));
    build_state(config, Arc::new(NullCounterStore::new("down")), clock)
}

/// Full application router as seen from `peer`.
pub fn server(state: AppState, peer: &str) -> TestServer {
    server_with(state, peer, true)
}

pub fn server_with(state: AppState, peer: &str, rate_limit_enabled: bool) -> TestServer {
    let app = Router::new()
        .fallback_service(app_router(state, rate_limit_enabled))
        .layer(MockConnectInfoLayer(peer.parse().expect("valid socket address")));

    TestServer::new(app).unwrap()
}
