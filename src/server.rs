//! HTTP server initialization and runtime setup.
//!
//! Handles counter store selection, rate limiter assembly and the Axum server
//! lifecycle.

use crate::application::services::{RateLimiter, SlidingWindowCounter};
use crate::config::Config;
use crate::domain::client_identity::ClientIdentifier;
use crate::domain::clock::SystemClock;
use crate::domain::store::CounterStore;
use crate::infrastructure::store::{MemoryCounterStore, NullCounterStore, RedisCounterStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Startup connection attempts before falling back to [`NullCounterStore`].
const STORE_CONNECT_ATTEMPTS: usize = 5;

/// Selects the counter store for this configuration.
///
/// - `REDIS_URL` set and reachable: [`RedisCounterStore`]
/// - `REDIS_URL` set but unreachable after retries: [`NullCounterStore`], so
///   the configured fail mode governs every request until restart
/// - no `REDIS_URL`: [`MemoryCounterStore`], limits are per process
pub async fn build_store(config: &Config) -> Arc<dyn CounterStore> {
    match &config.redis_url {
        Some(redis_url) => {
            match RedisCounterStore::connect_with_retry(redis_url, STORE_CONNECT_ATTEMPTS).await {
                Ok(redis) => {
                    tracing::info!("Counter store enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to counter store: {}. Fail mode '{}' applies to all requests.",
                        e,
                        config.fail_mode
                    );
                    Arc::new(NullCounterStore::new(e.to_string()))
                }
            }
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set, using in-memory counters. Limits are enforced per process only."
            );
            Arc::new(MemoryCounterStore::new(Arc::new(SystemClock)))
        }
    }
}

/// Builds the shared application state from a validated configuration.
///
/// # Errors
///
/// Returns an error if the policy table, the trusted proxy list or the client
/// IP header name is invalid.
pub fn build_state(config: &Config, store: Arc<dyn CounterStore>) -> Result<AppState> {
    let identifier = ClientIdentifier::new(config.trusted_proxies()?)
        .with_cdn_header(&config.client_ip_header)?;

    let counter = SlidingWindowCounter::new(store, Arc::new(SystemClock), config.store_timeout());

    let limiter = RateLimiter::new(
        identifier,
        config.policy_table()?,
        counter,
        config.fail_mode,
        config.key_prefix.clone(),
    );

    Ok(AppState::new(
        Arc::new(limiter),
        config.rate_limit_message.as_str(),
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Counter store (Redis, in-memory, or null fallback)
/// - Rate limiter with the configured policies
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Rate limit configuration is invalid
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = build_store(&config).await;
    let state = build_state(&config, store)?;

    if !config.rate_limit_enabled {
        tracing::warn!("Rate limiting disabled (RATE_LIMIT_ENABLED=false)");
    }

    let app = app_router(state, config.rate_limit_enabled);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
