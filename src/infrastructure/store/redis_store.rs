//! Redis-backed counter store shared by all worker processes.

use crate::config::mask_connection_string;
use crate::domain::store::{CounterStore, StoreError, StoreResult, WindowCounts};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError, Script, aio::ConnectionManager};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

/// Increments KEYS[1], attaches the TTL in ARGV[1] when the key was just
/// created (or somehow lost its TTL), and reads KEYS[2].
///
/// Runs atomically on the server, so create and expire cannot race.
const INCREMENT_WINDOW_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 or redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
local previous = tonumber(redis.call('GET', KEYS[2]) or '0') or 0
return {current, previous}
"#;

const SCAN_BATCH: usize = 500;

/// Counter store on a Redis-protocol server (Redis, Dragonfly, Valkey).
///
/// Uses `ConnectionManager` for automatic reconnection and connection reuse.
pub struct RedisCounterStore {
    client: ConnectionManager,
    increment_window: Script,
}

impl RedisCounterStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!(
            "Connecting to counter store at {}",
            mask_connection_string(redis_url)
        );

        let client = Client::open(redis_url)
            .map_err(|e| unavailable("Failed to create Redis client", e))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| unavailable("Failed to connect to Redis", e))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| unavailable("Redis PING failed", e))?;

        info!("✓ Connected to counter store");

        Ok(Self {
            client: manager,
            increment_window: Script::new(INCREMENT_WINDOW_SCRIPT),
        })
    }

    /// Connects with exponential backoff, for use at startup only.
    ///
    /// # Errors
    ///
    /// Returns the last [`StoreError`] once `attempts` connection attempts failed.
    pub async fn connect_with_retry(redis_url: &str, attempts: usize) -> StoreResult<Self> {
        let strategy = ExponentialBackoff::from_millis(10)
            .factor(10)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(attempts.saturating_sub(1));

        Retry::spawn(strategy, move || async move {
            Self::connect(redis_url).await.inspect_err(|e| {
                warn!("Counter store connection attempt failed: {}", e);
            })
        })
        .await
    }
}

fn unavailable(context: &str, e: RedisError) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", context, e))
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_window(
        &self,
        current_key: &str,
        previous_key: &str,
        ttl_seconds: u64,
    ) -> StoreResult<WindowCounts> {
        let mut conn = self.client.clone();

        let (current, previous): (u64, u64) = self
            .increment_window
            .key(current_key)
            .key(previous_key)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| unavailable("Redis window increment failed", e))?;

        debug!(
            "Counter INCR: {} = {} (previous {} = {})",
            current_key, current, previous_key, previous
        );

        Ok(WindowCounts { current, previous })
    }

    async fn peek(&self, key: &str) -> StoreResult<Option<u64>> {
        let mut conn = self.client.clone();
        conn.get::<_, Option<u64>>(key)
            .await
            .map_err(|e| unavailable("Redis GET failed", e))
    }

    async fn flush(&self, prefix: &str) -> StoreResult<u64> {
        let mut conn = self.client.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| unavailable("Redis SCAN failed", e))?;

            if !keys.is_empty() {
                deleted += conn
                    .del::<_, u64>(&keys)
                    .await
                    .map_err(|e| unavailable("Redis DEL failed", e))?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        info!("Flushed {} counter keys matching {}", deleted, pattern);
        Ok(deleted)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
