//! Redis implementation of the remote store.

use async_trait::async_trait;
use failover_core::{CacheConfig, CacheError, CacheResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::Client;
use tracing::{debug, info};

use crate::store::RemoteStore;

/// Remote store backed by a Redis server.
///
/// The connection manager carries the whole retry budget: a capped retry
/// count per request and a capped backoff delay. No additional retry or
/// timeout wrapping happens above it.
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis using the configured URL and retry policy.
    ///
    /// # Errors
    /// Returns `CacheError::Config` for an invalid URL and
    /// `CacheError::Connection` if the initial connection fails.
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        let client =
            Client::open(config.redis_url.as_str()).map_err(|e| CacheError::Config(e.to_string()))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(config.max_retries_per_request)
            .set_max_delay(config.max_retry_delay.as_millis() as u64)
            .set_connection_timeout(config.connect_timeout);

        let manager = client
            .get_connection_manager_with_config(manager_config)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!(url = %config.redis_url, "Connected to Redis");

        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

fn map_err(e: redis::RedisError) -> CacheError {
    CacheError::Connection(e.to_string())
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn set_ex(&self, key: &str, ttl_secs: u64, payload: &str) -> CacheResult<()> {
        let mut conn = self.conn();
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_secs)
            .arg(payload)
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn();
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn del(&self, keys: &[&str]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key);
        }
        cmd.query_async::<u64>(&mut conn).await.map_err(map_err)
    }

    async fn exists(&self, keys: &[&str]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        let mut cmd = redis::cmd("EXISTS");
        for key in keys {
            cmd.arg(key);
        }
        cmd.query_async::<u64>(&mut conn).await.map_err(map_err)
    }

    async fn expire(&self, key: &str, secs: u64) -> CacheResult<bool> {
        let mut conn = self.conn();
        let updated: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(secs)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(updated == 1)
    }

    async fn lpush(&self, key: &str, values: &[String]) -> CacheResult<u64> {
        let mut conn = self.conn();
        let mut cmd = redis::cmd("LPUSH");
        cmd.arg(key);
        for value in values {
            cmd.arg(value);
        }
        cmd.query_async::<u64>(&mut conn).await.map_err(map_err)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>> {
        let mut conn = self.conn();
        redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async::<Vec<String>>(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn publish(&self, channel: &str, message: &str) -> CacheResult<u64> {
        let mut conn = self.conn();
        redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async::<u64>(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn quit(&self) -> CacheResult<()> {
        // The connection manager reconnects on command failure, so QUIT is
        // best-effort; dropping the manager closes the underlying socket.
        let mut conn = self.conn();
        if let Err(e) = redis::cmd("QUIT").query_async::<()>(&mut conn).await {
            debug!(error = %e, "QUIT failed during shutdown");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
