//! Remote store abstraction.
//!
//! The client talks to its remote server exclusively through this trait so
//! that tests can inject scripted or failing backends.

use async_trait::async_trait;
use failover_core::CacheResult;

/// Remote key-value store boundary
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Set a key to a string payload with a TTL in seconds
    async fn set_ex(&self, key: &str, ttl_secs: u64, payload: &str) -> CacheResult<()>;

    /// Get a key's raw payload; `None` if absent
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Delete keys, returning how many existed
    async fn del(&self, keys: &[&str]) -> CacheResult<u64>;

    /// Count how many of the given keys exist
    async fn exists(&self, keys: &[&str]) -> CacheResult<u64>;

    /// Set a key's TTL; true if the key existed
    async fn expire(&self, key: &str, secs: u64) -> CacheResult<bool>;

    /// Push values to the head of a list, returning the new length
    async fn lpush(&self, key: &str, values: &[String]) -> CacheResult<u64>;

    /// Read a list range (inclusive, negative indices count from the end)
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> CacheResult<Vec<String>>;

    /// Publish a message, returning the subscriber count
    async fn publish(&self, channel: &str, message: &str) -> CacheResult<u64>;

    /// Liveness probe
    async fn ping(&self) -> CacheResult<()>;

    /// Close the connection cleanly
    async fn quit(&self) -> CacheResult<()>;

    /// Backend name for log fields
    fn name(&self) -> &'static str;
}
