//! # Failover Cache
//!
//! Resilient cache client for a remote key-value store:
//! - Dynamic per-key TTL selection by context prefix
//! - Transparent compression of large payloads
//! - In-memory fallback store when the remote server is unreachable
//! - Continuous health monitoring with automatic recovery detection
//! - Rolling operation metrics with latency percentiles

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod fallback;
pub mod health;
pub mod metrics;
pub mod redis_store;
pub mod store;

// Re-export main types
pub use client::ResilientCacheClient;
pub use fallback::{FallbackEntry, FallbackStore};
pub use health::{HealthMonitor, HealthState, Transition};
pub use metrics::{MetricsSnapshot, OperationMetrics};
pub use redis_store::RedisStore;
pub use store::RemoteStore;
