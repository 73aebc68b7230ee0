//! Configuration for the cache client and rate limiter.

use std::env;
use std::time::Duration;

/// Configuration for the resilient cache client
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub redis_url: String,

    /// Prefix for remote keys (namespace isolation); empty for none
    pub key_prefix: String,

    /// Compress remote-bound payloads larger than this (bytes)
    pub compression_threshold: usize,

    /// Interval between health probes
    pub health_check_interval: Duration,

    /// Consecutive probe failures before entering degraded mode
    pub failure_threshold: u32,

    /// Maximum entries held in the in-memory fallback map
    pub fallback_capacity: usize,

    /// Fraction of entries evicted when the fallback map exceeds capacity
    pub fallback_evict_fraction: f64,

    /// Rolling latency sample window size for percentile metrics
    pub latency_window: usize,

    /// Per-request retry budget enforced by the Redis driver
    pub max_retries_per_request: usize,

    /// Cap on the driver's retry backoff delay
    pub max_retry_delay: Duration,

    /// Connection timeout for the Redis driver
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: String::new(),
            compression_threshold: 1024,
            health_check_interval: Duration::from_secs(10),
            failure_threshold: 3,
            fallback_capacity: 5000,
            fallback_evict_fraction: 0.10,
            latency_window: 1000,
            max_retries_per_request: 3,
            max_retry_delay: Duration::from_millis(3000),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    /// Build a configuration from environment variables.
    ///
    /// `REDIS_URL` wins; otherwise the URL is assembled from `REDIS_HOST`
    /// and `REDIS_PORT` with localhost defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| {
            let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
            format!("redis://{host}:{port}")
        });

        Self {
            redis_url,
            ..Default::default()
        }
    }

    /// Start building a configuration
    #[must_use]
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Builder for `CacheConfig`
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
        }
    }

    /// Set the Redis connection URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    /// Set the remote key prefix
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set the compression threshold
    #[must_use]
    pub fn compression_threshold(mut self, threshold: usize) -> Self {
        self.config.compression_threshold = threshold;
        self
    }

    /// Set the health probe interval
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// Set the consecutive-failure threshold
    #[must_use]
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Set the fallback map capacity
    #[must_use]
    pub fn fallback_capacity(mut self, capacity: usize) -> Self {
        self.config.fallback_capacity = capacity;
        self
    }

    /// Set the latency sample window size
    #[must_use]
    pub fn latency_window(mut self, window: usize) -> Self {
        self.config.latency_window = window;
        self
    }

    /// Set the driver's per-request retry budget
    #[must_use]
    pub fn max_retries_per_request(mut self, retries: usize) -> Self {
        self.config.max_retries_per_request = retries;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

/// Configuration for the sliding-window rate limiter
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Accounting window duration
    pub window: Duration,

    /// Ceiling applied when the caller supplies none
    pub default_limit: u32,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(1000),
            default_limit: 200,
        }
    }
}
