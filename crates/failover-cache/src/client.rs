//! Resilient cache client.
//!
//! Wraps a remote key-value store and stays available when it is not:
//! operations branch once per call on the current mode (Healthy/Degraded),
//! writes fall back to an in-memory map while degraded, and a background
//! probe task detects degradation and recovery. Public operations never
//! surface errors; they log, count, and return safe defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use failover_core::{CacheConfig, CacheResult, Clock, Envelope, SystemClock, TtlContext};

use crate::fallback::FallbackStore;
use crate::health::{HealthMonitor, HealthState, Transition};
use crate::metrics::{MetricsSnapshot, OperationMetrics};
use crate::redis_store::RedisStore;
use crate::store::RemoteStore;

/// Operating mode, resolved once per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Healthy,
    Degraded,
}

/// Resilient cache client.
///
/// Constructed once per process and shared by `Arc`; owns the fallback map,
/// health state, and metrics exclusively.
pub struct ResilientCacheClient {
    store: Arc<dyn RemoteStore>,
    fallback: FallbackStore,
    health: HealthMonitor,
    metrics: OperationMetrics,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    shutdown_tx: parking_lot::Mutex<Option<watch::Sender<bool>>>,
    probe_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl ResilientCacheClient {
    /// Create a client over the given remote store
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, config: CacheConfig) -> Arc<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a client with an injected clock
    #[must_use]
    pub fn with_clock(
        store: Arc<dyn RemoteStore>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            fallback: FallbackStore::new(config.fallback_capacity, config.fallback_evict_fraction),
            health: HealthMonitor::new(config.failure_threshold),
            metrics: OperationMetrics::new(config.latency_window),
            config,
            clock,
            shutdown_tx: parking_lot::Mutex::new(None),
            probe_handle: parking_lot::Mutex::new(None),
        })
    }

    /// Connect to Redis and start the health probe.
    ///
    /// # Errors
    /// Returns an error if the initial connection fails.
    pub async fn connect(config: CacheConfig) -> CacheResult<Arc<Self>> {
        let store = Arc::new(RedisStore::connect(&config).await?);
        let client = Self::new(store, config);
        client.start();
        Ok(client)
    }

    fn mode(&self) -> Mode {
        if self.health.is_healthy() {
            Mode::Healthy
        } else {
            Mode::Degraded
        }
    }

    fn prefixed(&self, key: &str) -> String {
        if self.config.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.config.key_prefix, key)
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Write a value under a dynamically selected TTL.
    ///
    /// The key's context (or the explicit override) picks the TTL; payloads
    /// above the compression threshold are gzipped inside the wire envelope.
    /// While degraded the original uncompressed value is parked in the
    /// fallback map instead. Write failures are swallowed after a
    /// best-effort fallback durability write.
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        context: Option<TtlContext>,
    ) {
        let started = Instant::now();
        let ctx = context.unwrap_or_else(|| TtlContext::from_key(key));
        let ttl = ctx.ttl();

        let result: CacheResult<()> = async {
            let json = serde_json::to_string(value)?;
            let compressed = json.len() > self.config.compression_threshold;

            match self.mode() {
                Mode::Degraded => {
                    let raw: Value = serde_json::from_str(&json)?;
                    let expires_at = self.now_ms() + ttl.as_millis() as u64;
                    self.fallback.insert(key, raw, compressed, expires_at);
                    self.fallback.trim();
                    debug!(key, context = ctx.name(), "Cached to fallback (degraded)");
                    Ok(())
                }
                Mode::Healthy => {
                    let payload = Envelope::encode(value, self.config.compression_threshold)?;
                    self.store
                        .set_ex(&self.prefixed(key), ttl.as_secs(), &payload)
                        .await
                }
            }
        }
        .await;

        if let Err(e) = result {
            self.metrics.record_error();
            warn!(key, context = ctx.name(), error = %e, "Cache write failed");

            // Opportunistic durability: park the raw value locally even
            // though we are not officially degraded.
            if self.health.is_healthy() {
                if let Ok(raw) = serde_json::to_value(value) {
                    let expires_at = self.now_ms() + ttl.as_millis() as u64;
                    self.fallback.insert(key, raw, false, expires_at);
                    self.fallback.trim();
                }
            }
        }

        self.metrics.record_latency(elapsed_ms(started));
    }

    /// Read a value, consulting the fallback map while degraded.
    ///
    /// Returns `None` whether the key is genuinely absent or unrecoverable;
    /// callers cannot distinguish the two.
    pub async fn get_with_fallback<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let started = Instant::now();

        let result = match self.mode() {
            Mode::Degraded => self
                .fallback
                .get(key, self.now_ms())
                .and_then(|v| serde_json::from_value(v).ok()),
            Mode::Healthy => match self.fetch_remote(key).await {
                Ok(Some(value)) => serde_json::from_value(value).ok(),
                Ok(None) => None,
                Err(e) => {
                    self.metrics.record_error();
                    warn!(key, error = %e, "Cache read failed; trying fallback");
                    self.fallback
                        .get(key, self.now_ms())
                        .and_then(|v| serde_json::from_value(v).ok())
                }
            },
        };

        self.metrics.record_latency(elapsed_ms(started));
        result
    }

    async fn fetch_remote(&self, key: &str) -> CacheResult<Option<Value>> {
        match self.store.get(&self.prefixed(key)).await? {
            Some(raw) => Ok(Some(Envelope::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Delete keys, returning how many were removed.
    ///
    /// Matching fallback entries are cleared in both modes so a
    /// cache-busting delete is effective regardless of mode.
    pub async fn del(&self, keys: &[&str]) -> u64 {
        let started = Instant::now();

        let now = self.now_ms();
        let mut local_removed = 0u64;
        for key in keys {
            if self.fallback.remove(key, now) {
                local_removed += 1;
            }
        }

        let count = match self.mode() {
            Mode::Degraded => local_removed,
            Mode::Healthy => {
                let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed(k)).collect();
                let refs: Vec<&str> = prefixed.iter().map(String::as_str).collect();
                match self.store.del(&refs).await {
                    Ok(n) => n,
                    Err(e) => {
                        self.metrics.record_error();
                        warn!(error = %e, "Cache delete failed");
                        0
                    }
                }
            }
        };

        self.metrics.record_latency(elapsed_ms(started));
        count
    }

    /// Count how many of the given keys exist
    pub async fn exists(&self, keys: &[&str]) -> u64 {
        let started = Instant::now();

        let count = match self.mode() {
            Mode::Degraded => {
                let now = self.now_ms();
                keys.iter().filter(|k| self.fallback.contains(k, now)).count() as u64
            }
            Mode::Healthy => {
                let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed(k)).collect();
                let refs: Vec<&str> = prefixed.iter().map(String::as_str).collect();
                match self.store.exists(&refs).await {
                    Ok(n) => n,
                    Err(e) => {
                        self.metrics.record_error();
                        warn!(error = %e, "Cache exists failed");
                        0
                    }
                }
            }
        };

        self.metrics.record_latency(elapsed_ms(started));
        count
    }

    /// Reset a key's TTL; true if the key existed
    pub async fn expire(&self, key: &str, secs: u64) -> bool {
        let started = Instant::now();

        let updated = match self.mode() {
            Mode::Degraded => {
                let now = self.now_ms();
                self.fallback.set_expiry(key, now + secs * 1000, now)
            }
            Mode::Healthy => match self.store.expire(&self.prefixed(key), secs).await {
                Ok(updated) => updated,
                Err(e) => {
                    self.metrics.record_error();
                    warn!(key, error = %e, "Cache expire failed");
                    false
                }
            },
        };

        self.metrics.record_latency(elapsed_ms(started));
        updated
    }

    /// Push values to the head of a list, returning the new length.
    ///
    /// While degraded the list lives as a fallback entry holding a JSON
    /// array; every push re-inserts it with the default TTL, refreshing
    /// expiry.
    pub async fn lpush<T: Serialize>(&self, key: &str, values: &[T]) -> u64 {
        let started = Instant::now();

        let result: CacheResult<u64> = async {
            let mut texts = Vec::with_capacity(values.len());
            for value in values {
                texts.push(serde_json::to_string(value)?);
            }

            match self.mode() {
                Mode::Degraded => {
                    let now = self.now_ms();
                    let mut list = match self.fallback.get(key, now) {
                        Some(Value::Array(items)) => items,
                        _ => Vec::new(),
                    };
                    for text in &texts {
                        list.insert(0, Value::String(text.clone()));
                    }
                    let len = list.len() as u64;

                    let expires_at = now + TtlContext::Default.ttl().as_millis() as u64;
                    self.fallback.insert(key, Value::Array(list), false, expires_at);
                    self.fallback.trim();
                    Ok(len)
                }
                Mode::Healthy => self.store.lpush(&self.prefixed(key), &texts).await,
            }
        }
        .await;

        let length = match result {
            Ok(n) => n,
            Err(e) => {
                self.metrics.record_error();
                warn!(key, error = %e, "Cache lpush failed");
                0
            }
        };

        self.metrics.record_latency(elapsed_ms(started));
        length
    }

    /// Read a list range with Redis index semantics (inclusive stop,
    /// negative indices from the end)
    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Vec<String> {
        let started = Instant::now();

        let items = match self.mode() {
            Mode::Degraded => {
                let list = match self.fallback.get(key, self.now_ms()) {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                match slice_range(list.len(), start, stop) {
                    Some((s, e)) => list[s..=e]
                        .iter()
                        .map(|v| match v {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .collect(),
                    None => Vec::new(),
                }
            }
            Mode::Healthy => match self.store.lrange(&self.prefixed(key), start, stop).await {
                Ok(items) => items,
                Err(e) => {
                    self.metrics.record_error();
                    warn!(key, error = %e, "Cache lrange failed");
                    Vec::new()
                }
            },
        };

        self.metrics.record_latency(elapsed_ms(started));
        items
    }

    /// Publish a message, returning the subscriber count.
    ///
    /// Dropped with a warning while degraded: the fallback store has no
    /// subscriber delivery path.
    pub async fn publish(&self, channel: &str, message: &str) -> u64 {
        let started = Instant::now();

        let subscribers = match self.mode() {
            Mode::Degraded => {
                warn!(channel, "Publish dropped while degraded");
                0
            }
            Mode::Healthy => match self.store.publish(channel, message).await {
                Ok(n) => n,
                Err(e) => {
                    self.metrics.record_error();
                    warn!(channel, error = %e, "Cache publish failed");
                    0
                }
            },
        };

        self.metrics.record_latency(elapsed_ms(started));
        subscribers
    }

    /// Run one health probe and apply any state transition.
    ///
    /// Called by the background loop; exposed so callers can force a check.
    pub async fn check_health(&self) -> bool {
        let started = Instant::now();
        let interval_ms = self.config.health_check_interval.as_millis() as u64;

        match self.store.ping().await {
            Ok(()) => {
                self.metrics.record_latency(elapsed_ms(started));
                let transition = self.health.record_success(self.now_ms(), interval_ms);
                if transition == Transition::Recovered {
                    info!(
                        backend = self.store.name(),
                        "Remote cache recovered; fallback disabled"
                    );
                }
                true
            }
            Err(e) => {
                let (failures, transition) = self.health.record_failure(self.now_ms(), interval_ms);
                warn!(
                    backend = self.store.name(),
                    failures,
                    threshold = self.health.threshold(),
                    error = %e,
                    "Health probe failed"
                );
                if transition == Transition::Degraded {
                    error!(
                        backend = self.store.name(),
                        "Remote cache unreachable; fallback enabled"
                    );
                }
                false
            }
        }
    }

    /// Spawn the periodic health probe task (idempotent)
    pub fn start(self: &Arc<Self>) {
        let mut handle_guard = self.probe_handle.lock();
        if handle_guard.is_some() {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        *self.shutdown_tx.lock() = Some(tx);

        let client = Arc::clone(self);
        let interval = self.config.health_check_interval;
        *handle_guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        client.check_health().await;
                    }
                    _ = rx.changed() => break,
                }
            }
            debug!("Health probe task stopped");
        }));
    }

    /// Stop the probe task and close the remote connection
    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(true);
        }

        let handle = self.probe_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        if let Err(e) = self.store.quit().await {
            debug!(error = %e, "Remote connection close failed");
        }
        info!("Cache client shut down");
    }

    /// Whether the remote server is considered reachable
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    /// Current health state snapshot
    #[must_use]
    pub fn health_state(&self) -> HealthState {
        self.health.snapshot()
    }

    /// Current metrics snapshot
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics
            .snapshot(self.fallback.len(), !self.health.is_healthy())
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Normalize Redis-style list indices into a concrete inclusive slice
fn slice_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;

    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    start = start.max(0);
    stop = stop.min(len - 1);

    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
