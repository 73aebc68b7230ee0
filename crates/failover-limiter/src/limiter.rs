//! Sliding-window rate limiter.
//!
//! One window per tracked identity, created lazily on first check and
//! lazily replaced once stale. Windows are only swept proactively through
//! an explicit cleanup call, which an external scheduler is expected to
//! invoke periodically.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use failover_core::{Clock, LimiterConfig, SystemClock};

/// Ceiling applied when a route supplies no explicit limit
pub const DEFAULT_LIMIT: u32 = 200;

/// Rate limiting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// The identity exceeded its ceiling for the current window.
    ///
    /// An expected control-flow signal, not a bug condition: the caller
    /// translates it into a client-facing rejection.
    #[error("Rate limit exceeded: {limit} requests per {window_ms} ms")]
    Exceeded {
        /// The configured ceiling
        limit: u32,
        /// The accounting window duration in milliseconds
        window_ms: u64,
    },
}

/// Live view of an identity's window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitStatus {
    /// Requests observed in the current window
    pub count: u32,
    /// The ceiling the status was computed against
    pub limit: u32,
    /// Requests left before rejection
    pub remaining: u32,
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at_ms: u64,
}

/// Per-identity sliding-window limiter.
///
/// Constructed once per process; the window table is owned exclusively by
/// this instance.
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
    config: LimiterConfig,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Create a limiter with the given configuration
    #[must_use]
    pub fn new(config: LimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter with an injected clock
    #[must_use]
    pub fn with_clock(config: LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Create a limiter with the default 1000 ms window
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LimiterConfig::default())
    }

    fn window_ms(&self) -> u64 {
        self.config.window.as_millis() as u64
    }

    /// Account one request against the identity's window.
    ///
    /// A stale window is replaced rather than incremented. Over-limit
    /// attempts still count toward future throttling within the same
    /// window; the increment is not rolled back.
    ///
    /// # Errors
    /// Returns `RateLimitError::Exceeded` when the incremented count passes
    /// the ceiling. This is a hard rejection, not a delayed admission.
    pub fn check(&self, identity: &str, limit: u32) -> Result<(), RateLimitError> {
        let now = self.clock.now_ms();
        let window_ms = self.window_ms();
        let mut windows = self.windows.lock();

        let window = windows
            .entry(identity.to_string())
            .and_modify(|w| {
                if now >= w.reset_at_ms {
                    w.count = 0;
                    w.reset_at_ms = now + window_ms;
                }
            })
            .or_insert_with(|| Window {
                count: 0,
                reset_at_ms: now + window_ms,
            });

        window.count += 1;

        if window.count > limit {
            let overflow = f64::from(window.count) / f64::from(limit.max(1));
            warn!(
                identity,
                count = window.count,
                limit,
                overflow_ratio = format!("{overflow:.2}"),
                "Rate limit exceeded"
            );
            return Err(RateLimitError::Exceeded { limit, window_ms });
        }

        Ok(())
    }

    /// Read an identity's window without mutating it.
    ///
    /// Absent or stale windows report a zero count; uses the same staleness
    /// test as `check`.
    #[must_use]
    pub fn status(&self, identity: &str, limit: u32) -> LimitStatus {
        let now = self.clock.now_ms();
        let windows = self.windows.lock();

        match windows.get(identity) {
            Some(window) if now < window.reset_at_ms => LimitStatus {
                count: window.count,
                limit,
                remaining: limit.saturating_sub(window.count),
            },
            _ => LimitStatus {
                count: 0,
                limit,
                remaining: limit,
            },
        }
    }

    /// Forget an identity's window (idempotent)
    pub fn reset(&self, identity: &str) {
        self.windows.lock().remove(identity);
    }

    /// Delete every expired window.
    ///
    /// Bounds table growth under high identity cardinality; intended to be
    /// driven by an external scheduler.
    pub fn cleanup_expired_windows(&self) {
        let now = self.clock.now_ms();
        let mut windows = self.windows.lock();

        let before = windows.len();
        windows.retain(|_, w| w.reset_at_ms > now);
        let swept = before - windows.len();

        if swept > 0 {
            debug!(swept, remaining = windows.len(), "Expired rate-limit windows swept");
        }
    }

    /// Number of identities currently tracked
    #[must_use]
    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().len()
    }
}
