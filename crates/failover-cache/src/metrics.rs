//! Operation metrics.
//!
//! Counters accumulate for the life of the process; latency percentiles are
//! computed from a bounded rolling sample window, recomputed on every
//! recorded sample.

use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug)]
struct MetricsInner {
    total_operations: u64,
    total_errors: u64,
    samples: VecDeque<f64>,
    p50: f64,
    p95: f64,
    p99: f64,
}

/// Accumulated operation metrics
pub struct OperationMetrics {
    inner: Mutex<MetricsInner>,
    window: usize,
}

impl OperationMetrics {
    /// Create metrics with the given rolling sample window capacity
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            inner: Mutex::new(MetricsInner {
                total_operations: 0,
                total_errors: 0,
                samples: VecDeque::with_capacity(window),
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            }),
            window,
        }
    }

    /// Record one operation's wall-clock latency in milliseconds.
    ///
    /// Every operation, successful or failed, contributes exactly one
    /// sample. The oldest sample is evicted once the window is full and the
    /// percentiles are recomputed from the sorted window.
    pub fn record_latency(&self, latency_ms: f64) {
        let mut inner = self.inner.lock();

        inner.total_operations += 1;
        if inner.samples.len() >= self.window {
            inner.samples.pop_front();
        }
        inner.samples.push_back(latency_ms);

        let mut sorted: Vec<f64> = inner.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        inner.p50 = percentile(&sorted, 50);
        inner.p95 = percentile(&sorted, 95);
        inner.p99 = percentile(&sorted, 99);
    }

    /// Record one failed operation
    pub fn record_error(&self) {
        self.inner.lock().total_errors += 1;
    }

    /// Take a point-in-time snapshot.
    ///
    /// `cache_size` and `fallback_active` are supplied by the owner since
    /// they live outside the counters.
    #[must_use]
    pub fn snapshot(&self, cache_size: usize, fallback_active: bool) -> MetricsSnapshot {
        let inner = self.inner.lock();

        let error_rate = if inner.total_operations == 0 {
            0.0
        } else {
            inner.total_errors as f64 / inner.total_operations as f64
        };

        // Retained samples over total operations. This conflates window
        // retention with actual compression usage; kept as-is because
        // downstream dashboards consume it in this form.
        let compression_ratio = if inner.total_operations == 0 {
            0.0
        } else {
            inner.samples.len() as f64 / inner.total_operations as f64 * 100.0
        };

        MetricsSnapshot {
            total_operations: inner.total_operations,
            total_errors: inner.total_errors,
            error_rate,
            p50: inner.p50,
            p95: inner.p95,
            p99: inner.p99,
            compression_ratio,
            fallback_active,
            cache_size,
        }
    }
}

fn percentile(sorted: &[f64], pct: usize) -> f64 {
    let index = sorted.len() * pct / 100;
    sorted.get(index).copied().unwrap_or(0.0)
}

/// Point-in-time metrics view
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// Operations recorded since construction
    pub total_operations: u64,
    /// Failed operations since construction
    pub total_errors: u64,
    /// `total_errors / total_operations`
    pub error_rate: f64,
    /// Median latency over the rolling window (ms)
    pub p50: f64,
    /// 95th percentile latency (ms)
    pub p95: f64,
    /// 99th percentile latency (ms)
    pub p99: f64,
    /// Approximate signal; see `OperationMetrics::snapshot`
    pub compression_ratio: f64,
    /// Whether the fallback store is currently serving traffic
    pub fallback_active: bool,
    /// Fallback map size at snapshot time
    pub cache_size: usize,
}
