//! Health monitoring state machine.
//!
//! Two states, Healthy and Degraded, with edge-triggered transitions: a
//! probe success resets the failure counter and reports recovery exactly
//! once; reaching the consecutive-failure threshold reports degradation
//! exactly once. Invariant: `healthy == (consecutive_failures < threshold)`.

use parking_lot::RwLock;

/// Snapshot of the probe state
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the remote server is considered reachable
    pub healthy: bool,
    /// Failed probes since the last success
    pub consecutive_failures: u32,
    /// When the last probe ran (epoch milliseconds)
    pub last_check_ms: u64,
    /// When the next probe is due (epoch milliseconds)
    pub next_check_ms: u64,
}

impl HealthState {
    fn new() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            last_check_ms: 0,
            next_check_ms: 0,
        }
    }
}

/// State transition produced by recording a probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No edge crossed
    None,
    /// Degraded -> Healthy
    Recovered,
    /// Healthy -> Degraded (threshold reached)
    Degraded,
}

/// Owner of the health state
pub struct HealthMonitor {
    state: RwLock<HealthState>,
    threshold: u32,
}

impl HealthMonitor {
    /// Create a monitor with the given consecutive-failure threshold
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            state: RwLock::new(HealthState::new()),
            threshold,
        }
    }

    /// Record a successful probe
    pub fn record_success(&self, now_ms: u64, interval_ms: u64) -> Transition {
        let mut state = self.state.write();
        let was_degraded = !state.healthy;

        state.consecutive_failures = 0;
        state.healthy = true;
        state.last_check_ms = now_ms;
        state.next_check_ms = now_ms + interval_ms;

        if was_degraded {
            Transition::Recovered
        } else {
            Transition::None
        }
    }

    /// Record a failed probe, returning the updated failure count and any
    /// edge crossed
    pub fn record_failure(&self, now_ms: u64, interval_ms: u64) -> (u32, Transition) {
        let mut state = self.state.write();

        state.consecutive_failures += 1;
        state.last_check_ms = now_ms;
        state.next_check_ms = now_ms + interval_ms;

        let transition = if state.healthy && state.consecutive_failures >= self.threshold {
            state.healthy = false;
            Transition::Degraded
        } else {
            Transition::None
        };

        (state.consecutive_failures, transition)
    }

    /// Whether the remote server is considered reachable
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.state.read().healthy
    }

    /// The configured failure threshold
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Current state snapshot
    #[must_use]
    pub fn snapshot(&self) -> HealthState {
        self.state.read().clone()
    }
}
