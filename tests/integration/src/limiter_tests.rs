//! Rate limiter integration tests
//!
//! Admission up to the ceiling, window rollover, status purity, and reset.

use failover_core::{Clock, LimiterConfig, ManualClock};
use failover_limiter::{RateLimitError, SlidingWindowLimiter, DEFAULT_LIMIT};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn limiter() -> (SlidingWindowLimiter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let clock_dyn: Arc<dyn Clock> = clock.clone();
    (
        SlidingWindowLimiter::with_clock(LimiterConfig::default(), clock_dyn),
        clock,
    )
}

/// Calls 1-5 succeed, call 6 is rejected with the configured limit and
/// window, and the window elapsing readmits the identity
#[test]
fn test_admission_rejection_and_rollover() {
    let (limiter, clock) = limiter();

    for call in 1..=5 {
        assert!(limiter.check("user:1", 5).is_ok(), "call {call}");
    }

    assert_eq!(
        limiter.check("user:1", 5),
        Err(RateLimitError::Exceeded {
            limit: 5,
            window_ms: 1000
        })
    );

    clock.advance(1000);
    assert!(limiter.check("user:1", 5).is_ok());
}

/// Status reads never change the outcome of a subsequent check
#[test]
fn test_status_has_no_side_effects() {
    let (limiter, _clock) = limiter();

    for _ in 0..3 {
        limiter.check("user:1", 5).expect("under limit");
    }

    for _ in 0..100 {
        let status = limiter.status("user:1", 5);
        assert_eq!(status.count, 3);
        assert_eq!(status.remaining, 2);
    }

    assert!(limiter.check("user:1", 5).is_ok());
    assert!(limiter.check("user:1", 5).is_ok());
    assert!(limiter.check("user:1", 5).is_err());
}

/// After reset, the next check behaves like the first call ever
#[test]
fn test_reset_restores_full_budget() {
    let (limiter, _clock) = limiter();

    for _ in 0..6 {
        let _ = limiter.check("user:1", 5);
    }
    assert!(limiter.check("user:1", 5).is_err());

    limiter.reset("user:1");

    assert!(limiter.check("user:1", 5).is_ok());
    assert_eq!(limiter.status("user:1", 5).count, 1);
}

/// All unauthenticated traffic sharing one identity shares one budget
#[test]
fn test_shared_anonymous_bucket() {
    let (limiter, _clock) = limiter();

    for _ in 0..DEFAULT_LIMIT {
        assert!(limiter.check("anonymous", DEFAULT_LIMIT).is_ok());
    }
    assert!(limiter.check("anonymous", DEFAULT_LIMIT).is_err());

    // Authenticated identities are unaffected
    assert!(limiter.check("user:1", DEFAULT_LIMIT).is_ok());
}

/// Cleanup bounds the table without touching live windows
#[test]
fn test_cleanup_bounds_identity_table() {
    let (limiter, clock) = limiter();

    for i in 0..1000 {
        let _ = limiter.check(&format!("burst:{i}"), 5);
    }
    assert_eq!(limiter.tracked_identities(), 1000);

    clock.advance(999);
    let _ = limiter.check("live", 5);
    clock.advance(1);

    limiter.cleanup_expired_windows();
    assert_eq!(limiter.tracked_identities(), 1);
    assert_eq!(limiter.status("live", 5).count, 1);
}
