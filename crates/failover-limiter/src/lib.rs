//! # Failover Limiter
//!
//! Sliding-window rate limiter: per-identity request counts in fixed time
//! windows against a caller-supplied ceiling. Fully synchronous; the
//! increment-then-compare sequence contains no suspension point and must
//! stay that way.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod limiter;

// Re-export main types
pub use limiter::{LimitStatus, RateLimitError, SlidingWindowLimiter, DEFAULT_LIMIT};
