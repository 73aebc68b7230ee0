//! Integration tests for the failover cache workspace
//!
//! Covers:
//! - TTL selection and the wire envelope
//! - Fallback behavior while the remote store is unreachable
//! - Health-state transitions and the background probe
//! - Rate limiter admission, purity, and reset semantics


// Re-export commonly used items
pub use helpers::*;

#[cfg(test)]
mod cache_tests;
#[cfg(test)]
mod limiter_tests;
