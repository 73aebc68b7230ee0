//! # Failover Core
//!
//! Core types shared by the failover cache components:
//! - Error types and handling
//! - TTL context classification
//! - Wire envelope (compression + encoding)
//! - Clock abstraction for testable time
//! - Configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigBuilder, LimiterConfig};
pub use context::TtlContext;
pub use envelope::Envelope;
pub use error::{CacheError, CacheResult};
pub use logging::{init_logging, LoggingConfig};
