//! Error types for cache operations.

use thiserror::Error;

/// Error types for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Connection error
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Serialization error
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// Envelope could not be decoded (bad base64, bad gzip, or bad inner JSON)
    #[error("Corrupt cache envelope: {0}")]
    CorruptEnvelope(String),

    /// Backend not available
    #[error("Cache backend not available: {0}")]
    Unavailable(String),

    /// Key not found
    #[error("Key not found")]
    NotFound,

    /// Configuration error
    #[error("Cache configuration error: {0}")]
    Config(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
