//! TTL context classification.
//!
//! Every key is classified into a coarse context by prefix, and each context
//! maps to a fixed TTL. Callers may override the inferred context explicitly.

use std::time::Duration;

/// Coarse key category used only to select a TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlContext {
    /// Room state (`room:` prefix)
    Room,
    /// User session (`session:` prefix)
    Session,
    /// Chat history (`chat:` prefix)
    Chat,
    /// Signaling payloads (`signaling:` prefix)
    Signaling,
    /// Everything else
    Default,
}

impl TtlContext {
    /// Classify a key by prefix
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        if key.starts_with("room:") {
            Self::Room
        } else if key.starts_with("session:") {
            Self::Session
        } else if key.starts_with("chat:") {
            Self::Chat
        } else if key.starts_with("signaling:") {
            Self::Signaling
        } else {
            Self::Default
        }
    }

    /// Time-to-live for this context
    #[must_use]
    pub fn ttl(self) -> Duration {
        match self {
            Self::Room => Duration::from_secs(300),
            Self::Session => Duration::from_secs(1800),
            Self::Chat => Duration::from_secs(3600),
            Self::Signaling => Duration::from_secs(120),
            Self::Default => Duration::from_secs(600),
        }
    }

    /// Context name for log fields
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Session => "session",
            Self::Chat => "chat",
            Self::Signaling => "signaling",
            Self::Default => "default",
        }
    }
}
