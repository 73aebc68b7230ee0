//! In-memory fallback store.
//!
//! Holds uncompressed values while the remote server is unreachable.
//! Entries expire lazily on read and a bulk trim keeps the map under a
//! capacity ceiling.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// A value parked in the fallback map
#[derive(Debug, Clone)]
pub struct FallbackEntry {
    /// The original, uncompressed value
    pub data: Value,
    /// Whether the remote-bound representation was compressed
    pub compressed: bool,
    /// Absolute expiry timestamp (epoch milliseconds)
    pub expires_at_ms: u64,
}

/// Bounded in-memory map used while degraded
pub struct FallbackStore {
    entries: Mutex<HashMap<String, FallbackEntry>>,
    capacity: usize,
    evict_fraction: f64,
}

impl FallbackStore {
    /// Create a store with the given capacity ceiling and trim fraction
    #[must_use]
    pub fn new(capacity: usize, evict_fraction: f64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            evict_fraction,
        }
    }

    /// Insert or replace an entry (last write wins)
    pub fn insert(&self, key: &str, data: Value, compressed: bool, expires_at_ms: u64) {
        let mut entries = self.entries.lock();
        entries.insert(
            key.to_string(),
            FallbackEntry {
                data,
                compressed,
                expires_at_ms,
            },
        );
    }

    /// Read an entry, removing it if expired
    pub fn get(&self, key: &str, now_ms: u64) -> Option<Value> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now_ms => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Remove an entry; true only if a live (unexpired) entry was removed.
    ///
    /// An expired entry that lazy expiry has not swept yet is still
    /// deleted, but does not count as a removal.
    pub fn remove(&self, key: &str, now_ms: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.remove(key) {
            Some(entry) => entry.expires_at_ms > now_ms,
            None => false,
        }
    }

    /// Whether a live (unexpired) entry exists, with the same lazy removal
    /// as `get`
    pub fn contains(&self, key: &str, now_ms: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now_ms => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Update a live entry's expiry; true if it was present and unexpired.
    ///
    /// An already-expired entry cannot be resurrected: it is removed and
    /// the update reports failure, matching `EXPIRE` on a missing key.
    pub fn set_expiry(&self, key: &str, expires_at_ms: u64, now_ms: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.expires_at_ms > now_ms => {
                entry.expires_at_ms = expires_at_ms;
                true
            }
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Current entry count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Trim the map back under capacity.
    ///
    /// When the entry count exceeds the ceiling, the oldest slice (by
    /// ascending expiry, a proxy for insertion recency under TTL-based
    /// expiry) is evicted in bulk. Run synchronously after any growing
    /// write.
    pub fn trim(&self) {
        let mut entries = self.entries.lock();
        if entries.len() <= self.capacity {
            return;
        }

        let evict = ((entries.len() as f64 * self.evict_fraction).ceil() as usize).max(1);

        let mut by_expiry: Vec<(String, u64)> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.expires_at_ms))
            .collect();
        by_expiry.sort_by_key(|(_, expires)| *expires);

        for (key, _) in by_expiry.into_iter().take(evict) {
            entries.remove(&key);
        }

        debug!(evicted = evict, remaining = entries.len(), "Fallback map trimmed");
    }
}
