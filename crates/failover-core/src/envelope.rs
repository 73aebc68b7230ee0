//! Wire envelope persisted to the remote store.
//!
//! Every remote value is a JSON object with exactly two fields:
//! `__compressed` (bool) and `data` (string). When the serialized payload
//! exceeds the compression threshold, `data` holds base64-encoded gzip bytes;
//! otherwise it holds the raw JSON text. External readers of these keys must
//! know this format to interpret them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{CacheError, CacheResult};

/// Two-field wire wrapper for remote-bound values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether `data` is base64-encoded gzip output
    #[serde(rename = "__compressed")]
    pub compressed: bool,
    /// Raw JSON text, or base64-encoded compressed bytes
    pub data: String,
}

impl Envelope {
    /// Wrap a value for the remote store.
    ///
    /// Serializes the value to JSON; payloads larger than `threshold` bytes
    /// are gzipped and base64-encoded. Returns the envelope's own JSON text.
    pub fn encode<T: Serialize>(value: &T, threshold: usize) -> CacheResult<String> {
        let json = serde_json::to_string(value)?;

        let envelope = if json.len() > threshold {
            Self {
                compressed: true,
                data: BASE64.encode(gzip(json.as_bytes())?),
            }
        } else {
            Self {
                compressed: false,
                data: json,
            }
        };

        Ok(serde_json::to_string(&envelope)?)
    }

    /// Unwrap a raw remote payload back into a value.
    pub fn decode(raw: &str) -> CacheResult<serde_json::Value> {
        let envelope: Self = serde_json::from_str(raw)
            .map_err(|e| CacheError::CorruptEnvelope(e.to_string()))?;

        let json = if envelope.compressed {
            let bytes = BASE64
                .decode(&envelope.data)
                .map_err(|e| CacheError::CorruptEnvelope(e.to_string()))?;
            String::from_utf8(gunzip(&bytes)?)
                .map_err(|e| CacheError::CorruptEnvelope(e.to_string()))?
        } else {
            envelope.data
        };

        serde_json::from_str(&json).map_err(|e| CacheError::CorruptEnvelope(e.to_string()))
    }
}

fn gzip(data: &[u8]) -> CacheResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

fn gunzip(data: &[u8]) -> CacheResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CacheError::CorruptEnvelope(e.to_string()))?;
    Ok(out)
}
