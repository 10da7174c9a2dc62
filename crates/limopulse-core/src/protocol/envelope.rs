//! Wire envelope (JSON text frames).
//!
//! The envelope stores `data` as `RawValue` so the event payload is parsed
//! once, lazily, by the typed inbound decoder.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{RelayError, Result};

/// One text frame: `{"event": "...", "data": {...}}`.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Event name (e.g. "driver:location").
    pub event: String,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

/// Decode one inbound text frame into an envelope.
pub fn decode(text: &str) -> Result<Envelope> {
    serde_json::from_str(text)
        .map_err(|e| RelayError::BadEvent(format!("invalid envelope json: {e}")))
}
