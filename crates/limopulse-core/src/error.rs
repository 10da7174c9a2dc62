//! Shared error type across Limopulse crates.
//!
//! The relay protocol is fire-and-forget: nothing here maps to an error
//! event on the wire. Errors exist so handlers can drop-and-log malformed
//! traffic instead of propagating a fault.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by core and relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed or unrecognized inbound event (bad JSON, missing required
    /// field, unknown event name). Always handled by dropping the event.
    #[error("bad event: {0}")]
    BadEvent(String),
    /// Invalid runtime configuration.
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}
