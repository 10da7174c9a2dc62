//! Limopulse core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level event contracts shared by the relay
//! process and any tooling that speaks its protocol. It intentionally carries
//! no transport or runtime dependencies so it can be reused in multiple
//! contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelayError`/`Result` so the relay
//! process does not crash on malformed traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod identity;
pub mod protocol;

/// Shared result type.
pub use error::{RelayError, Result};
