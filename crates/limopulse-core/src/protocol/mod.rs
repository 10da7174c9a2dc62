//! Protocol modules (wire envelope + typed event sets).
//!
//! The relay speaks JSON text frames, one envelope per frame:
//! `{"event": "<name>", "data": {...}}` in both directions.
//!
//! Inbound and outbound events are closed sum types; the fan-out policy in
//! the relay is an exhaustive match over them, so adding an event kind is a
//! compile-time-checked decision rather than a string comparison.
//!
//! All parsers are panic-free: malformed input is reported as `RelayError`
//! instead of panicking, keeping the relay resilient to hostile traffic.

pub mod envelope;
pub mod inbound;
pub mod outbound;

pub use envelope::Envelope;
pub use inbound::Inbound;
pub use outbound::Outbound;
