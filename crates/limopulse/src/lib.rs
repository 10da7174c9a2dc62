//! Top-level facade crate for Limopulse.
//!
//! Re-exports core types and the relay library so users can depend on a
//! single crate.

pub mod core {
    pub use limopulse_core::*;
}

pub mod relay {
    pub use limopulse_relay::*;
}
