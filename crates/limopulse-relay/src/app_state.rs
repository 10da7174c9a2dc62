//! Shared application state for the relay.
//!
//! The registry is owned here and injected into the WebSocket and HTTP
//! handlers alike. No ambient singleton: tests construct isolated
//! instances.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: RelayConfig,
    registry: ConnectionRegistry,
}

impl AppState {
    pub fn new(cfg: RelayConfig) -> Self {
        Self::with_registry(cfg, ConnectionRegistry::new())
    }

    /// Build state around an existing registry (test seam).
    pub fn with_registry(cfg: RelayConfig, registry: ConnectionRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, registry }),
        }
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }
}
