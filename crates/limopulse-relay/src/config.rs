//! Relay config, loaded from the environment.
//!
//! - `RELAY_PORT`   : listen port (default 3001)
//! - `CORS_ORIGIN`  : allowed origin for the HTTP surface
//!   (default http://localhost:3000)

use std::env;

use axum::http::HeaderValue;
use tracing::info;

use limopulse_core::{RelayError, Result};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub cors_origin: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let port = load_or("RELAY_PORT", "3001");
        let cfg = Self {
            port: port
                .parse()
                .map_err(|e| RelayError::Config(format!("RELAY_PORT invalid: {e}")))?,
            cors_origin: load_or("CORS_ORIGIN", "http://localhost:3000"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(RelayError::Config("RELAY_PORT must be non-zero".into()));
        }
        if self.cors_origin.parse::<HeaderValue>().is_err() {
            return Err(RelayError::Config(format!(
                "CORS_ORIGIN is not a valid origin: {}",
                self.cors_origin
            )));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origin: "http://localhost:3000".into(),
        }
    }
}

fn load_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
