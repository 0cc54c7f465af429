//! Monitoring for pflow binaries.
//!
//! Structured logging only: a `tracing` subscriber with an `EnvFilter` and
//! either a pretty or a JSON formatter, plus result helpers that log on the
//! way through.

use serde::{Deserialize, Serialize};

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter (e.g., "info,pflow_cache=debug"); `RUST_LOG` wins when set
    pub log_filter: String,
    /// JSON lines instead of human-readable output
    pub enable_json_logging: bool,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "pflow".to_string(),
            log_filter: "info".to_string(),
            enable_json_logging: false,
            environment: "development".to_string(),
        }
    }
}

impl MonitoringConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }
}
