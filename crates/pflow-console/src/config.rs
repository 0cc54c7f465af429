//! Console configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `pflow.{toml,yaml,json}` file, then `PFLOW_*` environment variables.
//! Command-line flags are applied last by the binary.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use pflow_client::HttpClientConfig;
use pflow_monitoring::MonitoringConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "PFLOW";
pub const DEFAULT_CONFIG_FILE: &str = "pflow";

#[derive(Error, Debug)]
pub enum ConsoleConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConsoleConfigResult<T> = Result<T, ConsoleConfigError>;

/// Console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Engine API root
    pub api_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Log directives, e.g. "info,pflow_cache=debug"
    pub log_filter: String,

    /// JSON log lines instead of human-readable output
    pub json_logs: bool,

    /// How many work orders the dashboard shows
    pub latest: usize,

    pub environment: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
            log_filter: "info".to_string(),
            json_logs: false,
            latest: 5,
            environment: "development".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Loads from `file` (or `./pflow.*` when absent) and the process environment
    pub fn load(file: Option<&Path>) -> ConsoleConfigResult<Self> {
        Self::from_sources(file, None)
    }

    /// Loads from an explicit environment map instead of the process environment
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> ConsoleConfigResult<Self> {
        let defaults = Self::default();
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .set_default("log_filter", defaults.log_filter)?
            .set_default("json_logs", defaults.json_logs)?
            .set_default("latest", defaults.latest as i64)?
            .set_default("environment", defaults.environment)?
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true).source(env))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(api_url = %config.api_url, timeout_secs = config.timeout_secs, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> ConsoleConfigResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(ConsoleConfigError::Invalid("api_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConsoleConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if self.latest == 0 {
            return Err(ConsoleConfigError::Invalid("latest must be positive".to_string()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            base_url: self.api_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn monitoring_config(&self) -> MonitoringConfig {
        MonitoringConfig {
            service_name: "pflow-console".to_string(),
            log_filter: self.log_filter.clone(),
            enable_json_logging: self.json_logs,
            environment: self.environment.clone(),
        }
    }
}
