//! # Queue client configuration
//!
//! ```toml
//! [queue]
//! default_queue = "shelf"
//! active_profile = "Prusa MK3S"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every key is optional; missing sections fall back to their defaults.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub queue: QueueSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Queue defaults applied to records that don't carry them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueSection {
    #[serde(default = "default_queue_name")]
    pub default_queue: String,
    /// Profile used for set visibility until a printer reports its own.
    #[serde(default)]
    pub active_profile: Option<String>,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            default_queue: default_queue_name(),
            active_profile: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `printqueue_rs=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_queue_name() -> String { crate::queue::DEFAULT_QUEUE.to_string() }
fn default_log_level() -> String { "info".to_string() }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<QueueConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &str) -> Result<QueueConfig, ConfigError> {
    if Path::new(path).exists() {
        load_config(path)
    } else {
        Ok(QueueConfig::default())
    }
}
