//! Configuration management for dispatchguard.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use dispatchguard_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("config.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use dispatchguard_domain::DispatchThrottlingConfig;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "DISPATCHGUARD";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Check dispatch throttling settings
    #[serde(default)]
    pub check_dispatch_throttling: DispatchThrottlingSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metrics settings
    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// Check dispatch throttling settings.
///
/// These settings can be overridden via environment variables with the
/// `DISPATCHGUARD_` prefix and `__` as the nested key separator:
///
/// - `DISPATCHGUARD_CHECK_DISPATCH_THROTTLING__ENABLED=true`
/// - `DISPATCHGUARD_CHECK_DISPATCH_THROTTLING__FREQUENCY_MICROS=50`
/// - `DISPATCHGUARD_CHECK_DISPATCH_THROTTLING__THRESHOLD=200`
/// - `DISPATCHGUARD_CHECK_DISPATCH_THROTTLING__MAX_THRESHOLD=500`
///
/// # Example YAML Configuration
///
/// ```yaml
/// check_dispatch_throttling:
///   enabled: true
///   frequency_micros: 10
///   threshold: 100
///   max_threshold: 0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DispatchThrottlingSettings {
    /// Put a dispatch throttling stage in front of check evaluation.
    #[serde(default)]
    pub enabled: bool,

    /// Microseconds between admission slots for throttled requests.
    #[serde(default = "default_frequency_micros")]
    pub frequency_micros: u64,

    /// Dispatch count above which a request is throttled.
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Ceiling for per-request threshold overrides (0 = use `threshold`).
    #[serde(default)]
    pub max_threshold: u32,
}

impl Default for DispatchThrottlingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency_micros: default_frequency_micros(),
            threshold: default_threshold(),
            max_threshold: 0,
        }
    }
}

impl DispatchThrottlingSettings {
    /// Converts the settings into the resolver configuration.
    pub fn to_config(&self) -> DispatchThrottlingConfig {
        DispatchThrottlingConfig::default()
            .with_frequency(Duration::from_micros(self.frequency_micros))
            .with_default_threshold(self.threshold)
            .with_max_threshold(self.max_threshold)
    }
}

fn default_frequency_micros() -> u64 {
    10
}

fn default_threshold() -> u32 {
    100
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetricsSettings {
    /// Install the Prometheus recorder
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `DISPATCHGUARD_` and use `__`
    /// as separator, e.g. `DISPATCHGUARD_LOGGING__LEVEL=debug`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    ///
    /// Throttling settings are only checked when throttling is enabled.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let throttling = &self.check_dispatch_throttling;
        if throttling.enabled {
            if throttling.frequency_micros == 0 {
                return Err(ConfigLoadError::Invalid {
                    message: "check_dispatch_throttling.frequency_micros must be greater than 0"
                        .to_string(),
                });
            }

            if throttling.threshold == 0 {
                return Err(ConfigLoadError::Invalid {
                    message: "check_dispatch_throttling.threshold must be greater than 0"
                        .to_string(),
                });
            }

            if throttling.max_threshold != 0 && throttling.threshold > throttling.max_threshold {
                return Err(ConfigLoadError::Invalid {
                    message: format!(
                        "check_dispatch_throttling.threshold ({}) must be less than or equal to check_dispatch_throttling.max_threshold ({})",
                        throttling.threshold, throttling.max_threshold
                    ),
                });
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

/// `DISPATCHGUARD_SECTION__KEY` -> `section.key`
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
