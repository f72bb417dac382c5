//! Observability infrastructure for dispatchguard.
//!
//! This module provides:
//! - Structured logging configuration
//! - Prometheus metrics recorder

mod logging;
mod metrics;

pub use logging::{create_json_layer, init_logging, LoggingConfig};
pub use metrics::{build_recorder, init_metrics, MetricsError, MetricsState};

use crate::config::ServerConfig;

/// Initializes logging and, when enabled, the Prometheus recorder.
///
/// Returns the metrics state if a recorder was installed.
pub fn init_observability(config: &ServerConfig) -> Result<Option<MetricsState>, MetricsError> {
    init_logging(LoggingConfig::from(&config.logging));

    if !config.metrics.enabled {
        tracing::info!("metrics disabled");
        return Ok(None);
    }

    init_metrics().map(Some)
}
