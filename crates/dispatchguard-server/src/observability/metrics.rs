//! Prometheus metrics infrastructure.
//!
//! This module provides Prometheus-compatible metrics using the `metrics` crate
//! with `metrics-exporter-prometheus` for exposition.
//!
//! # Metrics Exposed
//!
//! - `dispatchguard_dispatch_throttling_resolver_delay_ms` - Time throttled
//!   checks spent waiting for an admission slot, by `grpc_service` and
//!   `grpc_method`

use std::sync::Arc;

use dispatchguard_domain::resolver::telemetry::{
    register_dispatch_throttling_metrics, DISPATCH_THROTTLING_DELAY_BUCKETS_MS,
    DISPATCH_THROTTLING_DELAY_MS,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

/// Shared state containing the Prometheus handle for metrics rendering.
#[derive(Clone)]
pub struct MetricsState {
    handle: Arc<PrometheusHandle>,
}

impl MetricsState {
    /// Creates a new metrics state with the given Prometheus handle.
    pub fn new(handle: PrometheusHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Renders the current metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Error type for metrics initialization.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to install Prometheus recorder: recorder already installed")]
    AlreadyInstalled,

    #[error("invalid histogram buckets: {0}")]
    InvalidBuckets(String),
}

fn builder() -> Result<PrometheusBuilder, MetricsError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(DISPATCH_THROTTLING_DELAY_MS.to_string()),
            DISPATCH_THROTTLING_DELAY_BUCKETS_MS,
        )
        .map_err(|e| MetricsError::InvalidBuckets(e.to_string()))
}

/// Builds a recorder with the dispatchguard bucket layout without installing it.
pub fn build_recorder() -> Result<PrometheusRecorder, MetricsError> {
    Ok(builder()?.build_recorder())
}

/// Installs the Prometheus recorder globally and describes the metrics.
///
/// This must be called once at application startup before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if the recorder is already installed.
pub fn init_metrics() -> Result<MetricsState, MetricsError> {
    let handle = builder()?
        .install_recorder()
        .map_err(|_| MetricsError::AlreadyInstalled)?;

    register_dispatch_throttling_metrics();

    Ok(MetricsState::new(handle))
}
