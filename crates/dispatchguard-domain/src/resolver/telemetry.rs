//! Metrics emitted by resolver stages.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a
//! recorder is installed and can never fail the check being resolved.

use std::time::Duration;

use super::context::RpcInfo;

/// Histogram of milliseconds spent parked in the dispatch throttling stage.
pub const DISPATCH_THROTTLING_DELAY_MS: &str =
    "dispatchguard_dispatch_throttling_resolver_delay_ms";

/// Bucket bounds (milliseconds) for [`DISPATCH_THROTTLING_DELAY_MS`].
pub const DISPATCH_THROTTLING_DELAY_BUCKETS_MS: &[f64] =
    &[1.0, 3.0, 5.0, 10.0, 25.0, 50.0, 100.0, 1000.0, 5000.0];

/// Describes the dispatch throttling metrics.
///
/// Call once during startup, after the recorder is installed.
pub fn register_dispatch_throttling_metrics() {
    metrics::describe_histogram!(
        DISPATCH_THROTTLING_DELAY_MS,
        metrics::Unit::Milliseconds,
        "Time spent waiting for dispatch throttling resolver"
    );
}

/// Records how long a throttled request waited, labeled by the RPC that issued it.
pub fn record_throttling_delay(rpc_info: &RpcInfo, waited: Duration) {
    let labels = [
        ("grpc_service", rpc_info.service.clone()),
        ("grpc_method", rpc_info.method.clone()),
    ];

    metrics::histogram!(DISPATCH_THROTTLING_DELAY_MS, &labels).record(waited.as_millis() as f64);
}
