//! Assembles the check resolver chain from server configuration.

use std::sync::Arc;

use dispatchguard_domain::resolver::CheckResolverChain;
use dispatchguard_domain::{CheckResolver, CheckResolverOrderedBuilder, DomainResult};
use tracing::info;

use crate::config::ServerConfig;

/// Builds the chain in front of `terminal`, the stage that evaluates checks.
///
/// With throttling disabled the chain is the terminal stage alone. Must be
/// called from within a Tokio runtime when throttling is enabled.
pub fn build_check_resolver(
    config: &ServerConfig,
    terminal: Arc<dyn CheckResolver>,
) -> DomainResult<CheckResolverChain> {
    let mut builder = CheckResolverOrderedBuilder::new().with_terminal(terminal);

    let throttling = &config.check_dispatch_throttling;
    if throttling.enabled {
        info!(
            frequency_micros = throttling.frequency_micros,
            threshold = throttling.threshold,
            max_threshold = throttling.max_threshold,
            "check dispatch throttling enabled"
        );
        builder = builder.with_dispatch_throttling(throttling.to_config());
    }

    builder.build()
}
