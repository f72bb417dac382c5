//! Check resolver stage that slows down requests with excessive fan-out.
//!
//! Requests are not throttled while their dispatch count stays at or below
//! the threshold. Past that point every entry into this stage waits for one
//! admission slot from a constant-rate ticker before continuing, so a single
//! runaway check is paced without holding up requests with little fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, debug_span, Instrument};

use crate::error::DomainResult;
use crate::throttle::ConstantRateThrottler;

use super::config::DispatchThrottlingConfig;
use super::context::RequestContext;
use super::telemetry;
use super::traits::{CheckResolver, UnwiredCheckResolver};
use super::types::{ResolveCheckRequest, ResolveCheckResponse};

const RESOLVER_TYPE: &str = "DispatchThrottlingCheckResolver";

/// Delays dispatches of requests whose dispatch count is above the threshold.
///
/// The stage never changes the outcome of a check, only when its delegate is
/// called. A parked request is released by the next tick or by [`close`].
/// Cancellation of the caller is not observed while parked; dropping the
/// future is the only way out early.
///
/// [`close`]: CheckResolver::close
pub struct DispatchThrottlingCheckResolver {
    delegate: RwLock<Arc<dyn CheckResolver>>,
    config: DispatchThrottlingConfig,
    throttler: ConstantRateThrottler,
}

impl DispatchThrottlingCheckResolver {
    /// Creates the stage and starts its release ticker.
    ///
    /// Must be called from within a Tokio runtime. Until [`set_delegate`] is
    /// called every check fails with `DelegateNotConfigured`.
    ///
    /// [`set_delegate`]: CheckResolver::set_delegate
    pub fn new(config: DispatchThrottlingConfig) -> DomainResult<Self> {
        config.validate()?;
        let config = config.normalized();
        let throttler = ConstantRateThrottler::new(config.frequency)?;

        debug!(
            frequency_us = config.frequency.as_micros() as u64,
            default_threshold = config.default_threshold,
            max_threshold = config.max_threshold,
            "dispatch throttling check resolver started"
        );

        Ok(Self {
            delegate: RwLock::new(Arc::new(UnwiredCheckResolver::new(RESOLVER_TYPE))),
            config,
            throttler,
        })
    }

    /// The normalized configuration (`max_threshold` is never 0).
    pub fn config(&self) -> &DispatchThrottlingConfig {
        &self.config
    }

    /// Number of requests currently parked waiting for a slot.
    pub fn throttled_requests(&self) -> usize {
        self.throttler.waiting()
    }

    fn current_delegate(&self) -> Arc<dyn CheckResolver> {
        Arc::clone(&*self.delegate.read())
    }
}

#[async_trait]
impl CheckResolver for DispatchThrottlingCheckResolver {
    async fn resolve_check(
        &self,
        ctx: &RequestContext,
        req: &ResolveCheckRequest,
    ) -> DomainResult<ResolveCheckResponse> {
        let current_num_dispatch = req.request_metadata.dispatch_count();
        let span = debug_span!(
            "ResolveCheck",
            resolver_type = RESOLVER_TYPE,
            dispatch_count = current_num_dispatch
        );

        async move {
            let threshold = self
                .config
                .effective_threshold(ctx.dispatch_throttling_threshold());

            if current_num_dispatch > threshold {
                req.request_metadata.mark_throttled();
                debug!(threshold, depth = req.depth, "dispatch threshold exceeded, throttling");

                let waited = self.throttler.throttle().await;
                telemetry::record_throttling_delay(ctx.rpc_info(), waited);
            }

            self.current_delegate().resolve_check(ctx, req).await
        }
        .instrument(span)
        .await
    }

    fn set_delegate(&self, delegate: Arc<dyn CheckResolver>) {
        *self.delegate.write() = delegate;
    }

    fn delegate(&self) -> Option<Arc<dyn CheckResolver>> {
        Some(self.current_delegate())
    }

    /// Stops the release ticker; parked requests proceed immediately.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    fn close(&self) {
        self.throttler.close();
    }
}
