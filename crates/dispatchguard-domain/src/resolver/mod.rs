//! Check resolver chain.
//!
//! A check travels through a chain of [`CheckResolver`] stages. Each stage
//! applies one cross-cutting concern (throttling, caching, ...) and hands the
//! request to its delegate. The last stage evaluates the relationship graph and
//! dispatches sub-checks back to the head of the chain.
//!
//! # Architecture Decisions
//!
//! - **Composition over hierarchy**: stages are independent types linked by
//!   `Arc<dyn CheckResolver>`, so stages can be reordered or omitted.
//!
//! - **Fail-fast wiring**: a stage created without a delegate points at an
//!   [`UnwiredCheckResolver`] that returns `DelegateNotConfigured` instead of
//!   recursing into itself.
//!
//! - **Shared request metadata**: the dispatch counter and throttled flag are
//!   atomics behind an `Arc` shared by every sub-request of one check.

mod builder;
mod config;
mod context;
mod dispatch_throttling;
pub mod telemetry;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use builder::{CheckResolverChain, CheckResolverOrderedBuilder};
pub use config::DispatchThrottlingConfig;
pub use context::{RequestContext, RpcInfo};
pub use dispatch_throttling::DispatchThrottlingCheckResolver;
pub use telemetry::register_dispatch_throttling_metrics;
pub use traits::{CheckResolver, UnwiredCheckResolver};
pub use types::{
    RequestMetadata, ResolutionMetadata, ResolveCheckRequest, ResolveCheckResponse, TupleKey,
};
