//! dispatchguard-domain: Check resolution chain with dispatch throttling
//!
//! This crate contains:
//! - The `CheckResolver` capability and its request/response types
//! - The dispatch throttling stage that paces requests with large fan-out
//! - The constant-rate release primitive (ticker + hand-off queue)
//! - An ordered builder that wires resolver stages into a chain
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             dispatchguard-domain            │
//! ├─────────────────────────────────────────────┤
//! │  resolver/  - CheckResolver chain & stages  │
//! │  throttle/  - Release ticker & slot queue   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod resolver;
pub mod throttle;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
pub use resolver::{
    CheckResolver, CheckResolverChain, CheckResolverOrderedBuilder, DispatchThrottlingCheckResolver,
    DispatchThrottlingConfig, RequestContext, RequestMetadata, ResolveCheckRequest,
    ResolveCheckResponse,
};
