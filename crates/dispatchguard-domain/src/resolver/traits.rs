//! The capability every stage of the check resolver chain implements.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DomainError, DomainResult};

use super::context::RequestContext;
use super::types::{ResolveCheckRequest, ResolveCheckResponse};

/// One stage of the check resolution chain.
///
/// Stages compose by wrapping: each holds the next stage as its delegate and
/// calls it after applying its own concern. A stage must not assume where it
/// sits in the chain.
#[async_trait]
pub trait CheckResolver: Send + Sync {
    /// Resolves a check, usually by delegating to the next stage.
    async fn resolve_check(
        &self,
        ctx: &RequestContext,
        req: &ResolveCheckRequest,
    ) -> DomainResult<ResolveCheckResponse>;

    /// Replaces the next stage in the chain.
    fn set_delegate(&self, delegate: Arc<dyn CheckResolver>);

    /// The next stage, or `None` for stages that never delegate.
    fn delegate(&self) -> Option<Arc<dyn CheckResolver>>;

    /// Releases resources held by the stage. Defaults to a no-op.
    fn close(&self) {}
}

/// Placeholder delegate for a stage that has not been wired yet.
///
/// Every check fails with [`DomainError::DelegateNotConfigured`] naming the
/// stage that was left unwired.
#[derive(Debug, Clone, Copy)]
pub struct UnwiredCheckResolver {
    owner: &'static str,
}

impl UnwiredCheckResolver {
    pub fn new(owner: &'static str) -> Self {
        Self { owner }
    }
}

#[async_trait]
impl CheckResolver for UnwiredCheckResolver {
    async fn resolve_check(
        &self,
        _ctx: &RequestContext,
        _req: &ResolveCheckRequest,
    ) -> DomainResult<ResolveCheckResponse> {
        Err(DomainError::DelegateNotConfigured {
            resolver: self.owner,
        })
    }

    fn set_delegate(&self, _delegate: Arc<dyn CheckResolver>) {}

    fn delegate(&self) -> Option<Arc<dyn CheckResolver>> {
        None
    }
}
