//! Assembles resolver stages into a chain.

use std::sync::Arc;

use crate::error::{DomainError, DomainResult};

use super::config::DispatchThrottlingConfig;
use super::dispatch_throttling::DispatchThrottlingCheckResolver;
use super::traits::{CheckResolver, UnwiredCheckResolver};

/// Builds a check resolver chain in a fixed order:
///
/// ```text
/// [DispatchThrottlingCheckResolver] -> terminal
///         ^                              |
///         +------ sub-dispatches --------+
/// ```
///
/// The terminal stage's delegate is the head of the chain, so recursive
/// dispatches issued by the terminal re-enter every cross-cutting stage.
#[derive(Default)]
pub struct CheckResolverOrderedBuilder {
    dispatch_throttling: Option<DispatchThrottlingConfig>,
    terminal: Option<Arc<dyn CheckResolver>>,
}

impl CheckResolverOrderedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a dispatch throttling stage in front of the terminal stage.
    pub fn with_dispatch_throttling(mut self, config: DispatchThrottlingConfig) -> Self {
        self.dispatch_throttling = Some(config);
        self
    }

    /// Sets the stage that evaluates checks.
    pub fn with_terminal(mut self, terminal: Arc<dyn CheckResolver>) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Constructs the enabled stages and links each to the next.
    pub fn build(self) -> DomainResult<CheckResolverChain> {
        let terminal = self.terminal.ok_or_else(|| DomainError::ResolverError {
            message: "check resolver chain requires a terminal resolver".to_string(),
        })?;

        let mut stages: Vec<Arc<dyn CheckResolver>> = Vec::with_capacity(2);
        if let Some(config) = self.dispatch_throttling {
            stages.push(Arc::new(DispatchThrottlingCheckResolver::new(config)?));
        }
        stages.push(terminal);

        for pair in stages.windows(2) {
            pair[0].set_delegate(Arc::clone(&pair[1]));
        }
        let head = Arc::clone(&stages[0]);
        stages[stages.len() - 1].set_delegate(head);

        Ok(CheckResolverChain { stages })
    }
}

/// An assembled chain.
///
/// Owns the lifecycle of its stages: closing or dropping the chain closes
/// every stage and unlinks the terminal from the head.
pub struct CheckResolverChain {
    stages: Vec<Arc<dyn CheckResolver>>,
}

impl CheckResolverChain {
    /// The entry point for top-level checks.
    pub fn head(&self) -> Arc<dyn CheckResolver> {
        Arc::clone(&self.stages[0])
    }

    /// Number of stages, terminal included.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Closes every stage in order and unlinks the terminal from the head.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for CheckResolverChain {
    fn drop(&mut self) {
        for stage in &self.stages {
            stage.close();
        }
        // Breaks the terminal -> head link so the stages can be freed.
        if let Some(terminal) = self.stages.last() {
            terminal.set_delegate(Arc::new(UnwiredCheckResolver::new("CheckResolverChain")));
        }
    }
}
