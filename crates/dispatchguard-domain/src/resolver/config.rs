//! Configuration for the dispatch throttling stage.

use std::time::Duration;

use crate::error::{DomainError, DomainResult};

/// Configuration for [`DispatchThrottlingCheckResolver`](super::DispatchThrottlingCheckResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchThrottlingConfig {
    /// Period between admission slots. Must be non-zero.
    pub frequency: Duration,
    /// Dispatch count above which requests are throttled.
    pub default_threshold: u32,
    /// Ceiling for per-request threshold overrides. 0 means `default_threshold`.
    pub max_threshold: u32,
}

impl Default for DispatchThrottlingConfig {
    fn default() -> Self {
        Self {
            frequency: Duration::from_micros(10),
            default_threshold: 100,
            max_threshold: 0,
        }
    }
}

impl DispatchThrottlingConfig {
    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_default_threshold(mut self, threshold: u32) -> Self {
        self.default_threshold = threshold;
        self
    }

    pub fn with_max_threshold(mut self, threshold: u32) -> Self {
        self.max_threshold = threshold;
        self
    }

    /// The override ceiling, with 0 resolved to `default_threshold`.
    pub fn effective_max_threshold(&self) -> u32 {
        if self.max_threshold == 0 {
            self.default_threshold
        } else {
            self.max_threshold
        }
    }

    /// Threshold applied to a request carrying `override_threshold`.
    ///
    /// A positive override replaces the default but is clamped to the
    /// effective maximum.
    pub fn effective_threshold(&self, override_threshold: Option<u32>) -> u32 {
        match override_threshold.filter(|t| *t > 0) {
            Some(threshold) => threshold.min(self.effective_max_threshold()),
            None => self.default_threshold,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.frequency.is_zero() {
            return Err(DomainError::InvalidThrottlingConfig {
                message: "frequency must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns a copy with `max_threshold` resolved.
    pub(crate) fn normalized(mut self) -> Self {
        self.max_threshold = self.effective_max_threshold();
        self
    }
}
