//! Constant-rate release of throttled work.
//!
//! A [`ReleaseTicker`] deposits one admission slot into a [`ThrottlingQueue`]
//! every period. Throttled callers park on the queue until a slot reaches them.
//! Many parked callers race for slots, so the release rate is bounded by the
//! ticker frequency no matter how many callers are waiting.

mod queue;
mod ticker;

pub use queue::{Admission, ThrottlingQueue};
pub use ticker::ReleaseTicker;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::error::{DomainError, DomainResult};

/// Releases at most one throttled caller per `frequency`.
#[derive(Debug)]
pub struct ConstantRateThrottler {
    frequency: Duration,
    queue: Arc<ThrottlingQueue>,
    ticker: Mutex<Option<ReleaseTicker>>,
}

impl ConstantRateThrottler {
    /// Starts the release ticker. Must be called from within a Tokio runtime.
    pub fn new(frequency: Duration) -> DomainResult<Self> {
        if frequency.is_zero() {
            return Err(DomainError::InvalidThrottlingConfig {
                message: "frequency must be greater than zero".to_string(),
            });
        }

        let queue = Arc::new(ThrottlingQueue::new());
        let ticker = ReleaseTicker::spawn(frequency, Arc::clone(&queue))?;

        Ok(Self {
            frequency,
            queue,
            ticker: Mutex::new(Some(ticker)),
        })
    }

    /// Parks until the ticker admits the caller or the throttler is closed.
    ///
    /// Returns the time spent waiting.
    pub async fn throttle(&self) -> Duration {
        let start = Instant::now();
        let admission = self.queue.acquire().await;
        let waited = start.elapsed();
        trace!(?admission, waited_ms = waited.as_millis() as u64, "throttled caller admitted");
        waited
    }

    /// Stops the ticker and releases every parked caller.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn close(&self) {
        let ticker = self.ticker.lock().take();
        match ticker {
            Some(ticker) => drop(ticker.shutdown()),
            None => panic!("ConstantRateThrottler closed more than once"),
        }
    }

    /// Period between admission slots.
    pub fn frequency(&self) -> Duration {
        self.frequency
    }

    /// Number of callers currently parked.
    pub fn waiting(&self) -> usize {
        self.queue.waiting()
    }
}
