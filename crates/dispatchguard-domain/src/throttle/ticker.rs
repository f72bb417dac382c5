//! Background release ticker.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::error::{DomainError, DomainResult};

use super::queue::ThrottlingQueue;

/// Handle to the task that deposits one admission slot per period.
///
/// Consuming the handle with [`shutdown`](Self::shutdown) is the only way to
/// signal the task, so the signal can be sent at most once. Dropping the
/// handle also stops the task.
#[derive(Debug)]
pub struct ReleaseTicker {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReleaseTicker {
    /// Spawns the ticker task on the current Tokio runtime.
    ///
    /// The first slot is deposited one full `period` after spawning.
    pub fn spawn(period: Duration, queue: Arc<ThrottlingQueue>) -> DomainResult<Self> {
        let runtime = Handle::try_current().map_err(|e| DomainError::ResolverError {
            message: format!("release ticker requires a Tokio runtime: {e}"),
        })?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = runtime.spawn(run_ticker(period, queue, shutdown_rx));

        Ok(Self { shutdown, task })
    }

    /// Signals the task to stop. The task closes the queue on its way out.
    ///
    /// Returns the task's join handle for callers that want to wait for it.
    pub fn shutdown(self) -> JoinHandle<()> {
        // A send error means the task already exited (runtime shutting down).
        let _ = self.shutdown.send(());
        self.task
    }
}

async fn run_ticker(
    period: Duration,
    queue: Arc<ThrottlingQueue>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            // Also fires when the handle is dropped without an explicit shutdown.
            _ = &mut shutdown => {
                let released = queue.close();
                debug!(released, "release ticker stopped, throttling queue closed");
                return;
            }
            _ = ticker.tick() => {
                if queue.try_release() {
                    trace!("admission slot delivered");
                }
            }
        }
    }
}
