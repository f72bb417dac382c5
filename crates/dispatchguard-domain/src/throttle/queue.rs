//! Unbuffered hand-off queue of admission slots.
//!
//! A slot is only ever handed to a request that is already parked in
//! [`ThrottlingQueue::acquire`]. Depositing a slot while nobody waits is a
//! no-op: slots are never buffered for later arrivals.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// How a wait for an admission slot ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A tick delivered a slot to this waiter.
    Released,
    /// The queue was closed while waiting (or before the wait began).
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    waiters: VecDeque<oneshot::Sender<()>>,
    closed: bool,
}

/// Admission-slot queue shared between the release ticker and throttled requests.
#[derive(Debug, Default)]
pub struct ThrottlingQueue {
    state: Mutex<QueueState>,
}

impl ThrottlingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks the caller until a slot is deposited or the queue is closed.
    ///
    /// Dropping the returned future abandons the wait; the abandoned entry is
    /// skipped by the next deposit.
    pub async fn acquire(&self) -> Admission {
        let slot = {
            let mut state = self.state.lock();
            if state.closed {
                return Admission::Closed;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        match slot.await {
            Ok(()) => Admission::Released,
            // Sender dropped by `close`.
            Err(_) => Admission::Closed,
        }
    }

    /// Non-blocking deposit of a single slot.
    ///
    /// Returns `true` if a parked waiter received it, `false` if the slot was
    /// dropped because nobody was waiting.
    pub fn try_release(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                return true;
            }
        }
        false
    }

    /// Closes the queue, waking every parked waiter with [`Admission::Closed`].
    ///
    /// Returns the number of waiters that were released by the close.
    pub fn close(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let released = state.waiters.iter().filter(|w| !w.is_closed()).count();
        state.waiters.clear();
        released
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of requests currently parked waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.state
            .lock()
            .waiters
            .iter()
            .filter(|w| !w.is_closed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_release_without_waiter_is_dropped() {
        let queue = Arc::new(ThrottlingQueue::new());

        assert!(!queue.try_release(), "no waiter should receive the slot");

        // The dropped slot must not be buffered for a later arrival.
        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.acquire().await }
        });
        settle().await;
        assert!(!waiter.is_finished());
        assert_eq!(queue.waiting(), 1);

        assert!(queue.try_release());
        assert_eq!(waiter.await.unwrap(), Admission::Released);
    }

    #[tokio::test]
    async fn test_one_release_wakes_exactly_one_waiter() {
        let queue = Arc::new(ThrottlingQueue::new());
        let mut handles = Vec::new();
        for _ in 0..2 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move { queue.acquire().await }));
        }
        settle().await;
        assert_eq!(queue.waiting(), 2);

        assert!(queue.try_release());
        settle().await;

        let finished = handles.iter().filter(|h| h.is_finished()).count();
        assert_eq!(finished, 1);
        assert_eq!(queue.waiting(), 1);

        queue.close();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_close_releases_parked_waiters() {
        let queue = Arc::new(ThrottlingQueue::new());
        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.acquire().await }
        });
        settle().await;

        assert_eq!(queue.close(), 1);
        assert!(queue.is_closed());
        assert_eq!(waiter.await.unwrap(), Admission::Closed);
    }

    #[tokio::test]
    async fn test_acquire_after_close_returns_immediately() {
        let queue = ThrottlingQueue::new();
        queue.close();

        let admission = tokio::time::timeout(Duration::from_secs(1), queue.acquire())
            .await
            .expect("acquire on a closed queue must not block");
        assert_eq!(admission, Admission::Closed);
        assert!(!queue.try_release());
    }

    #[tokio::test]
    async fn test_abandoned_waiter_is_skipped() {
        let queue = Arc::new(ThrottlingQueue::new());

        let abandoned = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.acquire().await }
        });
        settle().await;
        abandoned.abort();
        let _ = abandoned.await;
        assert_eq!(queue.waiting(), 0);

        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.acquire().await }
        });
        settle().await;

        assert!(queue.try_release(), "slot should skip the abandoned entry");
        assert_eq!(waiter.await.unwrap(), Admission::Released);
    }
}
