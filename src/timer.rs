//! Cancellable Timers
//!
//! Every piece of delayed or periodic work the simulator schedules is
//! backed by a spawned task whose handle is kept, so that stopping can
//! abort it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to a scheduled task
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Run `work` as its own task right away
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(work),
        }
    }

    /// Run `work` once after `delay`
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        })
    }

    /// Run `tick` every `period`, first firing one period from now
    pub fn every<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        Self::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                tick().await;
            }
        })
    }

    /// Abort the task; a no-op if it already finished
    pub fn cancel(&self) {
        self.task.abort();
    }
}

/// A group of one-shot timers that can be cancelled together
///
/// Timers remove themselves once their work completes, so the set only
/// holds work that is still pending.
#[derive(Debug, Default)]
pub struct TimerSet {
    next_id: AtomicU64,
    timers: Arc<Mutex<HashMap<u64, TimerHandle>>>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `work` after `delay` and track it until it finishes
    pub async fn schedule<F>(&self, delay: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Held across the spawn so a fast timer can't deregister before it is registered
        let mut timers = self.timers.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.timers);

        let handle = TimerHandle::after(delay, async move {
            work.await;
            registry.lock().await.remove(&id);
        });
        timers.insert(id, handle);
    }

    /// Abort every pending timer, returning how many were cancelled
    pub async fn cancel_all(&self) -> usize {
        let mut timers = self.timers.lock().await;
        let count = timers.len();
        for (_, handle) in timers.drain() {
            handle.cancel();
        }
        count
    }

    /// Number of timers still pending
    pub async fn len(&self) -> usize {
        self.timers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
