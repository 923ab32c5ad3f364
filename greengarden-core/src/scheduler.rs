//! Scheduled tasks with explicit cancellation handles.
//!
//! Every timer and background request runs as a tokio task that reports
//! back to its owner through a channel. The owner keeps a [`TaskHandle`]
//! for anything it may need to stop early.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to a scheduled task. Dropping it leaves the task running.
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Stop the task. Messages it already sent stay queued.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// Spawns tasks that deliver messages of type `M` to one receiver.
#[derive(Debug)]
pub struct Scheduler<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Clone for Scheduler<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M: Send + 'static> Scheduler<M> {
    /// Create a scheduler and the receiver its tasks deliver to.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Send `make()` every `period`, first after one full period.
    ///
    /// Stops on its own when the receiver is gone.
    pub fn every<F>(&self, period: Duration, mut make: F) -> TaskHandle
    where
        F: FnMut() -> M + Send + 'static,
    {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if tx.send(make()).is_err() {
                    break;
                }
            }
        });
        TaskHandle { handle }
    }

    /// Run `work` in the background and deliver its output.
    pub fn spawn<F>(&self, work: F) -> TaskHandle
    where
        F: Future<Output = M> + Send + 'static,
    {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let message = work.await;
            let _ = tx.send(message);
        });
        TaskHandle { handle }
    }
}
