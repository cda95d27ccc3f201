use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, sleep};

/// Handle to a timer-driven callback running on the tokio runtime.
///
/// `cancel` stops it; dropping the handle cancels it too, so a callback can
/// never outlive its owner.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Call `tick` every `period`, first one `period` from now, until it
    /// returns `ControlFlow::Break` or the task is cancelled.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn every<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tick().is_break() {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Run `task` once after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn after<Fut>(delay: Duration, task: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// True until the callback finished or the task was cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the task to run to completion. Returns immediately if cancelled.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            // A join error only means the task was aborted or panicked; either way it is over.
            let _ = handle.await;
        }
        self.handle = None;
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
