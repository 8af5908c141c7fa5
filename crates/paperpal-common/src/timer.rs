//! Cancellable scheduled tasks on the tokio runtime.
//!
//! Every timer in the companion (idle reversion, bubble auto-dismiss,
//! PDF status polling) is a [`ScheduledTask`]. Cancelling is idempotent and
//! dropping the handle cancels the task.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

/// Handle to a task scheduled with [`schedule`] or [`spawn_task`].
#[derive(Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// A handle that owns nothing. Returned when no runtime is available.
    fn inert() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(true)),
            handle: None,
        }
    }

    /// Cancel the task. Safe to call any number of times.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Release the handle and let the task run to completion.
    pub fn detach(mut self) {
        self.handle.take();
        self.cancelled = Arc::new(AtomicBool::new(true));
    }

    /// Whether the task is still pending or running.
    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `task` once after `delay`.
///
/// Without a tokio runtime on the current thread the task is not scheduled
/// and an inert handle is returned.
pub fn schedule<F>(delay: Duration, task: F) -> ScheduledTask
where
    F: FnOnce() + Send + 'static,
{
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(h) => h,
        Err(_) => {
            warn!(?delay, "no tokio runtime, timer not scheduled");
            return ScheduledTask::inert();
        }
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let handle = runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        if !flag.load(Ordering::Acquire) {
            task();
        }
    });

    ScheduledTask {
        cancelled,
        handle: Some(handle),
    }
}

/// Spawn a cancellable background future.
pub fn spawn_task<F>(future: F) -> ScheduledTask
where
    F: Future<Output = ()> + Send + 'static,
{
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(h) => h,
        Err(_) => {
            warn!("no tokio runtime, background task not spawned");
            return ScheduledTask::inert();
        }
    };

    ScheduledTask {
        cancelled: Arc::new(AtomicBool::new(false)),
        handle: Some(runtime.spawn(future)),
    }
}
