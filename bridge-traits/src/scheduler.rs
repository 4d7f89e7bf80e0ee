//! Cancellable repeating tasks.

use crate::platform::{BoxedTask, CancelFn, PlatformSendSync};
use std::fmt;
use std::time::Duration;

/// Handle to a scheduled repeating task.
///
/// Cancelling is idempotent, and dropping the handle cancels the task, so an
/// owner that replaces its handle can never leak the previous timer.
#[must_use = "dropping a ScheduledTask cancels it"]
pub struct ScheduledTask {
    cancel: Option<CancelFn>,
}

impl ScheduledTask {
    pub fn new(cancel: CancelFn) -> Self {
        Self {
            cancel: Some(cancel),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Scheduler for recurring work such as progress polling.
pub trait TaskScheduler: PlatformSendSync {
    /// Run `task` every `interval` until the returned handle is cancelled or
    /// dropped. The first run happens one interval after scheduling.
    fn schedule_repeating(&self, interval: Duration, task: BoxedTask) -> ScheduledTask;
}
