//! [`TaskScheduler`] implementations.

use bridge_traits::platform::BoxedTask;
use bridge_traits::{ScheduledTask, TaskScheduler};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Native Implementation (Tokio)
// ============================================================================

/// Scheduler backed by the host runtime's timers.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(not(target_arch = "wasm32"))]
impl IntervalScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the Tokio runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TaskScheduler for IntervalScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: BoxedTask) -> ScheduledTask {
        use crate::time::{interval_at, Instant, MissedTickBehavior};
        use tokio_util::sync::CancellationToken;

        let token = CancellationToken::new();
        let cancelled = token.clone();

        self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if cancelled.is_cancelled() {
                            break;
                        }
                        task();
                    }
                }
            }
            tracing::trace!("repeating task stopped");
        });

        ScheduledTask::new(Box::new(move || token.cancel()))
    }
}

// ============================================================================
// WASM Implementation
// ============================================================================

/// Scheduler backed by the browser's `setInterval`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct IntervalScheduler;

#[cfg(target_arch = "wasm32")]
impl IntervalScheduler {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_arch = "wasm32")]
impl TaskScheduler for IntervalScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: BoxedTask) -> ScheduledTask {
        let millis = crate::time::timer_millis(interval);
        let handle = gloo_timers::callback::Interval::new(millis, move || task());
        // Dropping the Interval clears it.
        ScheduledTask::new(Box::new(move || drop(handle)))
    }
}

// ============================================================================
// Manual scheduler
// ============================================================================

type SharedTask = Arc<Mutex<BoxedTask>>;

struct ManualEntry {
    interval: Duration,
    elapsed: Duration,
    task: SharedTask,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    tasks: BTreeMap<u64, ManualEntry>,
}

/// Deterministic scheduler whose clock only moves when [`advance`](Self::advance)
/// or [`tick`](Self::tick) is called.
///
/// Tasks run outside the internal lock, so a task may cancel itself or
/// schedule new work.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks scheduled and not yet cancelled.
    pub fn active_tasks(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Interval of every active task, in scheduling order.
    pub fn intervals(&self) -> Vec<Duration> {
        self.state
            .lock()
            .tasks
            .values()
            .map(|entry| entry.interval)
            .collect()
    }

    /// Move the clock forward and run every task whose interval elapsed,
    /// as many times as it elapsed.
    pub fn advance(&self, by: Duration) {
        let due: Vec<(u64, SharedTask, u32)> = {
            let mut state = self.state.lock();
            state
                .tasks
                .iter_mut()
                .filter_map(|(id, entry)| {
                    entry.elapsed += by;
                    let mut runs = 0;
                    while !entry.interval.is_zero() && entry.elapsed >= entry.interval {
                        entry.elapsed -= entry.interval;
                        runs += 1;
                    }
                    (runs > 0).then(|| (*id, Arc::clone(&entry.task), runs))
                })
                .collect()
        };

        for (id, task, runs) in due {
            for _ in 0..runs {
                if !self.is_scheduled(id) {
                    break;
                }
                (*task.lock())();
            }
        }
    }

    /// Run every active task exactly once, regardless of its interval.
    pub fn tick(&self) {
        let due: Vec<(u64, SharedTask)> = self
            .state
            .lock()
            .tasks
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(&entry.task)))
            .collect();

        for (id, task) in due {
            if self.is_scheduled(id) {
                (*task.lock())();
            }
        }
    }

    fn is_scheduled(&self, id: u64) -> bool {
        self.state.lock().tasks.contains_key(&id)
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, task: BoxedTask) -> ScheduledTask {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.tasks.insert(
                id,
                ManualEntry {
                    interval,
                    elapsed: Duration::ZERO,
                    task: Arc::new(Mutex::new(task)),
                },
            );
            id
        };

        let state = Arc::clone(&self.state);
        ScheduledTask::new(Box::new(move || {
            state.lock().tasks.remove(&id);
        }))
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> BoxedTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn manual_scheduler_runs_due_tasks() {
        let scheduler = ManualScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let _handle = scheduler.schedule_repeating(Duration::from_millis(1000), counting_task(&runs));

        scheduler.advance(Duration::from_millis(999));
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        scheduler.advance(Duration::from_millis(2500));
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn manual_scheduler_stops_after_cancel() {
        let scheduler = ManualScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let mut handle = scheduler.schedule_repeating(Duration::from_millis(100), counting_task(&runs));

        scheduler.tick();
        handle.cancel();
        scheduler.tick();
        scheduler.advance(Duration::from_secs(1));

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[test]
    fn manual_scheduler_reports_intervals() {
        let scheduler = ManualScheduler::new();
        let _a = scheduler.schedule_repeating(Duration::from_millis(250), Box::new(|| {}));
        let _b = scheduler.schedule_repeating(Duration::from_millis(500), Box::new(|| {}));
        assert_eq!(
            scheduler.intervals(),
            vec![Duration::from_millis(250), Duration::from_millis(500)]
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test(start_paused = true)]
    async fn interval_scheduler_ticks_until_cancelled() {
        let scheduler = IntervalScheduler::current().expect("inside a runtime");
        let runs = Arc::new(AtomicUsize::new(0));
        let mut handle = scheduler.schedule_repeating(Duration::from_millis(100), counting_task(&runs));

        crate::time::sleep(Duration::from_millis(350)).await;
        let observed = runs.load(Ordering::SeqCst);
        assert_eq!(observed, 3);

        handle.cancel();
        crate::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), observed);
    }
}
