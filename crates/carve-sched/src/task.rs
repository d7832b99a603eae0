//! Scheduled task unit: timing, recurrence, and state.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::lock_unpoisoned;

pub type TaskFn = Box<dyn FnMut() + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Inactive,
    Waiting,
    Running,
    Finished,
}

pub(crate) struct TaskControl {
    pub next_time: Instant,
    pub interval: Duration,
    /// -1 means repeat forever.
    pub max_repeats: i64,
    pub is_recurring: bool,
    pub is_background: bool,
    pub adjust_for_execution_time: bool,
    pub state: TaskState,
}

/// One unit of scheduled work. Construct via the `run_*` builders and hand
/// the Arc to [`crate::Scheduler::add_task`]; identity is the Arc pointer,
/// so schedule a fresh task per registration.
pub struct SchedulerTask {
    pub(crate) control: Mutex<TaskControl>,
    // Separate lock from `control` so bookkeeping on a task never waits on
    // its own running callback.
    pub(crate) callback: Mutex<TaskFn>,
}

impl SchedulerTask {
    fn with_control(control: TaskControl, callback: TaskFn) -> Arc<Self> {
        Arc::new(Self {
            control: Mutex::new(control),
            callback: Mutex::new(callback),
        })
    }

    /// Fire once after `delay`, then the task is removed.
    pub fn run_once(delay: Duration, callback: impl FnMut() + Send + 'static) -> Arc<Self> {
        Self::with_control(
            TaskControl {
                next_time: Instant::now() + delay,
                interval: Duration::ZERO,
                max_repeats: -1,
                is_recurring: false,
                is_background: false,
                adjust_for_execution_time: false,
                state: TaskState::Inactive,
            },
            Box::new(callback),
        )
    }

    /// Fire every `interval` (first fire after `delay`) until removed.
    pub fn run_forever(
        interval: Duration,
        delay: Duration,
        callback: impl FnMut() + Send + 'static,
    ) -> Arc<Self> {
        Self::with_control(
            TaskControl {
                next_time: Instant::now() + delay,
                interval,
                max_repeats: -1,
                is_recurring: true,
                is_background: false,
                adjust_for_execution_time: false,
                state: TaskState::Inactive,
            },
            Box::new(callback),
        )
    }

    /// Fire exactly `times` times (at least once), every `interval`, first
    /// after `delay`.
    pub fn run_repeating(
        interval: Duration,
        delay: Duration,
        times: u32,
        callback: impl FnMut() + Send + 'static,
    ) -> Arc<Self> {
        Self::with_control(
            TaskControl {
                next_time: Instant::now() + delay,
                interval,
                max_repeats: i64::from(times.max(1)),
                is_recurring: true,
                is_background: false,
                adjust_for_execution_time: false,
                state: TaskState::Inactive,
            },
            Box::new(callback),
        )
    }

    /// Route execution to the scheduler's background worker instead of the
    /// main tick thread. Call before `add_task`.
    pub fn set_background(self: &Arc<Self>, background: bool) -> &Arc<Self> {
        lock_unpoisoned(&self.control).is_background = background;
        self
    }

    /// Count callback run time against the next interval rather than on top
    /// of it ("self-correcting" cadence). Call before `add_task`.
    pub fn set_adjust_for_execution_time(self: &Arc<Self>, adjust: bool) -> &Arc<Self> {
        lock_unpoisoned(&self.control).adjust_for_execution_time = adjust;
        self
    }

    pub fn state(&self) -> TaskState {
        lock_unpoisoned(&self.control).state
    }

    pub fn is_background(&self) -> bool {
        lock_unpoisoned(&self.control).is_background
    }

    pub fn is_recurring(&self) -> bool {
        lock_unpoisoned(&self.control).is_recurring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_recurrence() {
        let once = SchedulerTask::run_once(Duration::ZERO, || {});
        assert!(!once.is_recurring());
        assert_eq!(once.state(), TaskState::Inactive);

        let forever = SchedulerTask::run_forever(Duration::from_millis(5), Duration::ZERO, || {});
        assert!(forever.is_recurring());
        assert_eq!(lock_unpoisoned(&forever.control).max_repeats, -1);

        let thrice =
            SchedulerTask::run_repeating(Duration::from_millis(5), Duration::ZERO, 3, || {});
        assert_eq!(lock_unpoisoned(&thrice.control).max_repeats, 3);
    }

    #[test]
    fn modifiers_apply_before_scheduling() {
        let t = SchedulerTask::run_forever(Duration::from_millis(5), Duration::ZERO, || {});
        t.set_background(true).set_adjust_for_execution_time(true);
        assert!(t.is_background());
        assert!(lock_unpoisoned(&t.control).adjust_for_execution_time);
    }
}
