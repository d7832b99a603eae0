//! Cooperative tick scheduler and deferred-work queues.
#![forbid(unsafe_code)]

mod background;
mod scheduler;
mod task;

pub use background::BackgroundTaskQueue;
pub use scheduler::Scheduler;
pub use task::{SchedulerTask, TaskState};

use std::sync::Mutex;
use std::sync::MutexGuard;

/// Both loops keep running after a task panics, so a poisoned mutex only
/// means "a callback died mid-run"; the guarded data is still usable.
pub(crate) fn lock_unpoisoned<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Polling cadence shared by every loop in this crate. Bounded wake-up
/// latency in exchange for not needing condvar wakeups anywhere.
pub(crate) const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);
