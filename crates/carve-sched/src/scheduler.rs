//! Main-loop task dispatch with a serial background lane.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{RecvTimeoutError, Sender, unbounded};

use crate::task::{SchedulerTask, TaskState};
use crate::{POLL_INTERVAL, lock_unpoisoned};

struct Shared {
    /// Live task set; uniqueness is Arc identity.
    registry: Mutex<Vec<Arc<SchedulerTask>>>,
    /// Copy-on-write view of the registry. The dispatch loop clones the Arc
    /// and iterates without holding any lock across callback execution.
    snapshot: Mutex<Arc<[Arc<SchedulerTask>]>>,
    /// FIFO lane for due tasks marked background; drained one at a time.
    bg_tx: Sender<Arc<SchedulerTask>>,
    shutting_down: AtomicBool,
}

impl Shared {
    fn refresh_snapshot(&self, registry: &[Arc<SchedulerTask>]) {
        *lock_unpoisoned(&self.snapshot) = registry.to_vec().into();
    }

    fn remove(&self, task: &Arc<SchedulerTask>) {
        let mut registry = lock_unpoisoned(&self.registry);
        lock_unpoisoned(&task.control).state = TaskState::Finished;
        let before = registry.len();
        registry.retain(|t| !Arc::ptr_eq(t, task));
        if registry.len() != before {
            self.refresh_snapshot(&registry);
        }
    }

    /// Run one due task and do its recurrence bookkeeping. Shared by the
    /// foreground pass and the background drainer so both lanes get the
    /// same catch-log-continue fault policy.
    fn execute(&self, task: &Arc<SchedulerTask>) {
        // Removed after dispatch but before execution.
        if task.state() != TaskState::Running {
            return;
        }
        let panicked = {
            let mut cb = lock_unpoisoned(&task.callback);
            catch_unwind(AssertUnwindSafe(|| (*cb)())).is_err()
        };
        if panicked {
            log::error!(target: "sched", "task callback panicked; scheduler continues");
        }
        let remove = {
            let mut c = lock_unpoisoned(&task.control);
            if c.state == TaskState::Finished {
                // Removed itself mid-callback.
                true
            } else if !c.is_recurring {
                true
            } else {
                if c.max_repeats > 0 {
                    c.max_repeats -= 1;
                }
                if c.max_repeats == 0 {
                    true
                } else {
                    if !c.adjust_for_execution_time {
                        // Interval restarts after execution finished.
                        c.next_time = Instant::now() + c.interval;
                    }
                    c.state = TaskState::Waiting;
                    false
                }
            }
        };
        if remove {
            self.remove(task);
        }
    }

    fn dispatch_pass(&self) {
        let snapshot = lock_unpoisoned(&self.snapshot).clone();
        let now = Instant::now();
        for task in snapshot.iter() {
            let to_background = {
                let mut c = lock_unpoisoned(&task.control);
                if c.state != TaskState::Waiting || c.next_time > now {
                    continue;
                }
                if c.is_recurring && c.adjust_for_execution_time {
                    // Charge execution time against the next interval.
                    c.next_time = now + c.interval;
                }
                c.state = TaskState::Running;
                c.is_background
            };
            if to_background {
                // Dispatch only; the background thread executes.
                let _ = self.bg_tx.send(task.clone());
            } else {
                self.execute(task);
            }
        }
    }
}

/// Cooperative task runner: a main tick thread dispatching due tasks every
/// ~10ms, plus one dedicated thread draining the background lane in strict
/// FIFO order. Shutdown is flag-polled, never forced.
pub struct Scheduler {
    shared: Arc<Shared>,
    main: Option<JoinHandle<()>>,
    background: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (bg_tx, bg_rx) = unbounded::<Arc<SchedulerTask>>();
        let shared = Arc::new(Shared {
            registry: Mutex::new(Vec::new()),
            snapshot: Mutex::new(Vec::new().into()),
            bg_tx,
            shutting_down: AtomicBool::new(false),
        });

        let main = {
            let shared = shared.clone();
            thread::Builder::new()
                .name("carve-sched".into())
                .spawn(move || {
                    while !shared.shutting_down.load(Ordering::Acquire) {
                        shared.dispatch_pass();
                        thread::sleep(POLL_INTERVAL);
                    }
                })
                .expect("spawn scheduler thread")
        };

        let background = {
            let shared = shared.clone();
            thread::Builder::new()
                .name("carve-sched-bg".into())
                .spawn(move || {
                    loop {
                        match bg_rx.recv_timeout(POLL_INTERVAL) {
                            Ok(task) => shared.execute(&task),
                            Err(RecvTimeoutError::Timeout) => {}
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                        if shared.shutting_down.load(Ordering::Acquire) {
                            break;
                        }
                    }
                })
                .expect("spawn scheduler background thread")
        };

        Self {
            shared,
            main: Some(main),
            background: Some(background),
        }
    }

    /// Register a task; sets it Waiting. Re-adding the same Arc is a no-op:
    /// construct a fresh task per schedule.
    pub fn add_task(&self, task: Arc<SchedulerTask>) {
        let mut registry = lock_unpoisoned(&self.shared.registry);
        if registry.iter().any(|t| Arc::ptr_eq(t, &task)) {
            return;
        }
        lock_unpoisoned(&task.control).state = TaskState::Waiting;
        registry.push(task);
        self.shared.refresh_snapshot(&registry);
    }

    /// Mark Finished and drop from the registry. No-op if already removed.
    pub fn remove_task(&self, task: &Arc<SchedulerTask>) {
        self.shared.remove(task);
    }

    pub fn task_count(&self) -> usize {
        lock_unpoisoned(&self.shared.registry).len()
    }

    /// Cooperative shutdown: both loops observe the flag within one poll
    /// interval; joins them before returning.
    pub fn stop(&mut self) {
        self.shared.shutting_down.store(true, Ordering::Release);
        if let Some(h) = self.main.take() {
            let _ = h.join();
        }
        if let Some(h) = self.background.take() {
            let _ = h.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
