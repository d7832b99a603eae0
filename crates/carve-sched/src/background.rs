//! Fire-and-forget job queue, independent of the tick scheduler.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::POLL_INTERVAL;

type Job = Box<dyn FnOnce() + Send>;

/// Simplest possible deferred-work facility: one worker thread, strict FIFO,
/// no recurrence, no priorities, no cancellation. Distinct from the
/// scheduler's background lane on purpose.
pub struct BackgroundTaskQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
    keep_going: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundTaskQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded::<Job>();
        Self {
            tx,
            rx,
            keep_going: Arc::new(AtomicBool::new(true)),
            worker: None,
        }
    }

    /// Spawn the single long-lived worker thread.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let rx = self.rx.clone();
        let keep_going = self.keep_going.clone();
        let handle = thread::Builder::new()
            .name("carve-bgq".into())
            .spawn(move || {
                loop {
                    match rx.recv_timeout(POLL_INTERVAL) {
                        Ok(job) => run_job(job),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if !keep_going.load(Ordering::Acquire) {
                        // Drain whatever was already queued, then exit.
                        while let Ok(job) = rx.try_recv() {
                            run_job(job);
                        }
                        break;
                    }
                }
            })
            .expect("spawn background queue worker");
        self.worker = Some(handle);
    }

    /// Enqueue one job. Silently dropped after shutdown: late producers are
    /// a normal race, not an error.
    pub fn add(&self, job: impl FnOnce() + Send + 'static) {
        if !self.keep_going.load(Ordering::Acquire) {
            return;
        }
        let _ = self.tx.send(Box::new(job));
    }

    /// Flip the keep-going flag and join the worker. The worker polls every
    /// ~10ms, so this returns promptly.
    pub fn shutdown(&mut self) {
        self.keep_going.store(false, Ordering::Release);
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
    }
}

impl Default for BackgroundTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BackgroundTaskQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_job(job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        log::error!(target: "sched", "background job panicked; queue continues");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn jobs_run_in_submission_order() {
        let mut queue = BackgroundTaskQueue::new();
        queue.start();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["a", "b", "c"] {
            let order = order.clone();
            queue.add(move || order.lock().unwrap().push(label));
        }
        thread::sleep(Duration::from_millis(200));
        queue.shutdown();
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn panicking_job_does_not_kill_the_worker() {
        let mut queue = BackgroundTaskQueue::new();
        queue.start();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o = order.clone();
        queue.add(move || o.lock().unwrap().push("first"));
        queue.add(|| panic!("bad job"));
        let o = order.clone();
        queue.add(move || o.lock().unwrap().push("last"));
        thread::sleep(Duration::from_millis(200));
        queue.shutdown();
        assert_eq!(*order.lock().unwrap(), vec!["first", "last"]);
    }

    #[test]
    fn add_after_shutdown_is_a_noop() {
        let mut queue = BackgroundTaskQueue::new();
        queue.start();
        queue.shutdown();
        let ran = Arc::new(AtomicBool::new(false));
        let r = ran.clone();
        queue.add(move || r.store(true, Ordering::SeqCst));
        thread::sleep(Duration::from_millis(50));
        assert!(!ran.load(Ordering::SeqCst));
    }
}
