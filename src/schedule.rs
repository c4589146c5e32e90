//! Self-rescheduling poll task
//!
//! A [`PollTask`] runs one async cycle at a time. The next cycle is scheduled
//! only after the current one finished, so slow responses stretch the
//! effective period instead of piling up requests.

use log::{debug, info};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;

pub type CycleFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Cycle = Box<dyn Fn() -> CycleFuture + Send + Sync>;

pub struct PollTask {
    name: &'static str,
    period: Duration,
    cycle: Cycle,
    running: AtomicBool,
    /// Signalled whenever a guarded run finishes
    finished: Notify,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the running flag however the cycle ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PollTask {
    pub fn new<F, Fut>(name: &'static str, period: Duration, cycle: F) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Arc::new(PollTask {
            name,
            period,
            cycle: Box::new(move || -> CycleFuture { Box::pin(cycle()) }),
            running: AtomicBool::new(false),
            finished: Notify::new(),
            driver: Mutex::new(None),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_scheduled(&self) -> bool {
        self.driver
            .lock()
            .map(|driver| driver.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn try_acquire(&self) -> Option<RunningGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(&self.running))
    }

    /// Run one cycle now.
    ///
    /// Returns `false` without doing anything when a cycle is already in
    /// flight. A completed manual run restarts the wait for the next timed run.
    pub async fn poll(&self) -> bool {
        let Some(guard) = self.try_acquire() else {
            debug!("{} poll skipped, previous cycle still running", self.name);
            return false;
        };

        (self.cycle)().await;
        drop(guard);

        self.finished.notify_waiters();
        true
    }

    /// Run `work` while holding the cycle guard, so polls triggered meanwhile
    /// are skipped. Waits for a cycle already in flight to finish first.
    pub async fn run_exclusive<F: Future>(&self, work: F) -> F::Output {
        loop {
            let finished = self.finished.notified();
            tokio::pin!(finished);
            finished.as_mut().enable();

            if let Some(guard) = self.try_acquire() {
                let output = work.await;
                drop(guard);
                self.finished.notify_waiters();
                return output;
            }
            finished.await;
        }
    }

    /// Start timed polling: wait one period, run a cycle, repeat.
    ///
    /// Each timed cycle runs in its own task, so [`PollTask::stop`] only
    /// cancels the wait and never a cycle in flight. Calling `start` on a
    /// task that is already scheduled replaces the pending timer.
    pub fn start(self: &Arc<Self>) {
        let task = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sleep(task.period) => {}
                    _ = task.finished.notified() => continue,
                }

                let cycle = tokio::spawn({
                    let task = Arc::clone(&task);
                    async move {
                        task.poll().await;
                    }
                });
                // aborting the driver here detaches the cycle, it keeps running
                let _ = cycle.await;
            }
        });

        if let Ok(mut driver) = self.driver.lock() {
            if let Some(previous) = driver.replace(handle) {
                previous.abort();
            }
        }
        info!("{} polling every {:?}", self.name, self.period);
    }

    /// Cancel the pending timer; a cycle in flight still completes
    pub fn stop(&self) {
        if let Ok(mut driver) = self.driver.lock() {
            if let Some(handle) = driver.take() {
                handle.abort();
                info!("{} polling stopped", self.name);
            }
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        if let Ok(mut driver) = self.driver.lock() {
            if let Some(handle) = driver.take() {
                handle.abort();
            }
        }
    }
}
