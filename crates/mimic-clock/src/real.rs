//! Wall-clock timers backed by tokio.

use mimic_common_core::{Error, Result, TimerId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::clock::{interval_millis, Clock, TimerCallback};

/// Real timers: each timer is a tokio task, cancelled by aborting it.
#[derive(Clone, Default)]
pub struct RealClock {
    handle: Option<Handle>,
    tasks: Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>,
}

impl RealClock {
    /// Create a clock bound to the current tokio runtime, if there is one.
    ///
    /// Without a runtime the clock still reads the time, but scheduling
    /// fails with [`Error::NoRuntime`] unless a runtime is current by then.
    pub fn new() -> Self {
        Self {
            handle: Handle::try_current().ok(),
            tasks: Arc::default(),
        }
    }

    /// Number of timers that have not fired or been cancelled.
    pub fn pending_count(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, task| !task.is_finished());
        tasks.len()
    }

    /// Abort every pending timer.
    pub fn cancel_all(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks.values() {
            task.abort();
        }
        tracing::debug!(cancelled = tasks.len(), "cancelled real timers");
    }

    fn runtime(&self) -> Result<Handle> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| Error::NoRuntime),
        }
    }

    fn spawn<F>(&self, make_task: F) -> Result<TimerId>
    where
        F: FnOnce(Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>, TimerId) -> JoinHandle<()>,
    {
        let runtime = self.runtime()?;
        let _enter = runtime.enter();
        let id = TimerId::next();
        // Hold the map while spawning so a timer that fires at once cannot
        // try to remove itself before it has been inserted.
        let mut tasks = self.tasks.lock();
        let task = make_task(Arc::clone(&self.tasks), id);
        tasks.insert(id, task);
        Ok(id)
    }
}

impl Clock for RealClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(crate::clock::millis)
            .unwrap_or(0)
    }

    fn schedule_once(&self, mut callback: TimerCallback, delay: Duration) -> Result<TimerId> {
        let id = self.spawn(move |tasks, id| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                callback();
                tasks.lock().remove(&id);
            })
        })?;
        tracing::trace!(timer = %id, ?delay, "real timeout scheduled");
        Ok(id)
    }

    fn schedule_repeating(&self, mut callback: TimerCallback, interval: Duration) -> Result<TimerId> {
        let period = Duration::from_millis(interval_millis(interval));
        let id = self.spawn(move |_, _| {
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    callback();
                }
            })
        })?;
        tracing::trace!(timer = %id, ?period, "real interval scheduled");
        Ok(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        match self.tasks.lock().remove(&id) {
            Some(task) => {
                let pending = !task.is_finished();
                task.abort();
                pending
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for RealClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealClock")
            .field("has_runtime", &self.handle.is_some())
            .field("tasks", &self.tasks.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, TimerCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (
            count,
            Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_schedule_without_runtime_fails() {
        let clock = RealClock::new();
        let (_, cb) = counter();
        assert_eq!(
            clock.schedule_once(cb, Duration::from_millis(1)),
            Err(Error::NoRuntime)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_after_delay() {
        let clock = RealClock::new();
        let (count, cb) = counter();
        clock.schedule_once(cb, Duration::from_millis(50)).unwrap();

        tokio::time::sleep(Duration::from_millis(49)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(clock.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_and_cancel() {
        let clock = RealClock::new();
        let (count, cb) = counter();
        let id = clock.schedule_repeating(cb, Duration::from_millis(10)).unwrap();

        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        assert!(clock.cancel(id));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!clock.cancel(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let clock = RealClock::new();
        let (count, cb) = counter();
        clock.schedule_once(cb, Duration::from_millis(10)).unwrap();

        clock.cancel_all();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(clock.pending_count(), 0);
    }
}
