//! A counter that ticks once a second through an injected clock.

use mimic_clock::{Clock, TimerId};
use mimic_common_core::Result;
use mimic_mock::FnSlot;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tick period of a running [`Counter`].
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct Counter {
    clock: Arc<dyn Clock>,
    value: Arc<AtomicU64>,
    timer: Mutex<Option<TimerId>>,
    /// Called on every tick; increments the count.
    pub tick: Arc<FnSlot<(), ()>>,
}

impl Counter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let value = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&value);
        Self {
            clock,
            value,
            timer: Mutex::new(None),
            tick: Arc::new(FnSlot::new("counter.tick", move |_: ()| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
        }
    }

    /// Start ticking. A running counter is left alone.
    pub fn start(&self) -> Result<()> {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return Ok(());
        }
        let tick = Arc::clone(&self.tick);
        let id = self.clock.schedule_repeating(
            Box::new(move || tick.call_infallible(())),
            TICK_INTERVAL,
        )?;
        tracing::debug!(timer = %id, "counter started");
        *timer = Some(id);
        Ok(())
    }

    /// Stop ticking and reset the count to zero.
    pub fn stop(&self) {
        if let Some(id) = self.timer.lock().take() {
            self.clock.cancel(id);
            tracing::debug!(timer = %id, "counter stopped");
        }
        self.value.store(0, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    pub fn count(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("count", &self.count())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_clock::VirtualClock;

    #[test]
    fn test_start_twice_keeps_one_timer() {
        let clock = VirtualClock::new(0);
        let counter = Counter::new(Arc::new(clock.clone()));
        counter.start().unwrap();
        counter.start().unwrap();
        assert_eq!(clock.pending_count(), 1);

        clock.advance_by(Duration::from_secs(10));
        assert_eq!(counter.count(), 10);
    }

    #[test]
    fn test_stop_resets_and_cancels() {
        let clock = VirtualClock::new(0);
        let counter = Counter::new(Arc::new(clock.clone()));
        counter.start().unwrap();
        clock.advance_by(Duration::from_secs(3));

        counter.stop();
        assert_eq!(counter.count(), 0);
        assert!(!counter.is_running());
        assert_eq!(clock.pending_count(), 0);
    }

    #[test]
    fn test_stop_when_idle() {
        let counter = Counter::new(Arc::new(VirtualClock::new(0)));
        counter.stop();
        assert_eq!(counter.count(), 0);
    }
}
