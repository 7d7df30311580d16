//! The timer-scheduling interface.

use mimic_common_core::{Result, TimerId};
use std::time::Duration;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// A source of time that can run callbacks later.
///
/// Components that schedule time-based work take an `Arc<dyn Clock>` so the
/// same code runs against real timers in production and a
/// [`VirtualClock`](crate::VirtualClock) in tests.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;

    /// Run `callback` once after `delay`.
    fn schedule_once(&self, callback: TimerCallback, delay: Duration) -> Result<TimerId>;

    /// Run `callback` every `interval`, first after one interval.
    fn schedule_repeating(&self, callback: TimerCallback, interval: Duration) -> Result<TimerId>;

    /// Cancel a pending timer. Returns `false` if it was not pending.
    fn cancel(&self, id: TimerId) -> bool;
}

/// Whole milliseconds in `duration`, saturating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Repeating intervals shorter than 1 ms run every millisecond.
pub(crate) fn interval_millis(interval: Duration) -> u64 {
    millis(interval).max(1)
}
