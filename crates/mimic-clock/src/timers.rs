//! Switchable timer controller.
//!
//! [`Timers`] is the clock a test hands to the code under test. It starts in
//! real or fake mode according to [`TimerConfig`] and can be switched at any
//! point; switching to real timers throws the whole virtual clock away without
//! firing anything.

use mimic_common_config::TimerConfig;
use mimic_common_core::{Error, Result, TimerId};
use mimic_common_log::spans::clock_span;
use parking_lot::RwLock;
use std::time::Duration;

use crate::clock::{Clock, TimerCallback};
use crate::real::RealClock;
use crate::virtual_clock::VirtualClock;

#[derive(Clone)]
enum Mode {
    Real(RealClock),
    Fake(VirtualClock),
}

/// A [`Clock`] that switches between real and virtual timers.
pub struct Timers {
    config: TimerConfig,
    mode: RwLock<Mode>,
}

impl Timers {
    pub fn new(config: TimerConfig) -> Self {
        let mode = if config.fake_by_default {
            Mode::Fake(VirtualClock::new(config.start_ms))
        } else {
            Mode::Real(RealClock::new())
        };
        Self {
            config,
            mode: RwLock::new(mode),
        }
    }

    /// Replace real timers with a fresh virtual clock.
    ///
    /// Calling this while already faked starts over with a new clock.
    pub fn use_fake_timers(&self) {
        let span = clock_span("timers", "use_fake_timers");
        let _guard = span.enter();

        let previous = std::mem::replace(
            &mut *self.mode.write(),
            Mode::Fake(VirtualClock::new(self.config.start_ms)),
        );
        if let Mode::Fake(old) = previous {
            tracing::debug!(discarded = old.pending_count(), "replaced virtual clock");
        } else {
            tracing::debug!(start_ms = self.config.start_ms, "fake timers enabled");
        }
    }

    /// Go back to real timers, discarding every pending virtual timer.
    pub fn use_real_timers(&self) {
        let span = clock_span("timers", "use_real_timers");
        let _guard = span.enter();

        let previous = std::mem::replace(&mut *self.mode.write(), Mode::Real(RealClock::new()));
        if let Mode::Fake(old) = previous {
            let discarded = old.pending_count();
            old.clear();
            tracing::debug!(discarded, "real timers restored");
        }
    }

    pub fn is_fake(&self) -> bool {
        matches!(*self.mode.read(), Mode::Fake(_))
    }

    /// The virtual clock, when fake timers are active.
    pub fn virtual_clock(&self) -> Option<VirtualClock> {
        match &*self.mode.read() {
            Mode::Fake(clock) => Some(clock.clone()),
            Mode::Real(_) => None,
        }
    }

    fn fake(&self) -> Result<VirtualClock> {
        self.virtual_clock().ok_or(Error::NotFakeTimers)
    }

    // Clone the active clock out so no lock is held while callbacks run.
    fn current(&self) -> Mode {
        self.mode.read().clone()
    }

    /// Advance virtual time, firing what falls due. Returns the number fired.
    pub fn advance_timers_by_time(&self, duration: Duration) -> Result<usize> {
        Ok(self.fake()?.advance_by(duration))
    }

    /// Fire virtual timers until none are left, up to the configured limit.
    pub fn run_all_timers(&self) -> Result<usize> {
        self.fake()?.run_all(self.config.loop_limit)
    }

    /// Fire only the virtual timers pending right now.
    pub fn run_only_pending_timers(&self) -> Result<usize> {
        Ok(self.fake()?.run_only_pending())
    }

    /// Abort every pending real timer. Does nothing in fake mode.
    pub fn cancel_real_timers(&self) {
        if let Mode::Real(clock) = self.current() {
            clock.cancel_all();
        }
    }

    /// Drop every pending virtual timer.
    pub fn clear_all_timers(&self) -> Result<()> {
        self.fake()?.clear();
        Ok(())
    }

    /// Number of pending timers in the active mode.
    pub fn timer_count(&self) -> usize {
        match self.current() {
            Mode::Fake(clock) => clock.pending_count(),
            Mode::Real(clock) => clock.pending_count(),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

impl Clock for Timers {
    fn now_ms(&self) -> u64 {
        match self.current() {
            Mode::Fake(clock) => clock.now_ms(),
            Mode::Real(clock) => clock.now_ms(),
        }
    }

    fn schedule_once(&self, callback: TimerCallback, delay: Duration) -> Result<TimerId> {
        match self.current() {
            Mode::Fake(clock) => clock.schedule_once(callback, delay),
            Mode::Real(clock) => clock.schedule_once(callback, delay),
        }
    }

    fn schedule_repeating(&self, callback: TimerCallback, interval: Duration) -> Result<TimerId> {
        match self.current() {
            Mode::Fake(clock) => clock.schedule_repeating(callback, interval),
            Mode::Real(clock) => clock.schedule_repeating(callback, interval),
        }
    }

    fn cancel(&self, id: TimerId) -> bool {
        match self.current() {
            Mode::Fake(clock) => clock.cancel(id),
            Mode::Real(clock) => clock.cancel(id),
        }
    }
}

impl std::fmt::Debug for Timers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timers")
            .field("fake", &self.is_fake())
            .field("config", &self.config)
            .finish()
    }
}
