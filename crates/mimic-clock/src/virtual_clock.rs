//! Virtual time.
//!
//! Time only moves when a test asks it to. Timers sit in a min-heap ordered
//! by `(fire_at, id)`; ids are allocated in creation order, so timers due at
//! the same instant fire in the order they were created. Cancelled timers
//! stay in the heap and are skipped when popped, until stale entries
//! outnumber live ones and the heap is compacted.

use mimic_common_core::{Error, Result, TimerId};
use mimic_common_log::spans::clock_span;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{interval_millis, millis, Clock, TimerCallback};

struct Timer {
    fire_at: u64,
    interval: Option<u64>,
    // Taken out while the callback runs.
    callback: Option<TimerCallback>,
}

#[derive(Debug, PartialEq, Eq)]
struct Scheduled {
    fire_at: u64,
    id: TimerId,
}

// Reversed so the std max-heap pops the earliest (fire_at, id) first.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Compaction only kicks in once the heap has at least this many entries.
const COMPACT_MIN: usize = 64;

#[derive(Default)]
struct VirtualState {
    now: u64,
    heap: BinaryHeap<Scheduled>,
    timers: HashMap<TimerId, Timer>,
}

impl VirtualState {
    fn insert(&mut self, fire_at: u64, interval: Option<u64>, callback: TimerCallback) -> TimerId {
        let id = TimerId::next();
        self.timers.insert(
            id,
            Timer {
                fire_at,
                interval,
                callback: Some(callback),
            },
        );
        self.heap.push(Scheduled { fire_at, id });
        id
    }

    fn is_live(&self, entry: &Scheduled) -> bool {
        self.timers
            .get(&entry.id)
            .is_some_and(|t| t.fire_at == entry.fire_at)
    }

    /// Drop heap entries left behind by cancelled or rescheduled timers.
    fn compact(&mut self) {
        if self.heap.len() < COMPACT_MIN || self.heap.len() <= 2 * self.timers.len() {
            return;
        }
        let heap = std::mem::take(&mut self.heap);
        let before = heap.len();
        let live: BinaryHeap<Scheduled> = heap.into_iter().filter(|e| self.is_live(e)).collect();
        self.heap = live;
        tracing::trace!(before, after = self.heap.len(), "compacted timer heap");
    }

    /// Pop the earliest live timer due at or before `target` that `eligible`
    /// accepts. Ineligible entries are put back.
    fn pop_due(&mut self, target: u64, eligible: impl Fn(TimerId) -> bool) -> Option<(TimerId, u64)> {
        let mut skipped = Vec::new();
        let mut found = None;

        while let Some(next) = self.heap.peek() {
            if next.fire_at > target {
                break;
            }
            let Some(entry) = self.heap.pop() else { break };
            if !self.is_live(&entry) {
                continue;
            }
            if eligible(entry.id) {
                found = Some((entry.id, entry.fire_at));
                break;
            }
            skipped.push(entry);
        }

        self.heap.extend(skipped);
        found
    }
}

/// A clock whose time advances only on request.
///
/// Cloning yields another handle to the same clock.
#[derive(Clone, Default)]
pub struct VirtualClock {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualClock {
    /// Create a clock reading `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState {
                now: start_ms,
                ..VirtualState::default()
            })),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.state.lock().now
    }

    /// Number of timers waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Drop every pending timer without firing it. Time does not move.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.timers.len();
        state.timers.clear();
        state.heap.clear();
        tracing::debug!(dropped, "cleared virtual timers");
    }

    /// Advance time by `duration`, firing every timer that falls due.
    ///
    /// Timers fire in `(fire_at, creation)` order and `now` reads each
    /// timer's fire time while its callback runs. Timers scheduled by those
    /// callbacks fire in the same call if they fall due before the target.
    /// Returns the number of callbacks fired.
    pub fn advance_by(&self, duration: Duration) -> usize {
        let span = clock_span("virtual", "advance_by");
        let _guard = span.enter();

        let target = self.now_ms().saturating_add(millis(duration));
        let mut fired = 0;
        while self.fire_next(target, |_| true) {
            fired += 1;
        }
        // A callback may have advanced this clock past the target already.
        let mut state = self.state.lock();
        state.now = state.now.max(target);
        let now = state.now;
        drop(state);

        tracing::debug!(target, now, fired, "advanced virtual time");
        fired
    }

    /// Fire timers until none are left.
    ///
    /// Time moves to each timer's fire time. Fails with
    /// [`Error::TimerLoopLimit`] when `loop_limit` timers have fired and more
    /// are still pending, which is what a repeating timer always causes.
    pub fn run_all(&self, loop_limit: usize) -> Result<usize> {
        let span = clock_span("virtual", "run_all");
        let _guard = span.enter();

        for fired in 0..loop_limit {
            if !self.fire_next(u64::MAX, |_| true) {
                tracing::debug!(fired, "ran all virtual timers");
                return Ok(fired);
            }
        }

        if self.pending_count() > 0 {
            tracing::warn!(limit = loop_limit, "timer loop limit reached");
            return Err(Error::TimerLoopLimit { limit: loop_limit });
        }
        Ok(loop_limit)
    }

    /// Fire only the timers pending right now, each at most once.
    ///
    /// Timers scheduled by those callbacks stay pending.
    pub fn run_only_pending(&self) -> usize {
        let span = clock_span("virtual", "run_only_pending");
        let _guard = span.enter();

        let (pending, target) = {
            let state = self.state.lock();
            let target = state.timers.values().map(|t| t.fire_at).max();
            let ids: HashSet<TimerId> = state.timers.keys().copied().collect();
            (Mutex::new(ids), target)
        };
        let Some(target) = target else { return 0 };

        let mut fired = 0;
        while self.fire_next(target, |id| pending.lock().remove(&id)) {
            fired += 1;
        }

        tracing::debug!(fired, "ran pending virtual timers");
        fired
    }

    fn fire_next(&self, target: u64, eligible: impl Fn(TimerId) -> bool) -> bool {
        let (id, repeating, callback) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let Some((id, fire_at)) = state.pop_due(target, eligible) else {
                return false;
            };
            state.now = state.now.max(fire_at);

            let Some(interval) = state.timers.get(&id).map(|t| t.interval) else {
                return false;
            };
            let callback = match interval {
                Some(interval) => {
                    let next = fire_at.saturating_add(interval);
                    state.heap.push(Scheduled { fire_at: next, id });
                    state.timers.get_mut(&id).and_then(|t| {
                        t.fire_at = next;
                        t.callback.take()
                    })
                }
                None => state.timers.remove(&id).and_then(|t| t.callback),
            };
            (id, interval.is_some(), callback)
        };

        tracing::trace!(timer = %id, repeating, "virtual timer fired");

        // Run without the lock: callbacks may schedule or cancel timers.
        let Some(mut callback) = callback else {
            return true;
        };
        callback();

        if repeating {
            if let Some(timer) = self.state.lock().timers.get_mut(&id) {
                timer.callback = Some(callback);
            }
        }
        true
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        VirtualClock::now_ms(self)
    }

    fn schedule_once(&self, callback: TimerCallback, delay: Duration) -> Result<TimerId> {
        let mut state = self.state.lock();
        let fire_at = state.now.saturating_add(millis(delay));
        let id = state.insert(fire_at, None, callback);
        tracing::trace!(timer = %id, fire_at, "virtual timeout scheduled");
        Ok(id)
    }

    fn schedule_repeating(&self, callback: TimerCallback, interval: Duration) -> Result<TimerId> {
        let interval = interval_millis(interval);
        let mut state = self.state.lock();
        let fire_at = state.now.saturating_add(interval);
        let id = state.insert(fire_at, Some(interval), callback);
        tracing::trace!(timer = %id, fire_at, interval, "virtual interval scheduled");
        Ok(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.state.lock();
        let removed = state.timers.remove(&id).is_some();
        if removed {
            state.compact();
            tracing::trace!(timer = %id, "virtual timer cancelled");
        }
        removed
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualClock")
            .field("now", &state.now)
            .field("pending", &state.timers.len())
            .finish()
    }
}
