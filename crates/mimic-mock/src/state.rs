//! State shared by sync and async mock functions.

use mimic_common_core::MockId;
use parking_lot::Mutex;

use crate::behavior::{Behavior, BehaviorQueue};
use crate::recorder::{CallRecorder, InvocationRecord, Outcome};

struct MockState<A, T, E, I> {
    recorder: CallRecorder<A, T, E>,
    queue: BehaviorQueue<T, E, I>,
}

/// Recorded calls and configured behaviors of one mock.
///
/// Both [`MockFn`](crate::MockFn) and [`AsyncMockFn`](crate::AsyncMockFn)
/// dereference to this, so inspection and the value setters read the same on
/// either kind of mock.
pub struct MockCore<A, T, E, I> {
    id: MockId,
    name: String,
    state: Mutex<MockState<A, T, E, I>>,
    pub(crate) fallback: I,
}

impl<A, T, E, I> MockCore<A, T, E, I> {
    pub(crate) fn new(name: impl Into<String>, fallback: I) -> Self {
        Self {
            id: MockId::next(),
            name: name.into(),
            state: Mutex::new(MockState {
                recorder: CallRecorder::new(),
                queue: BehaviorQueue::new(),
            }),
            fallback,
        }
    }

    pub fn id(&self) -> MockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.state.lock().recorder.len()
    }

    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Number of one-shot behaviors not consumed yet.
    pub fn pending_once(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Forget recorded calls; behaviors stay configured.
    pub fn clear(&self) {
        self.state.lock().recorder.clear();
        tracing::debug!(mock = %self.name, id = %self.id, "mock cleared");
    }

    /// Forget recorded calls and every configured behavior.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.recorder.clear();
        state.queue.clear();
        tracing::debug!(mock = %self.name, id = %self.id, "mock reset");
    }

    pub(crate) fn push_once(&self, behavior: Behavior<T, E, I>) {
        self.state.lock().queue.enqueue_once(behavior);
    }

    pub(crate) fn set_persistent(&self, behavior: Behavior<T, E, I>) {
        self.state.lock().queue.set_persistent(behavior);
    }

    /// Make every call return `value` once the one-shot queue is empty.
    pub fn return_value(&self, value: T) -> &Self {
        self.set_persistent(Behavior::Return(value));
        self
    }

    /// Make the next unclaimed call return `value`.
    pub fn return_value_once(&self, value: T) -> &Self {
        self.push_once(Behavior::Return(value));
        self
    }

    /// Make every call fail with `error` once the one-shot queue is empty.
    pub fn throw_error(&self, error: E) -> &Self {
        self.set_persistent(Behavior::Throw(error));
        self
    }

    /// Make the next unclaimed call fail with `error`.
    pub fn throw_error_once(&self, error: E) -> &Self {
        self.push_once(Behavior::Throw(error));
        self
    }

    pub(crate) fn complete(&self, sequence: u64, outcome: Outcome<T, E>) {
        if !self.state.lock().recorder.complete(sequence, outcome) {
            tracing::trace!(mock = %self.name, sequence, "completed call no longer in history");
        }
    }
}

impl<A, T: Clone, E: Clone, I: Clone> MockCore<A, T, E, I> {
    /// Start a call: take a sequence number, record the arguments and pick
    /// the behavior, all under one lock.
    pub(crate) fn begin(&self, arguments: A) -> (u64, Option<Behavior<T, E, I>>) {
        let mut state = self.state.lock();
        let sequence = state.recorder.begin(arguments);
        let behavior = state.queue.resolve_next();
        tracing::trace!(mock = %self.name, sequence, behavior = ?behavior, "mock called");
        (sequence, behavior)
    }
}

impl<A: Clone, T: Clone, E: Clone, I> MockCore<A, T, E, I> {
    /// Full call history in call order.
    pub fn history(&self) -> Vec<InvocationRecord<A, T, E>> {
        self.state.lock().recorder.history().to_vec()
    }

    /// Arguments of every call, in call order.
    pub fn calls(&self) -> Vec<A> {
        self.state.lock().recorder.calls()
    }

    /// Arguments of the most recent call.
    pub fn last_call(&self) -> Option<A> {
        self.state
            .lock()
            .recorder
            .history()
            .last()
            .map(|r| r.arguments.clone())
    }

    /// Arguments of the `n`-th call, counting from 1.
    pub fn nth_call(&self, n: usize) -> Option<A> {
        let index = n.checked_sub(1)?;
        self.state
            .lock()
            .recorder
            .history()
            .get(index)
            .map(|r| r.arguments.clone())
    }

    /// Outcome of every call, in call order.
    pub fn results(&self) -> Vec<Outcome<T, E>> {
        self.state.lock().recorder.results()
    }

    /// Outcome of the most recent call.
    pub fn last_result(&self) -> Option<Outcome<T, E>> {
        self.state
            .lock()
            .recorder
            .history()
            .last()
            .map(|r| r.outcome.clone())
    }

    /// Global sequence number of every call, in call order.
    pub fn invocation_order(&self) -> Vec<u64> {
        self.state.lock().recorder.invocation_order()
    }

    /// Number of calls that completed by returning.
    pub fn returned_count(&self) -> usize {
        self.state
            .lock()
            .recorder
            .history()
            .iter()
            .filter(|r| r.outcome.is_returned())
            .count()
    }
}

impl<A, T, E, I> std::fmt::Debug for MockCore<A, T, E, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("calls", &state.recorder.len())
            .field("pending_once", &state.queue.len())
            .field("persistent", &state.queue.has_persistent())
            .finish()
    }
}
