//! Call recording.
//!
//! Every invocation of every mock takes a number from one process-wide
//! counter when it starts. The counter is never reset, so numbers taken by
//! different mocks order their calls relative to each other even after
//! histories have been cleared.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static INVOCATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Allocate the next global invocation sequence number.
pub fn next_sequence() -> u64 {
    INVOCATION_SEQUENCE.fetch_add(1, Ordering::SeqCst)
}

/// What one invocation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Outcome<T, E> {
    /// The call returned (or its future resolved) with a value.
    #[serde(rename = "return")]
    Returned(T),
    /// The call failed (or its future rejected) with an error.
    #[serde(rename = "throw")]
    Threw(E),
    /// The call has started but not completed yet.
    #[serde(rename = "incomplete")]
    Pending,
}

impl<T, E> Outcome<T, E> {
    /// Build an outcome from a call result.
    pub fn from_result(result: &Result<T, E>) -> Self
    where
        T: Clone,
        E: Clone,
    {
        match result {
            Ok(value) => Self::Returned(value.clone()),
            Err(err) => Self::Threw(err.clone()),
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, Self::Returned(_))
    }

    pub fn is_threw(&self) -> bool {
        matches!(self, Self::Threw(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The returned value, if any.
    pub fn returned(&self) -> Option<&T> {
        match self {
            Self::Returned(value) => Some(value),
            _ => None,
        }
    }

    /// The thrown error, if any.
    pub fn threw(&self) -> Option<&E> {
        match self {
            Self::Threw(err) => Some(err),
            _ => None,
        }
    }
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationRecord<A, T, E> {
    /// Arguments the mock was called with.
    pub arguments: A,
    /// What the call produced.
    pub outcome: Outcome<T, E>,
    /// Global invocation order.
    pub sequence: u64,
}

/// Ordered call history of a single mock.
#[derive(Debug)]
pub struct CallRecorder<A, T, E> {
    records: Vec<InvocationRecord<A, T, E>>,
}

impl<A, T, E> CallRecorder<A, T, E> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a completed call and return its sequence number.
    pub fn record(&mut self, arguments: A, outcome: Outcome<T, E>) -> u64 {
        let sequence = next_sequence();
        self.records.push(InvocationRecord {
            arguments,
            outcome,
            sequence,
        });
        sequence
    }

    /// Append a call whose outcome is not known yet.
    pub fn begin(&mut self, arguments: A) -> u64 {
        self.record(arguments, Outcome::Pending)
    }

    /// Fill in the outcome of a call started with [`begin`](Self::begin).
    ///
    /// Returns `false` when the record is gone because the history was
    /// cleared while the call was in flight.
    pub fn complete(&mut self, sequence: u64, outcome: Outcome<T, E>) -> bool {
        // Sequences are increasing within one history, so search from the back.
        match self.records.iter_mut().rev().find(|r| r.sequence == sequence) {
            Some(record) => {
                record.outcome = outcome;
                true
            }
            None => false,
        }
    }

    pub fn history(&self) -> &[InvocationRecord<A, T, E>] {
        &self.records
    }

    /// Global sequence number of every record, in call order.
    pub fn invocation_order(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.sequence).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. The global counter keeps counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<A: Clone, T: Clone, E: Clone> CallRecorder<A, T, E> {
    /// Arguments of every record, in call order.
    pub fn calls(&self) -> Vec<A> {
        self.records.iter().map(|r| r.arguments.clone()).collect()
    }

    /// Outcome of every record, in call order.
    pub fn results(&self) -> Vec<Outcome<T, E>> {
        self.records.iter().map(|r| r.outcome.clone()).collect()
    }
}

impl<A, T, E> Default for CallRecorder<A, T, E> {
    fn default() -> Self {
        Self::new()
    }
}
