//! What a mock does when it is called.
//!
//! A mock consults a single FIFO of one-shot behaviors first, regardless of
//! which setter queued them, then its persistent behavior, then its fallback.

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Arc;

/// Synchronous implementation installed on a [`MockFn`](crate::MockFn).
pub type Implementation<A, T, E> = Arc<dyn Fn(A) -> Result<T, E> + Send + Sync>;

/// Asynchronous implementation installed on an [`AsyncMockFn`](crate::AsyncMockFn).
pub type AsyncImplementation<A, T, E> =
    Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A single configured behavior.
///
/// `I` is the implementation type, which differs between sync and async mocks.
pub enum Behavior<T, E, I> {
    /// Return a fixed value.
    Return(T),
    /// Fail with a fixed error.
    Throw(E),
    /// Resolve with a fixed value after one scheduler yield.
    Resolve(T),
    /// Reject with a fixed error after one scheduler yield.
    Reject(E),
    /// Delegate to an implementation with the call's arguments.
    Implementation(I),
}

impl<T: Clone, E: Clone, I: Clone> Clone for Behavior<T, E, I> {
    fn clone(&self) -> Self {
        match self {
            Self::Return(v) => Self::Return(v.clone()),
            Self::Throw(e) => Self::Throw(e.clone()),
            Self::Resolve(v) => Self::Resolve(v.clone()),
            Self::Reject(e) => Self::Reject(e.clone()),
            Self::Implementation(f) => Self::Implementation(f.clone()),
        }
    }
}

impl<T, E, I> std::fmt::Debug for Behavior<T, E, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Return(_) => "Return",
            Self::Throw(_) => "Throw",
            Self::Resolve(_) => "Resolve",
            Self::Reject(_) => "Reject",
            Self::Implementation(_) => "Implementation",
        })
    }
}

/// One-shot FIFO plus an optional persistent behavior.
pub struct BehaviorQueue<T, E, I> {
    once: VecDeque<Behavior<T, E, I>>,
    persistent: Option<Behavior<T, E, I>>,
}

impl<T, E, I> BehaviorQueue<T, E, I> {
    pub fn new() -> Self {
        Self {
            once: VecDeque::new(),
            persistent: None,
        }
    }

    /// Queue a behavior for exactly one future call.
    pub fn enqueue_once(&mut self, behavior: Behavior<T, E, I>) {
        self.once.push_back(behavior);
    }

    /// Replace the persistent behavior. Queued one-shots are untouched.
    pub fn set_persistent(&mut self, behavior: Behavior<T, E, I>) {
        self.persistent = Some(behavior);
    }

    /// Number of one-shot behaviors still queued.
    pub fn len(&self) -> usize {
        self.once.len()
    }

    pub fn is_empty(&self) -> bool {
        self.once.is_empty()
    }

    pub fn has_persistent(&self) -> bool {
        self.persistent.is_some()
    }

    /// Drop every one-shot and the persistent behavior.
    pub fn clear(&mut self) {
        self.once.clear();
        self.persistent = None;
    }
}

impl<T: Clone, E: Clone, I: Clone> BehaviorQueue<T, E, I> {
    /// Behavior for the next call.
    ///
    /// `None` means nothing is configured and the mock's fallback applies.
    pub fn resolve_next(&mut self) -> Option<Behavior<T, E, I>> {
        self.once.pop_front().or_else(|| self.persistent.clone())
    }
}

impl<T, E, I> Default for BehaviorQueue<T, E, I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Queue = BehaviorQueue<&'static str, &'static str, Arc<dyn Fn() -> &'static str + Send + Sync>>;

    fn returned(b: Option<Behavior<&'static str, &'static str, Arc<dyn Fn() -> &'static str + Send + Sync>>>) -> &'static str {
        match b {
            Some(Behavior::Return(v)) | Some(Behavior::Resolve(v)) => v,
            Some(Behavior::Throw(e)) | Some(Behavior::Reject(e)) => e,
            Some(Behavior::Implementation(f)) => f(),
            None => "fallback",
        }
    }

    #[test]
    fn test_empty_queue_uses_fallback() {
        let mut queue = Queue::new();
        assert!(queue.resolve_next().is_none());
    }

    #[test]
    fn test_once_before_persistent() {
        let mut queue = Queue::new();
        queue.set_persistent(Behavior::Implementation(Arc::new(|| "a")));
        queue.enqueue_once(Behavior::Implementation(Arc::new(|| "a-1")));
        queue.enqueue_once(Behavior::Return("a-2"));

        assert_eq!(returned(queue.resolve_next()), "a-1");
        assert_eq!(returned(queue.resolve_next()), "a-2");
        assert_eq!(returned(queue.resolve_next()), "a");
        assert_eq!(returned(queue.resolve_next()), "a");
    }

    #[test]
    fn test_later_persistent_overwrites() {
        let mut queue = Queue::new();
        queue.set_persistent(Behavior::Implementation(Arc::new(|| "c")));
        queue.set_persistent(Behavior::Return("d"));
        assert_eq!(returned(queue.resolve_next()), "d");
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut queue = Queue::new();
        queue.set_persistent(Behavior::Return("g-1"));
        queue.enqueue_once(Behavior::Return("g-2"));
        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.has_persistent());
        assert!(queue.resolve_next().is_none());
    }

    proptest! {
        #[test]
        fn once_entries_come_out_in_install_order(
            installs in proptest::collection::vec(any::<bool>(), 1..20),
            persistent_after in any::<bool>(),
        ) {
            let mut queue: BehaviorQueue<usize, usize, Arc<dyn Fn() -> usize + Send + Sync>> =
                BehaviorQueue::new();
            for (i, use_impl) in installs.iter().enumerate() {
                if *use_impl {
                    queue.enqueue_once(Behavior::Implementation(Arc::new(move || i)));
                } else {
                    queue.enqueue_once(Behavior::Return(i));
                }
            }
            if persistent_after {
                queue.set_persistent(Behavior::Return(usize::MAX));
            }

            for expected in 0..installs.len() {
                let got = match queue.resolve_next() {
                    Some(Behavior::Return(v)) => v,
                    Some(Behavior::Implementation(f)) => f(),
                    other => panic!("unexpected {other:?}"),
                };
                prop_assert_eq!(got, expected);
            }

            let after = queue.resolve_next();
            if persistent_after {
                prop_assert!(matches!(after, Some(Behavior::Return(usize::MAX))));
            } else {
                prop_assert!(after.is_none());
            }
        }
    }
}
