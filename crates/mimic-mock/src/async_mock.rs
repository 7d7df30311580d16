//! Asynchronous mock functions.
//!
//! The sequence number and the one-shot dequeue happen when the mock is
//! called, not when its future completes. Racing completions therefore never
//! reorder the recorded invocation order; only the outcome is filled in late.

use futures::future::{self, BoxFuture, FutureExt};
use mimic_common_log::spans::{instrument_future, mock_span};
use std::convert::Infallible;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use crate::behavior::{AsyncImplementation, Behavior};
use crate::recorder::Outcome;
use crate::state::MockCore;

/// Mock for a function returning a future.
pub struct AsyncMockFn<A, T, E = Infallible> {
    core: Arc<MockCore<A, T, E, AsyncImplementation<A, T, E>>>,
}

impl<A, T, E> Clone for AsyncMockFn<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<A, T, E> AsyncMockFn<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create a bare async mock: it resolves to `T::default()`.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::named("async_mock")
    }

    /// Create a bare async mock with a name.
    pub fn named(name: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self::with_fallback(name, Arc::new(|_| future::ready(Ok(T::default())).boxed()))
    }

    /// Create a mock that delegates to `original` when nothing is configured.
    pub fn spying<F, Fut>(name: impl Into<String>, original: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_fallback(name, boxed_implementation(original))
    }

    /// Wrap an async free function: an unnamed spy over `f`.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::spying("async_mock", f)
    }

    pub(crate) fn with_fallback(
        name: impl Into<String>,
        fallback: AsyncImplementation<A, T, E>,
    ) -> Self {
        Self {
            core: Arc::new(MockCore::new(name, fallback)),
        }
    }

    /// Invoke the mock.
    ///
    /// Implementations run eagerly, at call time; the returned future only
    /// drives their completion and records the outcome.
    pub fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>> {
        let (sequence, behavior) = self.core.begin(args.clone());

        let pending: BoxFuture<'static, Result<T, E>> = match behavior {
            Some(Behavior::Return(value)) => future::ready(Ok(value)).boxed(),
            Some(Behavior::Throw(err)) => future::ready(Err(err)).boxed(),
            Some(Behavior::Resolve(value)) => async move {
                tokio::task::yield_now().await;
                Ok(value)
            }
            .boxed(),
            Some(Behavior::Reject(err)) => async move {
                tokio::task::yield_now().await;
                Err(err)
            }
            .boxed(),
            Some(Behavior::Implementation(f)) => f(args),
            None => (self.core.fallback)(args),
        };

        let span = mock_span(self.core.name(), sequence);
        let core = Arc::clone(&self.core);
        instrument_future(
            async move {
                let result = pending.await;
                core.complete(sequence, Outcome::from_result(&result));
                result
            },
            span,
        )
        .boxed()
    }

    /// Install the async implementation used once the one-shot queue is empty.
    pub fn implementation<F, Fut>(&self, f: F) -> &Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.core
            .set_persistent(Behavior::Implementation(boxed_implementation(f)));
        self
    }

    /// Queue an async implementation for the next unclaimed call.
    pub fn implementation_once<F, Fut>(&self, f: F) -> &Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.core
            .push_once(Behavior::Implementation(boxed_implementation(f)));
        self
    }

    /// Resolve every call with `value` once the one-shot queue is empty.
    pub fn resolved_value(&self, value: T) -> &Self {
        self.core.set_persistent(Behavior::Resolve(value));
        self
    }

    /// Resolve the next unclaimed call with `value`.
    pub fn resolved_value_once(&self, value: T) -> &Self {
        self.core.push_once(Behavior::Resolve(value));
        self
    }

    /// Reject every call with `error` once the one-shot queue is empty.
    pub fn rejected_value(&self, error: E) -> &Self {
        self.core.set_persistent(Behavior::Reject(error));
        self
    }

    /// Reject the next unclaimed call with `error`.
    pub fn rejected_value_once(&self, error: E) -> &Self {
        self.core.push_once(Behavior::Reject(error));
        self
    }
}

pub(crate) fn boxed_implementation<A, T, E, F, Fut>(f: F) -> AsyncImplementation<A, T, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

impl<A, T, E> Default for AsyncMockFn<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Default + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T, E> Deref for AsyncMockFn<A, T, E> {
    type Target = MockCore<A, T, E, AsyncImplementation<A, T, E>>;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

impl<A, T, E> std::fmt::Debug for AsyncMockFn<A, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.core, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolved_and_rejected_once() {
        let mock: AsyncMockFn<(), &'static str, &'static str> = AsyncMockFn::new();
        mock.resolved_value_once("f-resolved")
            .rejected_value_once("f-rejected");

        assert_eq!(mock.call(()).await, Ok("f-resolved"));
        assert_eq!(mock.call(()).await, Err("f-rejected"));
        assert_eq!(mock.call(()).await, Ok(""));
    }

    #[tokio::test]
    async fn test_outcome_pending_until_awaited() {
        let mock: AsyncMockFn<(), u32> = AsyncMockFn::new();
        mock.resolved_value(7);

        let fut = mock.call(());
        assert!(mock.last_result().unwrap().is_pending());
        assert_eq!(fut.await, Ok(7));
        assert_eq!(mock.last_result(), Some(Outcome::Returned(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_follows_call_order_not_completion() {
        let slow: AsyncMockFn<(u64,), u64> = AsyncMockFn::named("slow");
        let fast: AsyncMockFn<(u64,), u64> = AsyncMockFn::named("fast");
        let delayed = |(ms,): (u64,)| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(ms)
        };
        slow.implementation(delayed);
        fast.implementation(delayed);

        let a1 = slow.call((300,));
        let b1 = fast.call((10,));
        let a2 = slow.call((200,));
        let (r_a1, r_b1, r_a2) = tokio::join!(a1, b1, a2);
        assert_eq!((r_a1, r_b1, r_a2), (Ok(300), Ok(10), Ok(200)));

        let slow_order = slow.invocation_order();
        let fast_order = fast.invocation_order();
        assert!(slow_order[0] < fast_order[0]);
        assert!(fast_order[0] < slow_order[1]);
    }

    #[tokio::test]
    async fn test_implementation_runs_at_call_time() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mock: AsyncMockFn<(), usize> = AsyncMockFn::new();
        let seen = Arc::clone(&counter);
        mock.implementation(move |_| {
            let n = seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            async move { Ok(n) }
        });

        let fut = mock.call(());
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(fut.await, Ok(1));
    }
}
