//! Replaceable function slots.
//!
//! A collaborator exposes its mockable methods as slots. Production code calls
//! through the slot; a test installs a spy on it, which intercepts calls until
//! it is restored. Spying and restoring never touch the original function.

use futures::future::BoxFuture;
use mimic_common_core::Error;
use parking_lot::RwLock;
use std::convert::Infallible;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use crate::async_mock::{boxed_implementation, AsyncMockFn};
use crate::behavior::{AsyncImplementation, Implementation};
use crate::mock_fn::MockFn;
use crate::registry::MockControl;

/// A named function that can be intercepted.
pub struct Slot<I, M> {
    name: String,
    original: I,
    active: Arc<RwLock<Option<M>>>,
}

/// Slot for a synchronous function.
pub type FnSlot<A, T, E = Infallible> = Slot<Implementation<A, T, E>, MockFn<A, T, E>>;

/// Slot for a function returning a future.
pub type AsyncFnSlot<A, T, E = Infallible> =
    Slot<AsyncImplementation<A, T, E>, AsyncMockFn<A, T, E>>;

impl<I, M: Clone> Slot<I, M> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a spy or mock currently intercepts calls.
    pub fn is_mocked(&self) -> bool {
        self.active.read().is_some()
    }

    /// The mock currently intercepting calls, if any.
    pub fn mock(&self) -> Option<M> {
        self.active.read().clone()
    }

    fn install(&self, mock: M) -> Spy<M> {
        *self.active.write() = Some(mock.clone());
        Spy {
            name: self.name.clone(),
            mock,
            active: Arc::clone(&self.active),
        }
    }
}

impl<A, T, E> FnSlot<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new<F>(name: impl Into<String>, original: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            original: Arc::new(original),
            active: Arc::new(RwLock::new(None)),
        }
    }

    /// Call through the slot.
    pub fn call(&self, args: A) -> Result<T, E> {
        // Clone out so the lock is not held while the mock runs; an
        // implementation may call back into this slot.
        let active = self.active.read().clone();
        match active {
            Some(mock) => mock.call(args),
            None => (self.original)(args),
        }
    }

    /// Intercept calls with a spy that delegates to the original.
    ///
    /// Spying on an already-spied slot returns the existing spy.
    pub fn spy(&self) -> Spy<MockFn<A, T, E>> {
        if let Some(existing) = self.mock() {
            return Spy {
                name: self.name.clone(),
                mock: existing,
                active: Arc::clone(&self.active),
            };
        }
        let mock = MockFn::with_fallback(self.name.clone(), Arc::clone(&self.original));
        tracing::debug!(slot = %self.name, id = %mock.id(), "spy installed");
        self.install(mock)
    }

    /// Intercept calls with a bare mock that returns `T::default()`.
    ///
    /// Replaces any spy already installed.
    pub fn mock_inert(&self) -> Spy<MockFn<A, T, E>>
    where
        T: Default,
    {
        let mock = MockFn::named(self.name.clone());
        tracing::debug!(slot = %self.name, id = %mock.id(), "inert mock installed");
        self.install(mock)
    }
}

impl<A, T> FnSlot<A, T, Infallible>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Call a slot whose function cannot fail.
    pub fn call_infallible(&self, args: A) -> T {
        match self.call(args) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<A, T, E> AsyncFnSlot<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, original: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            name: name.into(),
            original: boxed_implementation(original),
            active: Arc::new(RwLock::new(None)),
        }
    }

    /// Call through the slot.
    pub fn call(&self, args: A) -> BoxFuture<'static, Result<T, E>> {
        let active = self.active.read().clone();
        match active {
            Some(mock) => mock.call(args),
            None => (self.original)(args),
        }
    }

    /// Intercept calls with a spy that delegates to the original.
    pub fn spy(&self) -> Spy<AsyncMockFn<A, T, E>> {
        if let Some(existing) = self.mock() {
            return Spy {
                name: self.name.clone(),
                mock: existing,
                active: Arc::clone(&self.active),
            };
        }
        let mock = AsyncMockFn::with_fallback(self.name.clone(), Arc::clone(&self.original));
        tracing::debug!(slot = %self.name, id = %mock.id(), "async spy installed");
        self.install(mock)
    }

    /// Intercept calls with a bare mock that resolves to `T::default()`.
    pub fn mock_inert(&self) -> Spy<AsyncMockFn<A, T, E>>
    where
        T: Default,
    {
        let mock = AsyncMockFn::named(self.name.clone());
        tracing::debug!(slot = %self.name, id = %mock.id(), "inert async mock installed");
        self.install(mock)
    }
}

impl<I, M> std::fmt::Debug for Slot<I, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("mocked", &self.active.read().is_some())
            .finish()
    }
}

/// A mock installed on a slot.
///
/// Dereferences to the mock for configuration and inspection.
pub struct Spy<M> {
    name: String,
    mock: M,
    active: Arc<RwLock<Option<M>>>,
}

impl<M: Clone> Clone for Spy<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            mock: self.mock.clone(),
            active: Arc::clone(&self.active),
        }
    }
}

impl<M: MockControl> Spy<M> {
    /// Reset the spy and put the original function back.
    ///
    /// Fails with [`Error::MockRestored`] when this spy is no longer the one
    /// installed on its slot.
    pub fn restore(&self) -> mimic_common_core::Result<()> {
        let mut active = self.active.write();
        let installed = active
            .as_ref()
            .is_some_and(|m| m.id() == self.mock.id());
        if !installed {
            return Err(Error::restored(&self.name));
        }
        self.mock.reset();
        *active = None;
        tracing::debug!(slot = %self.name, id = %self.mock.id(), "spy restored");
        Ok(())
    }

    /// Whether this spy still intercepts calls on its slot.
    pub fn is_active(&self) -> bool {
        self.active
            .read()
            .as_ref()
            .is_some_and(|m| m.id() == self.mock.id())
    }

    /// The underlying mock handle.
    pub fn mock(&self) -> &M {
        &self.mock
    }

    pub fn slot_name(&self) -> &str {
        &self.name
    }
}

impl<M> Deref for Spy<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.mock
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for Spy<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spy")
            .field("slot", &self.name)
            .field("mock", &self.mock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_slot() -> FnSlot<(i64, i64), i64> {
        FnSlot::new("sum", |(a, b): (i64, i64)| Ok(a + b))
    }

    #[test]
    fn test_unmocked_slot_calls_original() {
        let sum = sum_slot();
        assert!(!sum.is_mocked());
        assert_eq!(sum.call_infallible((1, 2)), 3);
    }

    #[test]
    fn test_spy_records_and_delegates() {
        let sum = sum_slot();
        let spy = sum.spy();

        assert_eq!(sum.call_infallible((10, 20)), 30);
        assert_eq!(sum.call_infallible((20, 40)), 60);
        assert_eq!(spy.calls(), vec![(10, 20), (20, 40)]);
    }

    #[test]
    fn test_spy_overrides_then_restores() {
        let sum = sum_slot();
        let spy = sum.spy();
        spy.return_value(-1);
        assert_eq!(sum.call_infallible((1, 1)), -1);

        spy.restore().unwrap();
        assert!(!sum.is_mocked());
        assert_eq!(sum.call_infallible((1, 1)), 2);
        assert_eq!(spy.call_count(), 0);
    }

    #[test]
    fn test_spy_twice_returns_same_mock() {
        let sum = sum_slot();
        let first = sum.spy();
        let second = sum.spy();
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn test_restore_twice_fails() {
        let sum = sum_slot();
        let spy = sum.spy();
        spy.restore().unwrap();

        let err = spy.restore().unwrap_err();
        assert_eq!(err, Error::MockRestored { name: "sum".into() });
    }

    #[test]
    fn test_stale_spy_cannot_restore_new_one() {
        let sum = sum_slot();
        let old = sum.spy();
        old.restore().unwrap();
        let new = sum.spy();

        assert!(old.restore().is_err());
        assert!(new.is_active());
        assert!(!old.is_active());
    }

    #[test]
    fn test_reset_spy_keeps_delegating() {
        let sum = sum_slot();
        let spy = sum.spy();
        spy.return_value(0);
        spy.reset();
        assert_eq!(sum.call_infallible((2, 3)), 5);
    }

    #[test]
    fn test_mock_inert_returns_default() {
        let sum = sum_slot();
        let spy = sum.mock_inert();
        assert_eq!(sum.call_infallible((2, 3)), 0);
        assert_eq!(spy.call_count(), 1);
    }

    #[tokio::test]
    async fn test_async_slot_spy() {
        let fetch: AsyncFnSlot<(String,), String> =
            AsyncFnSlot::new("fetch", |(url,): (String,)| async move { Ok(format!("body of {url}")) });
        assert_eq!(fetch.call(("a".into(),)).await, Ok("body of a".to_string()));

        let spy = fetch.spy();
        spy.resolved_value_once("mocked".into());
        assert_eq!(fetch.call(("b".into(),)).await, Ok("mocked".to_string()));
        assert_eq!(fetch.call(("c".into(),)).await, Ok("body of c".to_string()));
        assert_eq!(spy.call_count(), 2);

        spy.restore().unwrap();
        assert!(!fetch.is_mocked());
    }
}
