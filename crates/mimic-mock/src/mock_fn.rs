//! Synchronous mock functions.

use std::convert::Infallible;
use std::ops::Deref;
use std::sync::Arc;

use mimic_common_log::spans::mock_span;

use crate::behavior::{Behavior, Implementation};
use crate::recorder::Outcome;
use crate::state::MockCore;

/// A callable stand-in that records its calls and plays back configured
/// behaviors.
///
/// Handles are cheap to clone and share state, so one clone can be moved into
/// the code under test while the test keeps another for inspection.
///
/// A failing call is an `Err(E)`. Functions that cannot fail use the default
/// `E = Infallible` and [`call_infallible`](MockFn::call_infallible).
pub struct MockFn<A, T, E = Infallible> {
    core: Arc<MockCore<A, T, E, Implementation<A, T, E>>>,
}

impl<A, T, E> Clone for MockFn<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<A, T, E> MockFn<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create a bare mock: with nothing configured it returns `T::default()`.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::named("mock")
    }

    /// Create a bare mock with a name used in logs and errors.
    pub fn named(name: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self::with_fallback(name, Arc::new(|_| Ok(T::default())))
    }

    /// Create a mock that delegates to `original` when nothing is configured.
    pub fn spying<F>(name: impl Into<String>, original: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::with_fallback(name, Arc::new(original))
    }

    /// Wrap a free function: an unnamed spy over `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::spying("mock", f)
    }

    pub(crate) fn with_fallback(name: impl Into<String>, fallback: Implementation<A, T, E>) -> Self {
        Self {
            core: Arc::new(MockCore::new(name, fallback)),
        }
    }

    /// Invoke the mock.
    pub fn call(&self, args: A) -> Result<T, E> {
        let (sequence, behavior) = self.core.begin(args.clone());
        let _span = mock_span(self.core.name(), sequence).entered();

        // Resolve/Reject can't suspend here; they complete immediately.
        let result = match behavior {
            Some(Behavior::Return(value)) | Some(Behavior::Resolve(value)) => Ok(value),
            Some(Behavior::Throw(err)) | Some(Behavior::Reject(err)) => Err(err),
            Some(Behavior::Implementation(f)) => f(args),
            None => (self.core.fallback)(args),
        };

        self.core.complete(sequence, Outcome::from_result(&result));
        result
    }

    /// Install the implementation used once the one-shot queue is empty.
    pub fn implementation<F>(&self, f: F) -> &Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        self.core.set_persistent(Behavior::Implementation(Arc::new(f)));
        self
    }

    /// Queue an implementation for the next unclaimed call.
    pub fn implementation_once<F>(&self, f: F) -> &Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        self.core.push_once(Behavior::Implementation(Arc::new(f)));
        self
    }
}

impl<A, T> MockFn<A, T, Infallible>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Invoke a mock whose target cannot fail.
    pub fn call_infallible(&self, args: A) -> T {
        match self.call(args) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Infallible form of [`implementation`](Self::implementation).
    pub fn returning<F>(&self, f: F) -> &Self
    where
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        self.implementation(move |args| Ok(f(args)))
    }

    /// Infallible form of [`implementation_once`](Self::implementation_once).
    pub fn returning_once<F>(&self, f: F) -> &Self
    where
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        self.implementation_once(move |args| Ok(f(args)))
    }
}

impl<A, T, E> Default for MockFn<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Default + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T, E> Deref for MockFn<A, T, E> {
    type Target = MockCore<A, T, E, Implementation<A, T, E>>;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

impl<A, T, E> std::fmt::Debug for MockFn<A, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.core, f)
    }
}
