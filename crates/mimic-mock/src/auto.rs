//! Auto-mocking of collaborator surfaces.
//!
//! A collaborator made of [`FnSlot`]s and [`AsyncFnSlot`]s, possibly nested
//! inside other collaborators, implements [`AutoMock`] (usually through
//! [`impl_auto_mock!`](crate::impl_auto_mock)). [`auto_mock`] then replaces
//! every reachable slot with an inert bare mock in one call.
//!
//! Shared collaborators are reached through `Arc`, and each `Arc` allocation
//! is visited once, so graphs with cycles terminate.

use std::collections::HashSet;
use std::sync::Arc;

use crate::registry::MockControl;
use crate::slot::{AsyncFnSlot, FnSlot};

/// State of one auto-mocking walk.
#[derive(Default)]
pub struct AutoMockContext {
    visited: HashSet<usize>,
    mocks: Vec<Arc<dyn MockControl>>,
}

impl AutoMockContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an allocation as visited. Returns `false` if it already was.
    pub fn enter(&mut self, address: usize) -> bool {
        self.visited.insert(address)
    }

    /// Record a mock installed during the walk.
    pub fn installed(&mut self, mock: Arc<dyn MockControl>) {
        self.mocks.push(mock);
    }

    /// Mocks installed so far, in walk order.
    pub fn mocks(&self) -> &[Arc<dyn MockControl>] {
        &self.mocks
    }

    pub fn into_mocks(self) -> Vec<Arc<dyn MockControl>> {
        self.mocks
    }
}

/// A collaborator whose callable members can all be replaced by mocks.
pub trait AutoMock {
    /// Replace every callable member with an inert mock, recording each.
    fn auto_mock_with(&self, cx: &mut AutoMockContext);
}

/// Replace every slot reachable from `root` with an inert bare mock.
///
/// Returns the installed mocks so they can be tracked and restored.
pub fn auto_mock<T: AutoMock + ?Sized>(root: &T) -> Vec<Arc<dyn MockControl>> {
    let mut cx = AutoMockContext::new();
    // The root may itself live inside an `Arc` that the graph points back to.
    cx.enter(root as *const T as *const () as usize);
    root.auto_mock_with(&mut cx);
    tracing::debug!(mocks = cx.mocks().len(), "auto-mocked collaborator");
    cx.into_mocks()
}

impl<A, T, E> AutoMock for FnSlot<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Default + Send + 'static,
    E: Clone + Send + 'static,
{
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        cx.installed(Arc::new(self.mock_inert()));
    }
}

impl<A, T, E> AutoMock for AsyncFnSlot<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Default + Send + 'static,
    E: Clone + Send + 'static,
{
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        cx.installed(Arc::new(self.mock_inert()));
    }
}

impl<T: AutoMock + ?Sized> AutoMock for Arc<T> {
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        let address = Arc::as_ptr(self) as *const () as usize;
        if cx.enter(address) {
            (**self).auto_mock_with(cx);
        }
    }
}

impl<T: AutoMock + ?Sized> AutoMock for Box<T> {
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        (**self).auto_mock_with(cx);
    }
}

impl<T: AutoMock> AutoMock for Option<T> {
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        if let Some(inner) = self {
            inner.auto_mock_with(cx);
        }
    }
}

impl<T: AutoMock> AutoMock for Vec<T> {
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        for item in self {
            item.auto_mock_with(cx);
        }
    }
}

impl<T: AutoMock + ?Sized> AutoMock for parking_lot::Mutex<T> {
    fn auto_mock_with(&self, cx: &mut AutoMockContext) {
        self.lock().auto_mock_with(cx);
    }
}

/// Implement [`AutoMock`] for a struct by walking the listed fields.
///
/// ```
/// use mimic_mock::{auto_mock, impl_auto_mock, FnSlot};
///
/// struct Advanced {
///     log2: FnSlot<(f64,), f64>,
/// }
///
/// struct Calc {
///     sum: FnSlot<(i64, i64), i64>,
///     advanced: Advanced,
/// }
///
/// impl_auto_mock!(Advanced { log2 });
/// impl_auto_mock!(Calc { sum, advanced });
///
/// let calc = Calc {
///     sum: FnSlot::new("sum", |(a, b): (i64, i64)| Ok(a + b)),
///     advanced: Advanced { log2: FnSlot::new("log2", |(x,): (f64,)| Ok(x.log2())) },
/// };
/// assert_eq!(auto_mock(&calc).len(), 2);
/// assert_eq!(calc.sum.call_infallible((1, 2)), 0);
/// ```
#[macro_export]
macro_rules! impl_auto_mock {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::auto::AutoMock for $ty {
            fn auto_mock_with(&self, cx: &mut $crate::auto::AutoMockContext) {
                $( $crate::auto::AutoMock::auto_mock_with(&self.$field, cx); )*
            }
        }
    };
}
