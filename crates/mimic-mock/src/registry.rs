//! Mock registry and dependency provision.
//!
//! A [`MockRegistry`] tracks the mocks a test creates so they can be cleared,
//! reset or restored in one sweep, and holds named dependencies that a test
//! swaps in for a component's collaborators.

use mimic_common_core::{Error, MockId, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::async_mock::AsyncMockFn;
use crate::mock_fn::MockFn;
use crate::slot::Spy;

/// Bulk operations every kind of mock supports.
pub trait MockControl: Send + Sync {
    fn id(&self) -> MockId;

    fn name(&self) -> &str;

    fn call_count(&self) -> usize;

    /// Forget recorded calls.
    fn clear(&self);

    /// Forget recorded calls and configured behaviors.
    fn reset(&self);

    /// Reset and, for a spy, put the original function back.
    ///
    /// A bare mock has nothing to put back, so this only resets it.
    fn restore(&self) -> Result<()> {
        self.reset();
        Ok(())
    }
}

impl<A, T, E> MockControl for MockFn<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn id(&self) -> MockId {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn call_count(&self) -> usize {
        (**self).call_count()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn reset(&self) {
        (**self).reset()
    }
}

impl<A, T, E> MockControl for AsyncMockFn<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn id(&self) -> MockId {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn call_count(&self) -> usize {
        (**self).call_count()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn reset(&self) {
        (**self).reset()
    }
}

impl<M: MockControl> MockControl for Spy<M> {
    fn id(&self) -> MockId {
        self.mock().id()
    }

    fn name(&self) -> &str {
        self.mock().name()
    }

    fn call_count(&self) -> usize {
        self.mock().call_count()
    }

    fn clear(&self) {
        self.mock().clear()
    }

    fn reset(&self) {
        self.mock().reset()
    }

    fn restore(&self) -> Result<()> {
        Spy::restore(self)
    }
}

impl<M: MockControl + ?Sized> MockControl for Arc<M> {
    fn id(&self) -> MockId {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn call_count(&self) -> usize {
        (**self).call_count()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn reset(&self) {
        (**self).reset()
    }

    fn restore(&self) -> Result<()> {
        (**self).restore()
    }
}

/// Tracks mocks for bulk cleanup and provides named dependencies.
#[derive(Default)]
pub struct MockRegistry {
    mocks: Mutex<Vec<Arc<dyn MockControl>>>,
    dependencies: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a mock and hand it back.
    pub fn track<M>(&self, mock: M) -> M
    where
        M: MockControl + Clone + 'static,
    {
        tracing::trace!(mock = %mock.name(), id = %mock.id(), "tracking mock");
        self.mocks.lock().push(Arc::new(mock.clone()));
        mock
    }

    /// Track mocks produced elsewhere, such as by auto-mocking.
    pub fn track_all(&self, mocks: impl IntoIterator<Item = Arc<dyn MockControl>>) {
        self.mocks.lock().extend(mocks);
    }

    /// Number of tracked mocks.
    pub fn len(&self) -> usize {
        self.mocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.lock().is_empty()
    }

    fn find(&self, id: MockId) -> Result<Arc<dyn MockControl>> {
        self.mocks
            .lock()
            .iter()
            .find(|m| m.id() == id)
            .cloned()
            .ok_or(Error::UnknownMock { id })
    }

    /// Clear the history of one tracked mock.
    pub fn clear(&self, id: MockId) -> Result<()> {
        self.find(id)?.clear();
        Ok(())
    }

    /// Reset one tracked mock.
    pub fn reset(&self, id: MockId) -> Result<()> {
        self.find(id)?.reset();
        Ok(())
    }

    /// Call count of one tracked mock.
    pub fn call_count(&self, id: MockId) -> Result<usize> {
        Ok(self.find(id)?.call_count())
    }

    /// Clear the history of every tracked mock.
    pub fn clear_all(&self) {
        let mocks = self.snapshot();
        for mock in &mocks {
            mock.clear();
        }
        tracing::debug!(count = mocks.len(), "cleared all mocks");
    }

    /// Reset every tracked mock.
    pub fn reset_all(&self) {
        let mocks = self.snapshot();
        for mock in &mocks {
            mock.reset();
        }
        tracing::debug!(count = mocks.len(), "reset all mocks");
    }

    /// Restore every tracked mock and stop tracking them.
    ///
    /// Spies restored earlier by hand are skipped; any other failure is
    /// returned after every mock has been attempted.
    pub fn restore_all(&self) -> Result<()> {
        let mocks = std::mem::take(&mut *self.mocks.lock());
        let mut first_error = None;
        for mock in &mocks {
            match mock.restore() {
                Ok(()) | Err(Error::MockRestored { .. }) => {}
                Err(e) => {
                    tracing::warn!(mock = %mock.name(), error = %e, "failed to restore mock");
                    first_error.get_or_insert(e);
                }
            }
        }
        tracing::debug!(count = mocks.len(), "restored all mocks");
        first_error.map_or(Ok(()), Err)
    }

    // Operate on a copy so mocks are never touched with the registry locked.
    fn snapshot(&self) -> Vec<Arc<dyn MockControl>> {
        self.mocks.lock().clone()
    }

    /// Provide a dependency under a logical name, replacing any previous one.
    pub fn provide<T>(&self, name: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.provide_shared(name, Arc::new(value));
    }

    /// Provide an already shared dependency.
    pub fn provide_shared<T>(&self, name: impl Into<String>, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(dependency = %name, ty = std::any::type_name::<T>(), "dependency provided");
        self.dependencies.lock().insert(name, value);
    }

    /// Resolve a dependency by name.
    pub fn resolve<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let value = self
            .dependencies
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_dependency(name))?;
        value.downcast::<T>().map_err(|_| Error::DependencyType {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Whether a dependency is provided under `name`.
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.lock().contains_key(name)
    }

    /// Remove a dependency, reporting whether one was present.
    pub fn remove(&self, name: &str) -> bool {
        self.dependencies.lock().remove(name).is_some()
    }

    pub fn clear_dependencies(&self) {
        let mut dependencies = self.dependencies.lock();
        let count = dependencies.len();
        dependencies.clear();
        tracing::debug!(count, "cleared all dependencies");
    }
}

impl std::fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRegistry")
            .field("mocks", &self.mocks.lock().len())
            .field("dependencies", &self.dependencies.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::FnSlot;

    #[test]
    fn test_clear_all_keeps_behaviors() {
        let registry = MockRegistry::new();
        let mock: MockFn<(), u8> = registry.track(MockFn::named("m"));
        mock.return_value(9);
        mock.call_infallible(());

        registry.clear_all();
        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.call_infallible(()), 9);
    }

    #[test]
    fn test_reset_all_drops_behaviors() {
        let registry = MockRegistry::new();
        let mock: MockFn<(), u8> = registry.track(MockFn::named("m"));
        mock.return_value(9);

        registry.reset_all();
        assert_eq!(mock.call_infallible(()), 0);
    }

    #[test]
    fn test_restore_all_detaches_spies() {
        let registry = MockRegistry::new();
        let slot: FnSlot<(i32,), i32> = FnSlot::new("double", |(x,): (i32,)| Ok(x * 2));
        let spy = registry.track(slot.spy());
        spy.return_value(0);

        registry.restore_all().unwrap();
        assert!(!slot.is_mocked());
        assert_eq!(slot.call_infallible((4,)), 8);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_restore_all_skips_already_restored() {
        let registry = MockRegistry::new();
        let slot: FnSlot<(), ()> = FnSlot::new("noop", |_| Ok(()));
        let spy = registry.track(slot.spy());
        spy.restore().unwrap();

        assert!(registry.restore_all().is_ok());
    }

    #[test]
    fn test_unknown_mock_id() {
        let registry = MockRegistry::new();
        let stray: MockFn<(), ()> = MockFn::new();

        let err = registry.reset(stray.id()).unwrap_err();
        assert_eq!(err, Error::UnknownMock { id: stray.id() });
    }

    #[test]
    fn test_per_id_operations() {
        let registry = MockRegistry::new();
        let mock: MockFn<(), ()> = registry.track(MockFn::new());
        mock.call_infallible(());
        assert_eq!(registry.call_count(mock.id()).unwrap(), 1);

        registry.clear(mock.id()).unwrap();
        assert_eq!(registry.call_count(mock.id()).unwrap(), 0);
    }

    #[test]
    fn test_provide_and_resolve() {
        let registry = MockRegistry::new();
        registry.provide("greeting", String::from("hi"));

        assert_eq!(*registry.resolve::<String>("greeting").unwrap(), "hi");
        assert!(matches!(
            registry.resolve::<u32>("greeting"),
            Err(Error::DependencyType { .. })
        ));
        assert_eq!(
            registry.resolve::<String>("missing").unwrap_err(),
            Error::UnknownDependency { name: "missing".into() }
        );
    }

    #[test]
    fn test_resolved_dependency_is_shared() {
        let registry = MockRegistry::new();
        let slot: Arc<FnSlot<(), u8>> = Arc::new(FnSlot::new("one", |_| Ok(1)));
        registry.provide_shared("one", Arc::clone(&slot));

        let resolved = registry.resolve::<FnSlot<(), u8>>("one").unwrap();
        let spy = slot.spy();
        spy.return_value(7);
        assert_eq!(resolved.call_infallible(()), 7);
    }

    #[test]
    fn test_provide_replaces() {
        let registry = MockRegistry::new();
        registry.provide("n", 1u32);
        registry.provide("n", 2u32);
        assert_eq!(*registry.resolve::<u32>("n").unwrap(), 2);

        assert!(registry.remove("n"));
        assert!(!registry.has_dependency("n"));
    }
}
