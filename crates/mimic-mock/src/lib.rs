//! Mock functions, spies and auto-mocking.
//!
//! [`MockFn`] and [`AsyncMockFn`] record every call and play back configured
//! behaviors: one-shot behaviors first, in the order they were installed, then
//! the persistent behavior, then the fallback (`T::default()` for a bare mock,
//! the original function for a spy).
//!
//! Collaborators expose replaceable members as [`FnSlot`]s so tests can spy on
//! them and restore them, and [`auto_mock`] replaces every slot of a
//! collaborator at once. [`MockRegistry`] tracks mocks for bulk cleanup and
//! hands out named dependencies.
//!
//! ```
//! use mimic_mock::MockFn;
//!
//! let sum = MockFn::from_fn(|(a, b): (i64, i64)| Ok::<_, std::convert::Infallible>(a + b));
//! sum.return_value_once(-1);
//!
//! assert_eq!(sum.call_infallible((10, 20)), -1);
//! assert_eq!(sum.call_infallible((10, 20)), 30);
//! assert_eq!(sum.call_count(), 2);
//! ```

mod state;

pub mod async_mock;
pub mod auto;
pub mod behavior;
pub mod mock_fn;
pub mod recorder;
pub mod registry;
pub mod slot;

pub use async_mock::AsyncMockFn;
pub use auto::{auto_mock, AutoMock, AutoMockContext};
pub use behavior::Behavior;
pub use mock_fn::MockFn;
pub use recorder::{InvocationRecord, Outcome};
pub use registry::{MockControl, MockRegistry};
pub use slot::{AsyncFnSlot, FnSlot, Spy};
pub use state::MockCore;

pub use mimic_common_core::{Error, MockId, Result};
