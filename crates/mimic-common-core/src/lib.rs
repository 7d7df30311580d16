//! Mimic common core types and utilities.
//!
//! Shared by the mock runtime, the clock and the test harness: the error
//! taxonomy every crate reports usage errors through, and the strongly-typed
//! identifiers handed out for mocks and timers.

pub mod error;
pub mod id;

pub use error::{Error, Result};
pub use id::{IdParseError, MockId, TimerId};
