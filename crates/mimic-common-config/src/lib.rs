//! Configuration types for Mimic.
//!
//! This crate provides the configuration read from `.mimic/config.yaml`:
//! what happens to mocks at the end of a test context and how timers start.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
