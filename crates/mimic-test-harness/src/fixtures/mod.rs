//! Demo collaborators used by the chapter tests.
//!
//! Each collaborator exposes its replaceable members as slots, the way
//! production code opts into being spied on.

pub mod calc;
pub mod counter;
pub mod getter;
pub mod hello;
pub mod logic;
pub mod sleep;

pub use calc::{Advanced, Calc};
pub use counter::Counter;
pub use getter::{GetError, GoogleGetter, Response};
pub use hello::{AppService, HelloController, APP_SERVICE};
pub use logic::{Logic, LogicError, Op};
pub use sleep::sleep;
