//! Clock abstraction for Mimic.
//!
//! Code that schedules time-based work takes an `Arc<dyn Clock>`. Production
//! wiring passes a [`RealClock`]; tests pass a [`Timers`] controller and move
//! virtual time forward by hand.
//!
//! ```
//! use mimic_clock::{Clock, VirtualClock};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = VirtualClock::new(0);
//! let ticks = Arc::new(AtomicU32::new(0));
//! let seen = Arc::clone(&ticks);
//! clock
//!     .schedule_repeating(Box::new(move || { seen.fetch_add(1, Ordering::SeqCst); }), Duration::from_secs(1))
//!     .unwrap();
//!
//! clock.advance_by(Duration::from_secs(60 * 60));
//! assert_eq!(ticks.load(Ordering::SeqCst), 3600);
//! ```

pub mod clock;
pub mod real;
pub mod timers;
pub mod virtual_clock;

pub use clock::{Clock, TimerCallback};
pub use real::RealClock;
pub use timers::Timers;
pub use virtual_clock::VirtualClock;

pub use mimic_common_core::TimerId;
