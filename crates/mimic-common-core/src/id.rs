//! Strongly-typed identifiers.
//!
//! Ids are allocated from per-type process-wide counters, so the numeric
//! order of two ids of the same type is their creation order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A strongly-typed ID wrapper.
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("A process-unique identifier with prefix '", $prefix, "_'.")]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Allocate the next ID.
            pub fn next() -> Self {
                static NEXT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
                Self(NEXT.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
            }

            /// Parse from string (with or without prefix).
            pub fn parse(s: &str) -> Result<Self, IdParseError> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                s.parse::<u64>()
                    .map(Self)
                    .map_err(|_| IdParseError::InvalidFormat)
            }

            /// Get the raw counter value.
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

/// Error parsing an ID.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdParseError {
    /// The ID format is invalid.
    #[error("invalid ID format")]
    InvalidFormat,
}

define_id!(MockId, "mock");
define_id!(TimerId, "timer");
