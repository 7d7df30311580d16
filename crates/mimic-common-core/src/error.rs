//! Error types for Mimic.
//!
//! Only usage errors live here. A mock configured to fail is not an error of
//! the runtime: its failure is the mocked function's own `Err` value.

use thiserror::Error;

use crate::id::MockId;

/// The main error type for Mimic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A mock id was looked up that the registry never tracked.
    #[error("unknown mock: {id}")]
    UnknownMock {
        /// The id that was not found.
        id: MockId,
    },

    /// A spy was used after its slot had already been restored.
    #[error("mock '{name}' has already been restored")]
    MockRestored {
        /// Name of the restored mock.
        name: String,
    },

    /// No dependency was provided under the requested name.
    #[error("no dependency registered under '{name}'")]
    UnknownDependency {
        /// Logical dependency name.
        name: String,
    },

    /// A dependency exists but holds a different type.
    #[error("dependency '{name}' is not a {expected}")]
    DependencyType {
        /// Logical dependency name.
        name: String,
        /// Type name that was requested.
        expected: &'static str,
    },

    /// A virtual-time operation was requested while real timers are active.
    #[error("fake timers are not enabled; call use_fake_timers() first")]
    NotFakeTimers,

    /// Real timers need a running tokio runtime.
    #[error("no tokio runtime is available for real timers")]
    NoRuntime,

    /// Running timers kept scheduling new ones past the loop limit.
    #[error("ran {limit} timers and there are still more; assuming an infinite loop")]
    TimerLoopLimit {
        /// The configured limit.
        limit: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a restored-mock error.
    pub fn restored(name: impl Into<String>) -> Self {
        Self::MockRestored { name: name.into() }
    }

    /// Create an unknown-dependency error.
    pub fn unknown_dependency(name: impl Into<String>) -> Self {
        Self::UnknownDependency { name: name.into() }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is a misuse of the runtime by test code.
    ///
    /// Everything except configuration errors is a usage error.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result type alias using Mimic's Error.
pub type Result<T> = std::result::Result<T, Error>;
