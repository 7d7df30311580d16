//! Configuration types.

use serde::{Deserialize, Serialize};

/// Default number of timers `run_all` fires before giving up.
pub const DEFAULT_LOOP_LIMIT: usize = 100_000;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    /// What happens to tracked mocks when a test context ends.
    pub mocks: MockConfig,
    /// Timer mode and virtual clock settings.
    pub timers: TimerConfig,
}

/// Mock lifecycle configuration.
///
/// The three switches are cumulative: restoring also resets, resetting also
/// clears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Clear call history of every tracked mock after each test.
    pub clear_mocks: bool,
    /// Reset behaviors of every tracked mock after each test.
    pub reset_mocks: bool,
    /// Restore every tracked spy after each test.
    pub restore_mocks: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            clear_mocks: true,
            reset_mocks: false,
            restore_mocks: false,
        }
    }
}

impl MockConfig {
    /// The strongest cleanup requested.
    pub fn cleanup(&self) -> MockCleanup {
        if self.restore_mocks {
            MockCleanup::Restore
        } else if self.reset_mocks {
            MockCleanup::Reset
        } else if self.clear_mocks {
            MockCleanup::Clear
        } else {
            MockCleanup::None
        }
    }
}

/// Cleanup applied to tracked mocks at the end of a test context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCleanup {
    None,
    Clear,
    Reset,
    Restore,
}

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Start every test context with fake timers enabled.
    pub fake_by_default: bool,
    /// Virtual time (ms) a freshly enabled virtual clock starts at.
    pub start_ms: u64,
    /// Maximum timers fired by one `run_all` before it reports a loop.
    pub loop_limit: usize,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            fake_by_default: false,
            start_ms: 0,
            loop_limit: DEFAULT_LOOP_LIMIT,
        }
    }
}
