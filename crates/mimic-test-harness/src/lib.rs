//! Mimic Test Harness
//!
//! Shared setup for tests that use Mimic: a tracing subscriber that writes
//! through the test capture, scoped [`TestContext`]s that clean their mocks
//! and timers up when dropped, and the demo collaborators in [`fixtures`].

pub mod context;
pub mod fixtures;

pub use context::TestContext;

use mimic_common_config::Environment;
use mimic_common_log::{LogConfig, LogLevel};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Ids of test contexts that have not been dropped yet.
static ACTIVE_CONTEXTS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Initialize the test harness: env files first, then tracing.
///
/// Safe to call from every test; only the first call does any work.
/// `MIMIC_LOG_*` variables, including ones from `.env`, shape the output.
pub fn init() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let dotenv = Environment::load_dotenv();

        let config = LogConfig {
            level: LogLevel::Debug,
            source_location: true,
            ..LogConfig::default()
        }
        .with_vars(Environment::get);
        // Another subscriber may already own the process.
        let _ = mimic_common_log::init_test(config);

        match dotenv {
            Ok(files) if !files.is_empty() => tracing::debug!(?files, "loaded env files"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "env file not loaded"),
        }
    });

    Lazy::force(&INIT);
}

/// Generate a unique test id.
pub fn unique_test_id() -> String {
    let count = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("test_{}_{}", timestamp, count)
}

pub(crate) fn register_context(id: &str) {
    ACTIVE_CONTEXTS.lock().insert(id.to_string());
}

pub(crate) fn deregister_context(id: &str) {
    ACTIVE_CONTEXTS.lock().remove(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_differ() {
        assert_ne!(unique_test_id(), unique_test_id());
    }

    #[test]
    fn test_init_twice() {
        init();
        init();
    }
}
