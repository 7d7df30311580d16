//! Scoped test contexts.
//!
//! A [`TestContext`] owns the mock registry and timer controller of one test.
//! Dropping it runs any registered cleanup handlers, applies the configured
//! mock cleanup and discards pending timers, virtual or real, so a test cannot
//! leak spies or scheduled callbacks into the next one.

use mimic_clock::{Clock, Timers};
use mimic_common_config::{ConfigLoader, Environment, MimicConfig, MockCleanup};
use mimic_common_core::{Error, Result};
use mimic_mock::{auto_mock, AutoMock, MockControl, MockRegistry};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// An isolated test context with its own registry, timers and temp directory.
pub struct TestContext {
    id: String,
    temp_dir: TempDir,
    config: MimicConfig,
    registry: Arc<MockRegistry>,
    timers: Arc<Timers>,
    cleanup_handlers: Vec<Box<dyn FnOnce() + Send>>,
}

impl TestContext {
    /// Create a context with the default configuration.
    ///
    /// # Panics
    ///
    /// If no temporary directory can be created.
    pub fn new() -> Self {
        Self::with_config(MimicConfig::default()).expect("Failed to create test context")
    }

    /// Create a context with an explicit configuration.
    pub fn with_config(config: MimicConfig) -> Result<Self> {
        let temp_dir = tempfile::tempdir().map_err(|e| Error::config(e.to_string()))?;
        Ok(Self::build(temp_dir, config))
    }

    /// Create a context whose project directory holds `.mimic/config.yaml`
    /// with the given contents, and load its configuration from there.
    ///
    /// `MIMIC_*` environment overrides apply on top of the file.
    pub fn with_config_file(yaml: &str) -> Result<Self> {
        Self::with_config_file_and_vars(yaml, Environment::get)
    }

    /// Like [`with_config_file`](Self::with_config_file), reading variables
    /// through `lookup` instead of the process environment.
    pub fn with_config_file_and_vars(
        yaml: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let temp_dir = tempfile::tempdir().map_err(|e| Error::config(e.to_string()))?;
        let loader = ConfigLoader::new(temp_dir.path());
        let path = loader.config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::config(e.to_string()))?;
        }
        std::fs::write(&path, yaml).map_err(|e| Error::config(e.to_string()))?;

        let config = loader
            .load_with(lookup)
            .map_err(|e| Error::config(e.to_string()))?;
        Ok(Self::build(temp_dir, config))
    }

    fn build(temp_dir: TempDir, config: MimicConfig) -> Self {
        crate::init();
        let id = crate::unique_test_id();
        crate::register_context(&id);
        tracing::debug!(context = %id, cleanup = ?config.mocks.cleanup(), "test context created");

        Self {
            id,
            temp_dir,
            timers: Arc::new(Timers::new(config.timers.clone())),
            registry: Arc::new(MockRegistry::new()),
            config,
            cleanup_handlers: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The project directory of this context.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &MimicConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }

    pub fn timers(&self) -> &Arc<Timers> {
        &self.timers
    }

    /// The timer controller as a clock to hand to code under test.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.timers.clone()
    }

    /// Track a mock for cleanup when the context ends.
    pub fn track<M>(&self, mock: M) -> M
    where
        M: MockControl + Clone + 'static,
    {
        self.registry.track(mock)
    }

    /// Auto-mock `root` and track every mock installed. Returns how many.
    pub fn auto_mock<T: AutoMock + ?Sized>(&self, root: &T) -> usize {
        let mocks = auto_mock(root);
        let count = mocks.len();
        self.registry.track_all(mocks);
        count
    }

    /// Register a cleanup handler, run when the context is dropped.
    pub fn on_cleanup<F: FnOnce() + Send + 'static>(&mut self, handler: F) {
        self.cleanup_handlers.push(Box::new(handler));
    }

    fn cleanup_mocks(&self) {
        match self.config.mocks.cleanup() {
            MockCleanup::None => {}
            MockCleanup::Clear => self.registry.clear_all(),
            MockCleanup::Reset => self.registry.reset_all(),
            MockCleanup::Restore => {
                if let Err(e) = self.registry.restore_all() {
                    tracing::warn!(context = %self.id, error = %e, "mock restore failed");
                }
            }
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        for handler in self.cleanup_handlers.drain(..) {
            handler();
        }
        self.cleanup_mocks();
        self.registry.clear_dependencies();
        if self.timers.is_fake() {
            self.timers.use_real_timers();
        } else {
            self.timers.cancel_real_timers();
        }
        crate::deregister_context(&self.id);
        tracing::debug!(context = %self.id, "test context dropped");
    }
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("timers", &self.timers)
            .finish()
    }
}
