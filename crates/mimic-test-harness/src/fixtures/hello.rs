//! A controller/service pair wired by constructor injection.

use mimic_common_core::Result;
use mimic_mock::{impl_auto_mock, FnSlot, MockRegistry};
use std::sync::Arc;

/// Name the service is provided under in a [`MockRegistry`].
pub const APP_SERVICE: &str = "AppService";

pub struct AppService {
    pub get_hello: FnSlot<(), String>,
}

impl_auto_mock!(AppService { get_hello });

impl AppService {
    pub fn new() -> Self {
        Self {
            get_hello: FnSlot::new("app_service.get_hello", |_: ()| Ok("Hello, World!".to_string())),
        }
    }

    pub fn get_hello(&self) -> String {
        self.get_hello.call_infallible(())
    }
}

impl Default for AppService {
    fn default() -> Self {
        Self::new()
    }
}

pub struct HelloController {
    service: Arc<AppService>,
}

impl HelloController {
    pub fn new(service: Arc<AppService>) -> Self {
        Self { service }
    }

    /// Build a controller around the service provided under [`APP_SERVICE`].
    pub fn from_registry(registry: &MockRegistry) -> Result<Self> {
        Ok(Self::new(registry.resolve::<AppService>(APP_SERVICE)?))
    }

    pub fn get_hello(&self) -> String {
        self.service.get_hello()
    }
}
