//! Environment variable handling.

use std::env;
use std::path::Path;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("failed to load {file}: {source}")]
    DotenvError {
        file: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Environment variable names.
pub mod vars {
    // Configuration
    pub const MIMIC_CONFIG_DIR: &str = "MIMIC_CONFIG_DIR";
    pub const MIMIC_ENV: &str = "MIMIC_ENV";

    // Overrides
    pub const MIMIC_FAKE_TIMERS: &str = "MIMIC_FAKE_TIMERS";
    pub const MIMIC_TIMER_LOOP_LIMIT: &str = "MIMIC_TIMER_LOOP_LIMIT";
    pub const MIMIC_CLEAR_MOCKS: &str = "MIMIC_CLEAR_MOCKS";
    pub const MIMIC_RESET_MOCKS: &str = "MIMIC_RESET_MOCKS";
    pub const MIMIC_RESTORE_MOCKS: &str = "MIMIC_RESTORE_MOCKS";

    // Development
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Process environment access.
pub struct Environment;

impl Environment {
    /// Load `.env`, `.env.local` and `.env.{MIMIC_ENV}` from the working
    /// directory. Returns the files that were found.
    pub fn load_dotenv() -> Result<Vec<String>, EnvError> {
        let cwd = env::current_dir().unwrap_or_default();
        Self::load_dotenv_in(&cwd)
    }

    /// Load the env files found in `dir`.
    ///
    /// Missing files are skipped; a malformed one is an error. Variables
    /// already set in the process win over file contents.
    pub fn load_dotenv_in(dir: &Path) -> Result<Vec<String>, EnvError> {
        let mut files = vec![".env".to_string(), ".env.local".to_string()];
        if let Ok(name) = env::var(vars::MIMIC_ENV) {
            files.push(format!(".env.{}", name));
        }

        let mut loaded = Vec::new();
        for file in files {
            match dotenvy::from_path(dir.join(&file)) {
                Ok(()) => loaded.push(file),
                Err(e) if e.not_found() => {}
                Err(source) => return Err(EnvError::DotenvError { file, source }),
            }
        }
        Ok(loaded)
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Parse a boolean the way every `MIMIC_*` switch is parsed.
    pub fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}
