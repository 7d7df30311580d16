//! Configuration file loading and parsing.

use crate::env::{vars, Environment};
use crate::types::MimicConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env reference pattern is valid"));

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("invalid value for {var}: {value}")]
    InvalidOverride { var: String, value: String },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(".mimic/config.yaml")
    }

    /// Load configuration from `.mimic/config.yaml`, then apply `MIMIC_*`
    /// environment overrides.
    pub fn load(&self) -> Result<MimicConfig, ConfigError> {
        self.load_with(Environment::get)
    }

    /// Like [`load`](Self::load), reading variables through `lookup` for both
    /// `${VAR}` expansion and overrides.
    pub fn load_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<MimicConfig, ConfigError> {
        let mut config = self.read(&lookup)?;
        apply_env_overrides(&mut config, &lookup)?;
        validate(&config)?;
        Ok(config)
    }

    /// Load the file alone, without environment overrides.
    pub fn load_file(&self) -> Result<MimicConfig, ConfigError> {
        let config = self.read(Environment::get)?;
        validate(&config)?;
        Ok(config)
    }

    fn read(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<MimicConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(MimicConfig::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let expanded = expand_env_vars(&contents, lookup)?;

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Save configuration to file.
    pub fn save(&self, config: &MimicConfig) -> Result<(), ConfigError> {
        let config_path = self.config_path();
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        let dir = Environment::get(vars::MIMIC_CONFIG_DIR)
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        Self::new(dir)
    }
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
pub fn expand_env_vars(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut result = content.to_string();

    for cap in ENV_REF.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        let value = match (lookup(var_name), cap.get(2)) {
            (Some(v), _) => v,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                return Err(ConfigError::EnvVarNotFound {
                    var: var_name.to_string(),
                })
            }
        };

        result = result.replace(full_match, &value);
    }

    Ok(result)
}

/// Apply `MIMIC_*` overrides on top of a loaded configuration.
pub fn apply_env_overrides(
    config: &mut MimicConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let flag = |var: &str| -> Result<Option<bool>, ConfigError> {
        lookup(var)
            .map(|value| {
                Environment::parse_bool(&value).ok_or(ConfigError::InvalidOverride {
                    var: var.to_string(),
                    value,
                })
            })
            .transpose()
    };

    if let Some(v) = flag(vars::MIMIC_FAKE_TIMERS)? {
        config.timers.fake_by_default = v;
    }
    if let Some(v) = flag(vars::MIMIC_CLEAR_MOCKS)? {
        config.mocks.clear_mocks = v;
    }
    if let Some(v) = flag(vars::MIMIC_RESET_MOCKS)? {
        config.mocks.reset_mocks = v;
    }
    if let Some(v) = flag(vars::MIMIC_RESTORE_MOCKS)? {
        config.mocks.restore_mocks = v;
    }
    if let Some(value) = lookup(vars::MIMIC_TIMER_LOOP_LIMIT) {
        config.timers.loop_limit = value.parse().map_err(|_| ConfigError::InvalidOverride {
            var: vars::MIMIC_TIMER_LOOP_LIMIT.to_string(),
            value,
        })?;
    }

    Ok(())
}

/// Validate configuration values.
pub fn validate(config: &MimicConfig) -> Result<(), ConfigError> {
    if config.timers.loop_limit == 0 {
        return Err(ConfigError::ValidationError {
            message: "timers.loop_limit must be greater than 0".to_string(),
        });
    }

    Ok(())
}
