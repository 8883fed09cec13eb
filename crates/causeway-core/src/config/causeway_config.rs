//! Top-level Causeway configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::defaults::{self, ENV_PREFIX};
use super::{MergeConfig, ObservabilityConfig, SelectorPolicy};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`CAUSEWAY_*`)
/// 2. Project config (`causeway.toml` in the given root)
/// 3. Compiled defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CausewayConfig {
    pub merge: MergeConfig,
    pub observability: ObservabilityConfig,
}

impl CausewayConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let project_config_path = root.join(defaults::DEFAULT_CONFIG_FILENAME);
        let mut config = if project_config_path.exists() {
            Self::from_file(&project_config_path)?
        } else {
            Self::default()
        };

        Self::apply_env_overrides(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a single TOML file. Missing keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &CausewayConfig) -> Result<(), ConfigError> {
        if config.merge.stall_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "merge.stall_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&config.observability.log_level.as_str()) {
            return Err(ConfigError::ValidationFailed {
                field: "observability.log_level".to_string(),
                message: format!("must be one of {LEVELS:?}"),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    /// Pattern: `CAUSEWAY_STALL_TIMEOUT_MS`, `CAUSEWAY_LOG_LEVEL`, etc.
    fn apply_env_overrides(config: &mut CausewayConfig) -> Result<(), ConfigError> {
        if let Some(v) = env_var("STALL_TIMEOUT_MS") {
            config.merge.stall_timeout_ms = parse_env("STALL_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = env_var("BLOCKED_REPORT_THRESHOLD_SECS") {
            config.merge.blocked_report_threshold_secs =
                parse_env("BLOCKED_REPORT_THRESHOLD_SECS", &v)?;
        }
        if let Some(v) = env_var("DEFAULT_SELECTOR") {
            config.merge.default_selector = parse_env::<SelectorPolicy>("DEFAULT_SELECTOR", &v)?;
        }
        if let Some(v) = env_var("LOG_LEVEL") {
            config.observability.log_level = v.to_lowercase();
        }
        if let Some(v) = env_var("JSON_LOGS") {
            config.observability.json_logs = parse_env("JSON_LOGS", &v)?;
        }
        Ok(())
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}")).ok()
}

fn parse_env<T>(suffix: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::ValidationFailed {
        field: format!("{ENV_PREFIX}{suffix}"),
        message: e.to_string(),
    })
}
