use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `ACCESS_REVIEW__LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "ACCESS_REVIEW";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessReviewConfig {
    /// Namespace used when the caller does not supply one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// YAML policy loaded into the rule authorizer
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
    /// Caller-side bound when waiting on a review result
    #[serde(default = "default_await_timeout_ms")]
    pub await_timeout_ms: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Structured JSON output instead of human-readable lines
    #[serde(default)]
    pub json: bool,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_await_timeout_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AccessReviewConfig {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            policy_file: None,
            await_timeout_ms: default_await_timeout_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AccessReviewConfig {
    /// Load from an optional YAML file, then apply environment overrides.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: AccessReviewConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn await_timeout(&self) -> Duration {
        Duration::from_millis(self.await_timeout_ms)
    }
}
