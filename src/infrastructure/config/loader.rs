//! Layered configuration loading: defaults, YAML files, then environment.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory searched for `config.yaml` and `local.yaml`.
pub const CONFIG_DIR: &str = ".iconesign";
/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "ICONESIGN_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} base_url cannot be empty")]
    EmptyBaseUrl(&'static str),

    #[error("Invalid polling interval: {0}ms. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("Invalid request timeout: {0}s. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid {0}: size ceiling cannot be 0")]
    ZeroCeiling(&'static str),

    #[error("Storage directory cannot be empty")]
    EmptyStorageDir,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .iconesign/config.yaml (project config)
    /// 3. .iconesign/local.yaml (local overrides, optional)
    /// 4. Environment variables (ICONESIGN_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new(CONFIG_DIR))
    }

    /// Same merge as [`ConfigLoader::load`], rooted at another directory.
    pub fn load_from_dir(dir: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.api.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl("api"));
        }
        if config.signing_api.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl("signing_api"));
        }
        if config.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.api.timeout_secs));
        }

        if config.polling.interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(config.polling.interval_ms));
        }

        if config.intake.upload_max_bytes == 0 {
            return Err(ConfigError::ZeroCeiling("intake.upload_max_bytes"));
        }
        if config.intake.batch_sign_max_bytes == 0 {
            return Err(ConfigError::ZeroCeiling("intake.batch_sign_max_bytes"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.storage.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStorageDir);
        }

        Ok(())
    }
}
