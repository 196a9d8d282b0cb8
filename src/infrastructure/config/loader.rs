use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{Config, StorageBackend};

/// Project-local configuration directory
pub const CONFIG_DIR: &str = ".scanstore";

/// Environment variable prefix; `__` separates nested keys
pub const ENV_PREFIX: &str = "SCANSTORE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Storage key cannot be empty")]
    EmptyStorageKey,

    #[error("Storage path cannot be empty for the {0} backend")]
    EmptyStoragePath(&'static str),

    #[error("Backend base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .scanstore/config.yaml (project config, created by init)
    /// 3. .scanstore/local.yaml (local overrides, optional)
    /// 4. Environment variables (SCANSTORE_* prefix)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; env vars still apply on top
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.storage.key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }

        if config.storage.backend != StorageBackend::Memory && config.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStoragePath(config.storage.backend.as_str()));
        }

        if config.backend.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        if config.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.backend.timeout_secs));
        }

        Ok(())
    }
}
