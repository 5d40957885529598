use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

const MAX_WORKERS_LIMIT: usize = 16;
const MAX_DEPTH_LIMIT: usize = 16;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_workers: {0}. Must be between 1 and 16")]
    InvalidMaxWorkers(usize),

    #[error("Invalid cache.max_entries: {0}. Must be at least 1")]
    InvalidCacheCapacity(u64),

    #[error("Invalid layout.max_ancestor_depth: {0}. Must be between 1 and 16")]
    InvalidAncestorDepth(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Tool path cannot be empty: {0}")]
    EmptyToolPath(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .smali2java/config.yaml (project config)
    /// 3. .smali2java/local.yaml (project local overrides, optional)
    /// 4. Environment variables (SMALI2JAVA_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".smali2java/config.yaml"))
            .merge(Yaml::file(".smali2java/local.yaml"))
            .merge(Env::prefixed("SMALI2JAVA_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.max_workers == 0 || config.max_workers > MAX_WORKERS_LIMIT {
            return Err(ConfigError::InvalidMaxWorkers(config.max_workers));
        }

        if config.cache.max_entries == 0 {
            return Err(ConfigError::InvalidCacheCapacity(config.cache.max_entries));
        }

        let depth = config.layout.max_ancestor_depth;
        if depth == 0 || depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::InvalidAncestorDepth(depth));
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

        let assembler = &config.tools.assembler;
        if assembler.jar.is_some() {
            if assembler.java_path.trim().is_empty() {
                return Err(ConfigError::EmptyToolPath("tools.assembler.java_path"));
            }
        } else if assembler.binary_path.trim().is_empty() {
            return Err(ConfigError::EmptyToolPath("tools.assembler.binary_path"));
        }

        if config.tools.decompiler.binary_path.trim().is_empty() {
            return Err(ConfigError::EmptyToolPath("tools.decompiler.binary_path"));
        }

        Ok(())
    }
}
