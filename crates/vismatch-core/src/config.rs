//! Vismatch configuration module.
//!
//! Provides configuration file support via `vismatch.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`VISMATCH_*`)
//! 2. Configuration file (`vismatch.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::filter::{DEFAULT_TOP_K, MAX_TOP_K};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Search configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Top-K used when a request does not specify one.
    pub default_top_k: usize,
    /// Cap applied to request top-K values.
    pub max_top_k: usize,
    /// Similarity threshold used when a request does not specify one.
    pub default_threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            max_top_k: MAX_TOP_K,
            default_threshold: 0.0,
        }
    }
}

/// Catalog artifact configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding the precomputed catalog artifacts.
    pub data_dir: String,
    /// Product metadata file name within `data_dir`.
    pub products_file: String,
    /// Image index file name within `data_dir`.
    pub index_file: String,
    /// Embedding table file name within `data_dir`.
    pub vectors_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: "./catalog".to_string(),
            products_file: crate::catalog::PRODUCTS_FILE.to_string(),
            index_file: crate::catalog::IMAGE_INDEX_FILE.to_string(),
            vectors_file: crate::catalog::EMBEDDINGS_FILE.to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main Vismatch configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatcherConfig {
    /// Search configuration.
    pub search: SearchConfig,
    /// Catalog configuration.
    pub catalog: CatalogConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl MatcherConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("vismatch.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VISMATCH_").split("_").lowercase(false));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_top_k == 0 || self.search.max_top_k > MAX_TOP_K {
            return Err(ConfigError::InvalidValue {
                key: "search.max_top_k".to_string(),
                message: format!(
                    "value {} is out of range [1, {MAX_TOP_K}]",
                    self.search.max_top_k
                ),
            });
        }

        if self.search.default_top_k > self.search.max_top_k {
            return Err(ConfigError::InvalidValue {
                key: "search.default_top_k".to_string(),
                message: format!(
                    "value {} exceeds max_top_k {}",
                    self.search.default_top_k, self.search.max_top_k
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.search.default_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "search.default_threshold".to_string(),
                message: format!(
                    "value {} is out of range [0.0, 1.0]",
                    self.search.default_threshold
                ),
            });
        }

        if self.catalog.data_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "catalog.data_dir".to_string(),
                message: "value must not be empty".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
