//! `nosqldb` configuration.
//!
//! Provides configuration file support via `nosqldb.toml`, environment
//! variables, and defaults.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`NOSQLDB_*`)
//! 2. Configuration file (`nosqldb.toml`)
//! 3. Default values

use crate::storage::format::{INDEX_ENTRY_SIZE, POINTER_SIZE};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Storage configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per collection.
    ///
    /// Defaults to `<user-home>/nosqldbData`, matching the original
    /// implementation's `GetCollectionsHomePath`.
    pub data_home: String,
    /// Width in bytes of one index-file slot. Informational: the on-disk
    /// format is fixed at compile time by [`crate::storage::format`]; this
    /// field exists so a config file documents the format a given data
    /// directory was written with, and [`NosqlConfig::validate`] rejects a
    /// mismatch before it can corrupt anything.
    pub index_entry_size: usize,
    /// Width in bytes of an attribute node's `next` pointer field. See
    /// `index_entry_size`.
    pub pointer_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_home: default_data_home(),
            index_entry_size: INDEX_ENTRY_SIZE,
            pointer_size: POINTER_SIZE,
        }
    }
}

fn default_data_home() -> String {
    dirs_home()
        .map(|home| home.join("nosqldbData").display().to_string())
        .unwrap_or_else(|| "./nosqldbData".to_string())
}

fn dirs_home() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address.
    pub host: String,
    /// Port number.
    pub port: u16,
    /// Maximum HTTP request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9999,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main `nosqldb` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NosqlConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl NosqlConfig {
    /// Loads configuration from `nosqldb.toml` (if present) plus environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("nosqldb.toml")
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
            .merge(Env::prefixed("NOSQLDB_").split("_").lowercase(false));

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
        if self.storage.data_home.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "storage.data_home".to_string(),
                message: "must not be empty".to_string(),
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

        if self.storage.index_entry_size != INDEX_ENTRY_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "storage.index_entry_size".to_string(),
                message: format!(
                    "this build only understands index entries of {INDEX_ENTRY_SIZE} bytes, got {}",
                    self.storage.index_entry_size
                ),
            });
        }
        if self.storage.pointer_size != POINTER_SIZE {
            return Err(ConfigError::InvalidValue {
                key: "storage.pointer_size".to_string(),
                message: format!(
                    "this build only understands {POINTER_SIZE}-byte attribute pointers, got {}",
                    self.storage.pointer_size
                ),
            });
        }

        Ok(())
    }
}
