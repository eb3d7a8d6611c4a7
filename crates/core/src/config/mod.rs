//! Configuration module for intellisense-check
//!
//! Configuration can be loaded from TOML files and/or environment variables.
//! Every field has a default, so an absent config file is valid.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use crate::model::ProviderTypeId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.intellisense-check/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".intellisense-check").join("config.toml"))
}

/// What a validation pass looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// File-context provider types to query (default: native project contexts)
    #[serde(default = "default_provider_types")]
    pub provider_types: Vec<ProviderTypeId>,

    /// Query scope relative to the workspace root; empty means the whole workspace
    #[serde(default = "default_scope")]
    pub scope: PathBuf,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            provider_types: default_provider_types(),
            scope: default_scope(),
        }
    }
}

/// Lifecycle of index watchers and validation passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Unsubscribe the previous index watcher when the active workspace changes.
    /// When false the old watcher stays registered and keeps firing.
    #[serde(default = "default_dispose_previous_watcher")]
    pub dispose_previous_watcher: bool,

    /// Cancel an in-flight pass when a new completion event arrives for the
    /// same workspace. When false overlapping passes run concurrently.
    #[serde(default = "default_cancel_in_flight")]
    pub cancel_in_flight: bool,

    /// Capacity of the channel feeding the main-context notice dispatcher
    #[serde(default = "default_notice_queue_size")]
    pub notice_queue_size: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            dispose_previous_watcher: default_dispose_previous_watcher(),
            cancel_in_flight: default_cancel_in_flight(),
            notice_queue_size: default_notice_queue_size(),
        }
    }
}

impl WatcherConfig {
    pub fn builder() -> WatcherConfigBuilder {
        WatcherConfigBuilder::default()
    }
}

/// Builder for WatcherConfig
#[derive(Debug, Default)]
pub struct WatcherConfigBuilder {
    config: WatcherConfig,
}

impl WatcherConfigBuilder {
    /// Unsubscribe replaced index watchers
    pub fn dispose_previous_watcher(mut self, dispose: bool) -> Self {
        self.config.dispose_previous_watcher = dispose;
        self
    }

    /// Cancel in-flight passes on a new completion event
    pub fn cancel_in_flight(mut self, cancel: bool) -> Self {
        self.config.cancel_in_flight = cancel;
        self
    }

    /// Set notice channel capacity
    pub fn notice_queue_size(mut self, size: usize) -> Self {
        self.config.notice_queue_size = size;
        self
    }

    pub fn build(self) -> WatcherConfig {
        self.config
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.validator.provider_types.is_empty() {
            return Err(Error::config(
                "validator.provider_types must name at least one provider type".to_string(),
            ));
        }

        if self.validator.scope.is_absolute() {
            return Err(Error::config(format!(
                "validator.scope must be relative to the workspace root, got {}",
                self.validator.scope.display()
            )));
        }

        if self.watcher.notice_queue_size == 0 {
            return Err(Error::config(
                "watcher.notice_queue_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, toml_string)
            .map_err(|e| Error::config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
