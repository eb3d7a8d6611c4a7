//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `INTELLISENSE_CHECK_` and use double
    /// underscores for nested values. For example:
    /// - `INTELLISENSE_CHECK_WATCHER__CANCEL_IN_FLIGHT=true`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // The config crate does not apply serde defaults for missing sections
        let builder = set_config_default(
            builder,
            "validator.provider_types",
            default_provider_types()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>(),
        )?;
        let builder = set_config_default(builder, "validator.scope", "")?;
        let builder = set_config_default(
            builder,
            "watcher.dispose_previous_watcher",
            default_dispose_previous_watcher(),
        )?;
        let builder = set_config_default(
            builder,
            "watcher.cancel_in_flight",
            default_cancel_in_flight(),
        )?;
        let mut builder = set_config_default(
            builder,
            "watcher.notice_queue_size",
            default_notice_queue_size() as i64,
        )?;

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        let config: Config = config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.intellisense-check/config.toml or custom --config path)
    /// 3. Environment variables (INTELLISENSE_CHECK_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
