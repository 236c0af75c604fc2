// src/config/loader.rs
//! Layered configuration loader: defaults, then TOML files, then environment

use crate::config::{constants::paths, PipelineConfig};
use crate::error::EmgError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for EmgError {
    fn from(err: ConfigError) -> Self {
        EmgError::Configuration {
            component: "config".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Merges configuration layers into a validated [`PipelineConfig`]
///
/// Files later in the path list override earlier ones. Environment
/// variables named `<prefix><SECTION>__<KEY>` override individual keys, e.g.
/// `EMG_THRESHOLD__METHOD=percentile`.
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Loader over the conventional config file locations
    pub fn new() -> Self {
        Self::with_paths(vec![
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ])
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: Some(paths::ENV_PREFIX.to_string()),
        }
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Ignore the environment entirely
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Configured file paths in precedence order
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load and validate the merged configuration
    pub fn load(&self) -> Result<PipelineConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        config.validate().map_err(ConfigError::ValidationError)?;

        info!(
            sampling_rate_hz = config.sampling_rate_hz,
            frame = config.features.frame,
            step = config.features.step,
            "Pipeline configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a single file on top of the defaults
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut merged = Self::default_value()?;
        Self::merge_toml_values(&mut merged, Self::load_config_file(path)?);

        let config: PipelineConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;
        config.validate().map_err(ConfigError::ValidationError)
    }

    /// Write `config` as pretty TOML
    pub fn export_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs(&self) -> Result<PipelineConfig, ConfigError> {
        let mut merged_config = Self::default_value()?;

        for config_path in &self.config_paths {
            match Self::load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "Merging configuration file");
                    Self::merge_toml_values(&mut merged_config, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        if let Some(ref prefix) = self.env_prefix {
            Self::apply_environment_overrides(&mut merged_config, prefix);
        }

        merged_config
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))
    }

    fn default_value() -> Result<toml::Value, ConfigError> {
        toml::Value::try_from(PipelineConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn load_config_file<P: AsRef<Path>>(path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }

    fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
                for (key, value) in overlay_table {
                    if let Some(base_value) = base_table.get_mut(&key) {
                        Self::merge_toml_values(base_value, value);
                    } else {
                        base_table.insert(key, value);
                    }
                }
            }
            (base_value, overlay_value) => {
                *base_value = overlay_value;
            }
        }
    }

    fn apply_environment_overrides(config: &mut toml::Value, prefix: &str) {
        for (key, value) in std::env::vars() {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };
            let config_key = stripped.to_lowercase().replace("__", ".");
            debug!(key = %config_key, "Applying environment override");
            Self::set_nested_value(config, &config_key, Self::parse_env_value(&value));
        }
    }

    fn parse_env_value(value: &str) -> toml::Value {
        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn set_nested_value(config: &mut toml::Value, path: &str, value: toml::Value) {
        let parts: Vec<&str> = path.split('.').collect();
        let mut current = config;

        for (i, part) in parts.iter().enumerate() {
            let toml::Value::Table(table) = current else {
                return;
            };
            if i == parts.len() - 1 {
                table.insert(part.to_string(), value);
                return;
            }
            current = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
