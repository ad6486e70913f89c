//! Configuration for the model manager

use crate::models::StructuralKeys;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Largest accepted broadcast buffer for model events
const MAX_EVENT_CAPACITY: usize = 4096;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// Values are present but not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Model manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Prefix for every model request (e.g. `http://localhost:4502`)
    pub api_host: Option<String>,

    /// Selector inserted before the extension (`page` → `page.model`)
    pub model_selector: String,

    /// Extension of model requests (`page.model` → `page.model.json`)
    pub model_extension: String,

    /// Naming convention of the structural keys
    pub keys: StructuralKeys,

    /// Buffer size of the model event channel
    pub event_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            api_host: None,
            model_selector: "model".to_string(),
            model_extension: "json".to_string(),
            keys: StructuralKeys::default(),
            event_capacity: 64,
        }
    }
}

impl ManagerConfig {
    /// Load and validate a configuration file
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model_selector.is_empty() {
            return Err("model_selector cannot be empty".to_string());
        }

        if self.model_extension.is_empty() {
            return Err("model_extension cannot be empty".to_string());
        }

        if self.event_capacity == 0 {
            return Err("event_capacity must be greater than 0".to_string());
        }

        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(format!(
                "event_capacity cannot exceed {}",
                MAX_EVENT_CAPACITY
            ));
        }

        if let Some(host) = &self.api_host {
            if !host.is_empty() && !host.starts_with("http://") && !host.starts_with("https://") {
                return Err(format!("api_host must be an http(s) URL, got '{}'", host));
            }
        }

        self.keys.validate()
    }
}
