//! Taskflow Configuration Module
//!
//! Manages persistent configuration for the API endpoint and graph layout.
//! Config is stored in `~/.config/taskflow/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags (`--api-url`)
//! 2. Environment variables (`TASKFLOW_API_URL`)
//! 3. Config file (`~/.config/taskflow/config.toml`)
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TaskflowError};
use crate::workflow::LayoutSettings;

pub const DEFAULT_API_URL: &str = "https://localhost:8000/api";
pub const API_URL_ENV: &str = "TASKFLOW_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskflowConfig {
    /// REST gateway settings
    #[serde(default)]
    pub api: ApiSettings,

    /// Workflow graph layout parameters
    #[serde(default)]
    pub layout: LayoutSettings,
}

/// REST gateway settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl TaskflowConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/taskflow/` on Unix, `%APPDATA%/taskflow/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskflow")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from file
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| TaskflowError::Config {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| TaskflowError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to file, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| TaskflowError::Config {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| TaskflowError::Config {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| TaskflowError::Config {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        self
    }

    /// Apply a CLI override
    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api.base_url = url;
        }
        self
    }

    /// Set the base URL after validating it
    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        validate_base_url(url)?;
        self.api.base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }
}

/// Base URL must be absolute http(s)
pub fn validate_base_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).map_err(|e| TaskflowError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(TaskflowError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
