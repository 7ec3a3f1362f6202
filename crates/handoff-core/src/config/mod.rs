//! Configuration management for Handoff.
//!
//! This module handles loading, saving, and managing Handoff configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/handoff/config.toml` |
//! | macOS | `~/Library/Application Support/Handoff/config.toml` |
//! | Windows | `%APPDATA%\Handoff\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use handoff_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Link scheme: {}", config.handoff.link_scheme);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::ApiCredentials;

/// Main configuration struct for Handoff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application credentials
    pub api: ApiConfig,
    /// Handoff behaviour
    pub handoff: HandoffConfig,
    /// Local storage
    pub storage: StorageConfig,
}

/// Application credentials presented to the remote service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Application id
    pub api_id: i32,
    /// Application hash
    pub api_hash: String,
}

/// Handoff configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// URL scheme of login links
    pub link_scheme: String,
    /// Sync contacts after a successful login
    pub sync_contacts: bool,
    /// Application version recorded at login
    pub app_version: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            link_scheme: crate::DEFAULT_LINK_SCHEME.to_string(),
            sync_contacts: true,
            app_version: crate::VERSION.to_string(),
        }
    }
}

/// Storage configuration options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the account database location
    pub accounts_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Check values that would only fail later, deep inside a handoff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let scheme = &self.handoff.link_scheme;
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

        if !valid_scheme {
            return Err(Error::InvalidConfig {
                key: "handoff.link_scheme".to_string(),
                reason: format!("'{scheme}' is not a valid URL scheme"),
            });
        }

        if self.api.api_id < 0 {
            return Err(Error::InvalidConfig {
                key: "api.api_id".to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        Ok(())
    }

    /// Application credentials for new sessions.
    #[must_use]
    pub fn api_credentials(&self) -> ApiCredentials {
        ApiCredentials {
            api_id: self.api.api_id,
            api_hash: self.api.api_hash.clone(),
        }
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "handoff", "Handoff")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}
