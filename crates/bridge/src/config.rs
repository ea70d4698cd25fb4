//! Configuration management for the TermLink bridge.
//!
//! This module provides TOML-based configuration file loading.
//! The default configuration path is `~/.config/termlink/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default base URL of the relay's tunnel endpoint.
pub const DEFAULT_RELAY_URL: &str = "ws://localhost:9009";

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("relay url must start with ws:// or wss://, got {0}")]
    InvalidRelayUrl(String),

    #[error("ssh_port must be nonzero")]
    InvalidSshPort,

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Main configuration structure for the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Relay connection settings.
    pub relay: RelayConfig,

    /// Logging settings.
    pub log: LogConfig,
}

/// Relay connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL of the relay's tunnel endpoint (ws:// or wss://).
    pub url: String,

    /// Host shown in the operator's ssh connection hint.
    pub ssh_host: String,

    /// Port shown in the operator's ssh connection hint.
    pub ssh_port: u16,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RELAY_URL.to_string(),
            ssh_host: "ssh.termlink.dev".to_string(),
            ssh_port: 2222,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    /// Tunnel URL for a specific session.
    pub fn session_url(&self, session_id: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), session_id)
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("termlink")
        .join("config.toml")
}

impl Config {
    /// Loads configuration from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Loads configuration from the default path, falling back to defaults
    /// when no file exists.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - TERMLINK_RELAY_URL: Override the relay tunnel base URL
    /// - TERMLINK_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TERMLINK_RELAY_URL") {
            if !url.is_empty() {
                tracing::info!("Overriding relay url from environment: {}", url);
                self.relay.url = url;
            }
        }

        if let Ok(level) = std::env::var("TERMLINK_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.log.level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.relay.url;
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(ConfigError::InvalidRelayUrl(url.clone()));
        }
        if Url::parse(url).is_err() {
            return Err(ConfigError::InvalidRelayUrl(url.clone()));
        }

        if self.relay.ssh_port == 0 {
            return Err(ConfigError::InvalidSshPort);
        }

        let level = self.log.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log.level.clone()));
        }

        Ok(())
    }
}
