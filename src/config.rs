//! Configuration module for rustible-aos
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - User configuration (~/.rustible/aos.toml)
//! - Project configuration (./rustible-aos.toml)
//! - Environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::connection::HostConfig;
use crate::telemetry::{LogFormat, LogLevel, LoggingConfig};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "RUSTIBLE_AOS_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Controller endpoint
    pub controller: HostConfig,

    /// Login credentials
    pub credentials: Credentials,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Login credentials.
///
/// Handed to the session manager for each login and never kept by it.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact, json)
    pub format: String,

    /// Include timestamps
    pub timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            timestamps: true,
        }
    }
}

impl LoggingSettings {
    /// Convert into a subscriber configuration. Unknown values fall back to
    /// the defaults.
    pub fn to_logging_config(&self) -> LoggingConfig {
        let level = self.level.parse().unwrap_or(LogLevel::Info);
        let format = self.format.parse().unwrap_or(LogFormat::Compact);
        LoggingConfig {
            level,
            format,
            timestamps: self.timestamps,
            ..LoggingConfig::default()
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        // First existing file wins
        if let Some(path) = Self::get_config_paths(config_path)
            .into_iter()
            .find(|p| p.exists())
        {
            config = config.merge_from_file(&path)?;
        } else if let Some(path) = config_path {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check, in priority order
    fn get_config_paths(explicit_path: Option<&Path>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.to_path_buf()];
        }

        let mut paths = Vec::new();

        if let Ok(env_config) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(env_config));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rustible/aos.toml"));
        }

        paths.push(PathBuf::from("rustible-aos.toml"));

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; values set in `other` win
    fn merge(&self, other: Config) -> Config {
        Config {
            controller: HostConfig {
                host: if other.controller.host.is_empty() {
                    self.controller.host.clone()
                } else {
                    other.controller.host
                },
                ..other.controller
            },
            credentials: Credentials {
                username: if other.credentials.username.is_empty() {
                    self.credentials.username.clone()
                } else {
                    other.credentials.username
                },
                password: if other.credentials.password.is_empty() {
                    self.credentials.password.clone()
                } else {
                    other.credentials.password
                },
            },
            logging: other.logging,
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("RUSTIBLE_AOS_HOST") {
            self.controller.host = host;
        }

        if let Ok(port) = std::env::var("RUSTIBLE_AOS_PORT") {
            if let Ok(n) = port.parse() {
                self.controller.port = n;
            }
        }

        if let Ok(user) = std::env::var("RUSTIBLE_AOS_USER") {
            self.credentials.username = user;
        }

        if let Ok(password) = std::env::var("RUSTIBLE_AOS_PASSWORD") {
            self.credentials.password = password;
        }

        if let Ok(validate) = std::env::var("RUSTIBLE_AOS_VALIDATE_CERTS") {
            match validate.to_lowercase().as_str() {
                "0" | "false" | "no" | "off" => self.controller.validate_certs = false,
                "1" | "true" | "yes" | "on" => self.controller.validate_certs = true,
                _ => {}
            }
        }

        if let Ok(timeout) = std::env::var("RUSTIBLE_AOS_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.controller.timeout = n;
            }
        }

        if let Ok(level) = std::env::var("RUSTIBLE_AOS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Load from a specific file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }

    /// Check that the controller endpoint is usable
    pub fn validate(&self) -> crate::error::Result<()> {
        self.controller
            .validate()
            .map_err(|e| crate::error::Error::invalid_config("controller", e.to_string()))?;
        if self.credentials.username.is_empty() {
            return Err(crate::error::Error::invalid_config(
                "credentials.username",
                "username is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.controller.port, 4343);
        assert_eq!(config.controller.timeout, 30);
        assert!(config.controller.validate_certs);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_merge() {
        let base = Config {
            credentials: Credentials::new("admin", "secret"),
            ..Config::default()
        };
        let other = Config {
            controller: HostConfig::new("10.1.1.1").port(8443),
            ..Config::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.controller.host, "10.1.1.1");
        assert_eq!(merged.controller.port, 8443);
        assert_eq!(merged.credentials.username, "admin");
        assert_eq!(merged.credentials.password, "secret");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_logging_settings_conversion() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            format: "json".to_string(),
            timestamps: false,
        };
        let config = settings.to_logging_config();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.timestamps);

        let fallback = LoggingSettings {
            level: "loud".to_string(),
            ..LoggingSettings::default()
        };
        assert_eq!(fallback.to_logging_config().level, LogLevel::Info);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_err());
        let config = Config {
            controller: HostConfig::new("mm.example.com"),
            credentials: Credentials::new("admin", "x"),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
