//! Controller endpoint configuration
//!
//! This module holds the address, TLS and timeout settings used to reach a
//! Mobility Master or standalone controller over HTTPS.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConnectionError;

/// Default REST API port on ArubaOS 8 controllers
pub const DEFAULT_PORT: u16 = 4343;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT: u64 = 30;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_true() -> bool {
    true
}

/// Controller endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname or IP address of the controller
    #[serde(default)]
    pub host: String,

    /// REST API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS
    #[serde(default = "default_true")]
    pub use_ssl: bool,

    /// Verify the controller's TLS certificate
    #[serde(default = "default_true")]
    pub validate_certs: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            use_ssl: true,
            validate_certs: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HostConfig {
    /// Create a config for the given controller address
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set whether HTTPS is used
    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Set certificate validation
    pub fn validate_certs(mut self, validate: bool) -> Self {
        self.validate_certs = validate;
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the request timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Base URL every request path is appended to
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Check that the endpoint is usable
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.host.trim().is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "controller host is required".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConnectionError::InvalidConfig(
                "controller port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse an endpoint from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConnectionError> {
        toml::from_str(content)
            .map_err(|e| ConnectionError::InvalidConfig(format!("Failed to parse config: {}", e)))
    }
}
