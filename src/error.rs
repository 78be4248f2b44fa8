//! Crate-level error type.
//!
//! [`ConnectionError`] covers the transport and session, [`ClientError`]
//! configuration transactions and [`ModuleError`] module parameters and
//! execution. [`Error`] wraps all three for callers that drive the whole
//! stack and do not care which layer failed.

use thiserror::Error;

use crate::client::ClientError;
use crate::connection::ConnectionError;
use crate::modules::ModuleError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    /// A module ran but reported failure, usually a non-zero status inside
    /// an HTTP 200 response.
    #[error("{module} failed: {message}")]
    ModuleFailed {
        module: String,
        message: String,
        /// Whether configuration changed before the failure was reported
        changed: bool,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn module_failed(
        module: impl Into<String>,
        message: impl Into<String>,
        changed: bool,
    ) -> Self {
        Self::ModuleFailed {
            module: module.into(),
            message: message.into(),
            changed,
        }
    }

    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// HTTP status of the controller response behind this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        let connection = match self {
            Error::Connection(e) => e,
            Error::Client(ClientError::Connection(e)) => e,
            Error::Client(ClientError::WriteFailed { source, .. }) => source,
            Error::Module(ModuleError::Client(ClientError::Connection(e))) => e,
            Error::Module(ModuleError::Client(ClientError::WriteFailed { source, .. })) => source,
            _ => return None,
        };
        connection.code()
    }

    /// Whether controller configuration changed even though the operation
    /// failed. Such failures must not be treated as no-ops.
    pub fn changed(&self) -> bool {
        match self {
            Error::Client(e) | Error::Module(ModuleError::Client(e)) => e.changed(),
            Error::ModuleFailed { changed, .. } => *changed,
            _ => false,
        }
    }
}
