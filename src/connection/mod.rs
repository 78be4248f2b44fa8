//! Connection layer for controller communication.
//!
//! This module provides the transport abstraction that the HTTP API session
//! manager sends its requests through. A transport owns the socket, TLS and
//! timeout handling; it knows nothing about sessions or the controller's
//! response envelopes.
//!
//! # Overview
//!
//! All transports implement the [`Transport`] trait. The bundled
//! [`HttpTransport`] talks HTTPS to a controller using `reqwest`; tests can
//! substitute a scripted transport.
//!
//! # Example
//!
//! ```rust,ignore
//! use rustible_aos::connection::{HostConfig, HttpRequest, HttpTransport, Transport};
//!
//! let transport = HttpTransport::new(HostConfig::new("10.0.0.5"));
//! transport.connect().await?;
//!
//! let response = transport
//!     .send(HttpRequest::get("/v1/configuration/object/hostname"))
//!     .await?;
//! println!("status: {}", response.status);
//! ```

/// Controller endpoint configuration.
pub mod config;

/// HTTPS transport implementation backed by reqwest.
pub mod http;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use config::HostConfig;
pub use http::HttpTransport;

/// Errors that can occur during connection operations.
///
/// Transport failures (refused connections, TLS errors, unreadable bodies)
/// and HTTP error statuses are both fatal for the operation that hit them.
/// A body that is not JSON is not an error at this layer.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to establish the connection to the controller.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The controller did not return a session identifier on login.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Connection or request timed out.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// The response body stream could not be read.
    #[error("Unreadable response body: {0}")]
    UnreadableBody(String),

    /// The controller answered with an HTTP error status.
    #[error("{message}")]
    Http {
        /// HTTP status code
        code: u16,
        /// Description built from the code and the response body
        message: String,
    },

    /// Configuration is invalid or incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A request was issued on a transport that has not been connected.
    #[error("Not connected to {0}")]
    NotConnected(String),

    /// The requested operation is not supported by this transport.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl ConnectionError {
    /// Returns the HTTP status code for HTTP error responses.
    pub fn code(&self) -> Option<u16> {
        match self {
            ConnectionError::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// HTTP methods accepted by the controller's configuration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Read request
    Get,
    /// Write request
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(ConnectionError::UnsupportedOperation(format!(
                "HTTP method {} is not supported. Valid options: GET, POST",
                other
            ))),
        }
    }
}

/// A single request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path including any query string, relative to the transport endpoint
    pub path: String,
    /// Serialized request body
    pub body: Option<String>,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    /// Create a request with no body
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request carrying a JSON body
    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    /// Set the request body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Path without its query string. Query strings can carry credentials,
    /// so this is the form that gets logged.
    pub fn loggable_path(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }
}

/// Response metadata and the fully read body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase, when known
    pub reason: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: None,
            body: body.into(),
        }
    }

    /// Set the reason phrase
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether the status code denotes an HTTP error
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// The transport contract used by the session manager.
///
/// Implementations own connection lifecycle, TLS and timeouts. They do not
/// retry: a failed exchange is surfaced to the caller as-is.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport identifier (controller host)
    fn identifier(&self) -> &str;

    /// Whether `connect` has completed and `close` has not been called since
    fn is_connected(&self) -> bool;

    /// Establish the underlying connection
    async fn connect(&self) -> ConnectionResult<()>;

    /// Send one request and read the full response.
    ///
    /// HTTP error statuses are returned as responses, not errors; only
    /// failures to complete the exchange are errors.
    async fn send(&self, request: HttpRequest) -> ConnectionResult<RawResponse>;

    /// Tear the connection down
    async fn close(&self) -> ConnectionResult<()>;
}
