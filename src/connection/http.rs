//! HTTPS transport to a controller.
//!
//! The reqwest client is built lazily on [`Transport::connect`] so that TLS
//! settings are applied once per connection, and dropped on
//! [`Transport::close`].

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{header, Client, Method};
use tracing::{debug, trace};

use super::{
    ConnectionError, ConnectionResult, HostConfig, HttpMethod, HttpRequest, RawResponse,
    Transport,
};

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    config: HostConfig,
    base_url: String,
    client: RwLock<Option<Client>>,
}

impl HttpTransport {
    /// Create a transport for the given endpoint. No connection is made
    /// until [`Transport::connect`] is called.
    pub fn new(config: HostConfig) -> Self {
        let base_url = config.base_url();
        Self {
            config,
            base_url,
            client: RwLock::new(None),
        }
    }

    /// Create a transport for an explicit base URL (scheme, host and port).
    pub fn with_base_url(config: HostConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: RwLock::new(None),
        }
    }

    /// Endpoint configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Base URL every request path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_client(&self) -> ConnectionResult<Client> {
        Client::builder()
            .timeout(self.config.timeout_duration())
            .connect_timeout(self.config.timeout_duration())
            .danger_accept_invalid_certs(!self.config.validate_certs)
            .build()
            .map_err(|e| {
                ConnectionError::ConnectionFailed(format!("Failed to build HTTP client: {}", e))
            })
    }

    fn map_send_error(&self, err: reqwest::Error) -> ConnectionError {
        if err.is_timeout() {
            ConnectionError::Timeout(self.config.timeout)
        } else {
            ConnectionError::ConnectionFailed(format!(
                "request to {} failed: {}",
                self.config.host, err
            ))
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("validate_certs", &self.config.validate_certs)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn identifier(&self) -> &str {
        &self.config.host
    }

    fn is_connected(&self) -> bool {
        self.client.read().is_some()
    }

    async fn connect(&self) -> ConnectionResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let client = self.build_client()?;
        *self.client.write() = Some(client);
        debug!(base_url = %self.base_url, "HTTP transport connected");
        Ok(())
    }

    async fn send(&self, request: HttpRequest) -> ConnectionResult<RawResponse> {
        let client = self
            .client
            .read()
            .clone()
            .ok_or_else(|| ConnectionError::NotConnected(self.config.host.clone()))?;

        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        trace!(method = %request.method, path = %request.loggable_path(), "sending request");

        let mut builder = client
            .request(method, &url)
            .header(header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let reason = status.canonical_reason().map(String::from);
        let body = response
            .bytes()
            .await
            .map_err(|e| ConnectionError::UnreadableBody(e.to_string()))?;

        let mut raw = RawResponse::new(status.as_u16(), body.to_vec());
        raw.reason = reason;
        Ok(raw)
    }

    async fn close(&self) -> ConnectionResult<()> {
        self.client.write().take();
        debug!(base_url = %self.base_url, "HTTP transport closed");
        Ok(())
    }
}
