//! Configuration transaction client.
//!
//! [`AosApi`] turns logical operations (read an object, push a change, run a
//! show command, commit) into requests on an [`HttpApi`] session. Writes are
//! wrapped in a before/after read of the node's configuration so the caller
//! learns whether the push changed anything.
//!
//! # Example
//!
//! ```rust,ignore
//! use rustible_aos::client::{AosApi, ConfigPush, Payload};
//! use rustible_aos::config::Config;
//! use serde_json::json;
//!
//! let config = Config::load(None)?;
//! let api = AosApi::from_config(&config);
//! let mut session = api.open_session();
//! api.login(&mut session, &config.credentials).await?;
//!
//! let push = ConfigPush::object("/md/Boston", Payload::single(json!({"vlan_id": {"id": 5}})))?;
//! let (response, changed) = api.post(&mut session, &push).await?;
//! ```

pub mod request;
pub mod validate;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::{Config, Credentials};
use crate::connection::{ConnectionError, HttpRequest, HttpTransport};
use crate::httpapi::{ApiResponse, HttpApi, ResponseBody, Session};

pub use request::{validate_config_path, ConfigPush, ObjectQuery, Payload, QueryModifiers};
pub use validate::{validate, ValidationOutcome};

/// API version prefix of every endpoint
pub const API_VERSION: &str = "/v1";

/// Endpoint read before and after every write
pub const CONFIG_SNAPSHOT_PATH: &str = "/configuration/object/config";

/// Commit endpoint
pub const WRITE_MEMORY_PATH: &str = "/configuration/object/write_memory";

/// Show command endpoint
pub const SHOW_COMMAND_PATH: &str = "/configuration/showcommand";

/// Errors raised by the transaction client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport or HTTP failure outside a write.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A request failed validation before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The write itself failed. The configuration was still re-read, and
    /// `changed` reports whether it differs from before the write.
    #[error("Write to {url} failed (changed: {changed}): {source}")]
    WriteFailed {
        /// Write URL without query string
        url: String,
        /// Whether the configuration changed anyway
        changed: bool,
        /// Underlying failure
        source: ConnectionError,
    },
}

impl ClientError {
    /// Whether configuration changed despite the error
    pub fn changed(&self) -> bool {
        matches!(self, ClientError::WriteFailed { changed: true, .. })
    }
}

/// Configuration transaction client.
#[derive(Debug, Clone)]
pub struct AosApi {
    http: HttpApi,
}

impl AosApi {
    /// Create a client over an existing session manager
    pub fn new(http: HttpApi) -> Self {
        Self { http }
    }

    /// Create a client that talks HTTPS to the configured controller
    pub fn from_config(config: &Config) -> Self {
        let transport = HttpTransport::new(config.controller.clone());
        Self::new(HttpApi::new(Arc::new(transport)))
    }

    /// Session manager used by this client
    pub fn http(&self) -> &HttpApi {
        &self.http
    }

    /// Fresh session for this client's controller
    pub fn open_session(&self) -> Session {
        self.http.open_session()
    }

    /// Log `session` in with the given credentials
    pub async fn login(&self, session: &mut Session, credentials: &Credentials) -> Result<(), ClientError> {
        self.http
            .login(session, &credentials.username, &credentials.password)
            .await?;
        Ok(())
    }

    /// Prefix `url` with the API version and append encoded `params`.
    pub fn get_url(url: &str, params: &[(&str, String)]) -> String {
        if params.is_empty() {
            return format!("{}{}", API_VERSION, url);
        }
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            query.append_pair(key, value);
        }
        format!("{}{}?{}", API_VERSION, url, query.finish())
    }

    /// Read a fully built URL
    pub async fn get(&self, session: &mut Session, url: &str) -> Result<ApiResponse, ClientError> {
        Ok(self.http.send_request(session, HttpRequest::get(url)).await?)
    }

    /// Read one configuration object
    pub async fn get_object(
        &self,
        session: &mut Session,
        query: &ObjectQuery,
    ) -> Result<ApiResponse, ClientError> {
        let url = Self::get_url(&query.path(), &query.modifiers().query_params());
        debug!(object = %query.api_object(), "Reading configuration object");
        self.get(session, &url).await
    }

    /// Run a show command
    pub async fn show_command(
        &self,
        session: &mut Session,
        command: &str,
    ) -> Result<ApiResponse, ClientError> {
        if command.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "show command must not be empty".to_string(),
            ));
        }
        let url = Self::get_url(SHOW_COMMAND_PATH, &[("command", command.to_string())]);
        debug!(command = %command, "Running show command");
        self.get(session, &url).await
    }

    async fn snapshot(
        &self,
        session: &mut Session,
        config_path: Option<&str>,
    ) -> Result<ResponseBody, ClientError> {
        let params: Vec<(&str, String)> = config_path
            .map(|path| vec![("config_path", path.to_string())])
            .unwrap_or_default();
        let url = Self::get_url(CONFIG_SNAPSHOT_PATH, &params);
        Ok(self.get(session, &url).await?.body)
    }

    /// Push a configuration change and report whether it changed anything.
    ///
    /// The node's configuration is read before and after the write; `changed`
    /// is true when the two reads differ. The second read happens even when
    /// the write fails, in which case [`ClientError::WriteFailed`] carries
    /// the comparison.
    pub async fn post(
        &self,
        session: &mut Session,
        push: &ConfigPush,
    ) -> Result<(ApiResponse, bool), ClientError> {
        let before = self.snapshot(session, push.config_path()).await?;

        let url = Self::get_url(push.url(), &push.query_params());
        let request = HttpRequest::post(url, push.payload().to_json().to_string());
        let written = self.http.send_request(session, request).await;

        let after = match self.snapshot(session, push.config_path()).await {
            Ok(after) => after,
            Err(e) => {
                return match written {
                    Err(source) => {
                        warn!(error = %e, "Configuration re-read after failed write also failed");
                        Err(ClientError::WriteFailed {
                            url: push.url().to_string(),
                            changed: false,
                            source,
                        })
                    }
                    Ok(_) => Err(e),
                };
            }
        };

        let changed = before != after;
        match written {
            Ok(response) => {
                info!(url = %push.url(), code = response.code, changed, "Configuration pushed");
                Ok((response, changed))
            }
            Err(source) => {
                warn!(url = %push.url(), changed, error = %source, "Configuration push failed");
                Err(ClientError::WriteFailed {
                    url: push.url().to_string(),
                    changed,
                    source,
                })
            }
        }
    }

    /// Write pending changes under `config_path` to startup configuration.
    ///
    /// Returns whether the commit succeeded; an HTTP error status from the
    /// commit endpoint is reported as `false`. Transport failures are errors.
    pub async fn write_mem(&self, session: &mut Session, config_path: &str) -> Result<bool, ClientError> {
        let push = ConfigPush::new(
            WRITE_MEMORY_PATH,
            Some(config_path.to_string()),
            Payload::empty(),
        )?;

        match self.post(session, &push).await {
            Ok((response, _)) => {
                let committed = Self::commit_succeeded(&response);
                info!(config_path = %config_path, committed, "Commit finished");
                Ok(committed)
            }
            Err(ClientError::WriteFailed {
                source: ConnectionError::Http { code, .. },
                ..
            }) => {
                warn!(config_path = %config_path, code, "Commit rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// A commit succeeded iff the status is exactly 200 and the body has no
    /// `Error` key.
    pub fn commit_succeeded(response: &ApiResponse) -> bool {
        response.code == 200 && !response.body.contains_key(validate::ERROR_KEY)
    }
}
