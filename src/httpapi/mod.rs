//! HTTP API connection for ArubaOS controllers.
//!
//! [`HttpApi`] is the session manager: it logs in to obtain a session
//! identifier, attaches that identifier to every subsequent request, decodes
//! responses and maps HTTP error statuses to [`ConnectionError::Http`].
//!
//! The session itself is not stored here. Callers own a [`Session`] and pass
//! it into every call, so two sessions can share one `HttpApi` without
//! seeing each other's credentials.
//!
//! # Request decoration
//!
//! Once a session holds a token, every request carries
//!
//! - a `Cookie: SESSION=<uid>` header, and
//! - a `UIDARUBA=<uid>` query parameter, except on the logout endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use rustible_aos::connection::{HostConfig, HttpTransport};
//! use rustible_aos::httpapi::HttpApi;
//! use std::sync::Arc;
//!
//! let api = HttpApi::new(Arc::new(HttpTransport::new(HostConfig::new("10.1.1.1"))));
//! let mut session = api.open_session();
//! api.login(&mut session, "admin", "secret").await?;
//! let response = api
//!     .send_request(&mut session, HttpRequest::get("/v1/configuration/object/hostname?config_path=%2Fmm"))
//!     .await?;
//! api.logout(&mut session).await?;
//! ```

pub mod session;

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use url::form_urlencoded;

use crate::connection::{ConnectionError, ConnectionResult, HttpRequest, RawResponse, Transport};
use crate::telemetry::spans::{create_request_span, SpanExt};

pub use session::{Session, SessionToken};

/// Login endpoint
pub const LOGIN_PATH: &str = "/v1/api/login";

/// Logout endpoint
pub const LOGOUT_PATH: &str = "/v1/api/logout";

/// Query parameter the API requires the session identifier under
pub const SESSION_QUERY_PARAM: &str = "UIDARUBA";

/// Decoded response body.
///
/// Bodies that parse as JSON are kept as a [`Value`]; anything else is passed
/// through as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON document
    Json(Value),
    /// Body that did not parse as JSON
    Raw(String),
}

impl ResponseBody {
    /// Decode raw body bytes, falling back to text when they are not JSON.
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// JSON view of the body
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// Look up a top-level key of a JSON object body
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|value| value.get(key))
    }

    /// Whether a JSON object body has the given top-level key
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self, ResponseBody::Json(Value::Object(map)) if map.contains_key(key))
    }

    /// Whether the body carries nothing: null, an empty container or empty text
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseBody::Json(Value::Null) => true,
            ResponseBody::Json(Value::Object(map)) => map.is_empty(),
            ResponseBody::Json(Value::Array(items)) => items.is_empty(),
            ResponseBody::Json(Value::String(s)) => s.is_empty(),
            ResponseBody::Json(_) => false,
            ResponseBody::Raw(text) => text.is_empty(),
        }
    }

    /// Convert into a JSON value; raw text becomes a JSON string
    pub fn into_value(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Raw(text) => Value::String(text),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{}", value),
            ResponseBody::Raw(text) => f.write_str(text),
        }
    }
}

/// Decoded body and status code of a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Decoded body
    pub body: ResponseBody,
    /// HTTP status code
    pub code: u16,
}

impl ApiResponse {
    /// Create a response
    pub fn new(body: ResponseBody, code: u16) -> Self {
        Self { body, code }
    }
}

/// Append one encoded query parameter to a path that may already carry a
/// query string.
pub(crate) fn append_query(path: &str, key: &str, value: &str) -> String {
    let pair = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    let separator = if path.ends_with('?') || path.ends_with('&') {
        ""
    } else if path.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{}{}{}", path, separator, pair)
}

fn is_logout_path(path: &str) -> bool {
    path.split('?').next() == Some(LOGOUT_PATH)
}

/// Session manager over a [`Transport`].
#[derive(Clone)]
pub struct HttpApi {
    transport: Arc<dyn Transport>,
}

impl HttpApi {
    /// Create a session manager over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Underlying transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Create a fresh, disconnected session bound to this transport's endpoint
    pub fn open_session(&self) -> Session {
        Session::new(self.transport.identifier())
    }

    /// Log in and store the resulting session token in `session`.
    ///
    /// The credentials are only used to build the login request.
    pub async fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> ConnectionResult<()> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .finish();
        let path = format!("{}?{}", LOGIN_PATH, query);

        info!(endpoint = %session.endpoint(), user = %username, "Logging in to controller");
        let response = self.send_request(session, HttpRequest::get(path)).await?;

        if Self::update_auth(&response.body).is_none() {
            let reason = response
                .body
                .get("_global_result")
                .and_then(|g| g.get("status_str"))
                .and_then(Value::as_str)
                .unwrap_or("no session identifier in login response")
                .to_string();
            return Err(ConnectionError::AuthenticationFailed(reason));
        }

        debug!(endpoint = %session.endpoint(), "Session established");
        Ok(())
    }

    /// Invalidate the session on the controller and clear it locally.
    ///
    /// The logout request is sent whether or not the session holds a token.
    pub async fn logout(&self, session: &mut Session) -> ConnectionResult<()> {
        info!(endpoint = %session.endpoint(), "Logging out of controller");
        let result = self
            .send_request(session, HttpRequest::get(LOGOUT_PATH))
            .await;
        session.reset();
        result.map(|_| ())
    }

    /// Tear the connection down: log out of a connected session, then close
    /// the transport.
    pub async fn close(&self, session: &mut Session) -> ConnectionResult<()> {
        if session.is_connected() {
            if let Err(e) = self.logout(session).await {
                warn!(endpoint = %session.endpoint(), error = %e, "Logout during close failed");
            }
        }
        session.reset();
        self.transport.close().await
    }

    /// Send one request on behalf of `session`.
    ///
    /// Connects lazily, attaches the session credential, decodes the body and
    /// maps HTTP error statuses to errors. A session identifier found in a
    /// successful response replaces the one held by `session`.
    pub async fn send_request(
        &self,
        session: &mut Session,
        mut request: HttpRequest,
    ) -> ConnectionResult<ApiResponse> {
        if !session.is_connected() || !self.transport.is_connected() {
            self.transport.connect().await?;
            session.mark_connected();
        }

        if let Some(token) = session.token() {
            request = request.with_header("Cookie", token.cookie());
            if !is_logout_path(&request.path) {
                request.path = append_query(&request.path, SESSION_QUERY_PARAM, token.uid());
            }
        }

        let span = create_request_span(
            &request.method.to_string(),
            request.loggable_path(),
            session.endpoint(),
        );
        let raw = match self.transport.send(request).instrument(span.clone()).await {
            Ok(raw) => raw,
            Err(e) => {
                span.record_error(&e);
                return Err(e);
            }
        };
        span.record_status_code(raw.status);

        let body = ResponseBody::decode(&raw.body);
        let response = Self::handle_response(&raw, body)?;

        if let Some(token) = Self::update_auth(&response.body) {
            session.set_token(token);
        }

        Ok(response)
    }

    /// Per-request credential carried by a response, if any.
    ///
    /// Only a `_global_result` envelope holding a non-empty `UIDARUBA`
    /// string produces a token.
    pub fn update_auth(body: &ResponseBody) -> Option<SessionToken> {
        match body.as_json()?.get("_global_result")?.get(SESSION_QUERY_PARAM)? {
            Value::String(uid) if !uid.is_empty() => Some(SessionToken::from_uid(uid)),
            _ => None,
        }
    }

    /// Convert an HTTP error status into [`ConnectionError::Http`]; pass any
    /// other response through.
    pub fn handle_response(raw: &RawResponse, body: ResponseBody) -> ConnectionResult<ApiResponse> {
        if raw.is_error() {
            let message = if raw.body.is_empty() {
                format!(
                    "HTTP Error {}: {}",
                    raw.status,
                    raw.reason.as_deref().unwrap_or("Unknown")
                )
            } else {
                format!("Error: {}, {}", raw.status, body)
            };
            warn!(code = raw.status, "Controller returned an HTTP error");
            return Err(ConnectionError::Http {
                code: raw.status,
                message,
            });
        }

        Ok(ApiResponse::new(body, raw.status))
    }
}

impl fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpApi")
            .field("transport", &self.transport.identifier())
            .finish()
    }
}
