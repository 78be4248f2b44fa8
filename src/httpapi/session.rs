//! Per-connection session state.
//!
//! A [`Session`] is created when a caller opens a connection, filled in by
//! login, consulted by every request and emptied on logout or teardown. It is
//! passed explicitly into every operation; requests on one session must be
//! issued one at a time.

use std::fmt;

/// Cookie name the controller issues the session identifier under
pub const SESSION_COOKIE: &str = "SESSION";

/// Opaque session credential, kept in its cookie form `SESSION=<uid>`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    cookie: String,
}

impl SessionToken {
    /// Build a token from the identifier returned by the controller
    pub fn from_uid(uid: impl AsRef<str>) -> Self {
        Self {
            cookie: format!("{}={}", SESSION_COOKIE, uid.as_ref()),
        }
    }

    /// Value for the `Cookie` request header
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Session identifier, split off the cookie at its key/value separator
    pub fn uid(&self) -> &str {
        self.cookie
            .split_once(&format!("{}=", SESSION_COOKIE))
            .map(|(_, uid)| uid)
            .unwrap_or_default()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Authenticated session against one controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    endpoint: String,
    token: Option<SessionToken>,
    connected: bool,
}

impl Session {
    /// Create a disconnected session for the given transport endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            connected: false,
        }
    }

    /// Transport endpoint this session belongs to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Active credential, if logged in
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Whether a credential is held
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the transport connection has been established
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn set_token(&mut self, token: SessionToken) {
        self.token = Some(token);
    }

    pub(crate) fn mark_connected(&mut self) {
        self.connected = true;
    }

    /// Drop the credential and the connected flag
    pub(crate) fn reset(&mut self) {
        self.token = None;
        self.connected = false;
    }
}
