//! Shared test utilities for the rustible-aos test suite.
//!
//! This module provides:
//! - `ScriptedTransport`: an in-memory `Transport` that replays queued responses
//! - `FakeController`: a stateful wiremock responder that behaves like a controller
//! - Helpers for building clients, sessions and module parameters
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use rustible_aos::client::AosApi;
use rustible_aos::config::Credentials;
use rustible_aos::connection::{
    ConnectionError, ConnectionResult, HostConfig, HttpRequest, HttpTransport, RawResponse,
    Transport,
};
use rustible_aos::httpapi::HttpApi;
use rustible_aos::modules::{ModuleContext, ModuleParams};

/// Session identifier handed out by the fake controller
pub const TOKEN: &str = "xY9Tq2+/ab==";

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "s3cret&pass";

// ============================================================================
// Scripted Transport
// ============================================================================

/// A transport that records every request and answers from a queue.
///
/// When the queue is empty it answers `200 {}`.
pub struct ScriptedTransport {
    identifier: String,
    connected: AtomicBool,
    connects: AtomicU32,
    closes: AtomicU32,
    responses: Mutex<VecDeque<ConnectionResult<RawResponse>>>,
    requests: RwLock<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            connected: AtomicBool::new(false),
            connects: AtomicU32::new(0),
            closes: AtomicU32::new(0),
            responses: Mutex::new(VecDeque::new()),
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string());
    }

    /// Queue a response with an arbitrary body.
    pub fn push_raw(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .push_back(Ok(RawResponse::new(status, body)));
    }

    /// Queue a fully built response.
    pub fn push_response(&self, response: RawResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: ConnectionError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Queue the login response carrying `TOKEN`.
    pub fn push_login(&self) {
        self.push_json(200, login_body(TOKEN));
    }

    /// All requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.read().last().cloned()
    }

    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> ConnectionResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, request: HttpRequest) -> ConnectionResult<RawResponse> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected(self.identifier.clone()));
        }
        self.requests.write().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(200, "{}")))
    }

    async fn close(&self) -> ConnectionResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Session manager over a fresh scripted transport.
pub fn scripted_api() -> (Arc<ScriptedTransport>, HttpApi) {
    let transport = Arc::new(ScriptedTransport::new("mm.test"));
    let api = HttpApi::new(transport.clone());
    (transport, api)
}

/// Login response body carrying `uid`.
pub fn login_body(uid: &str) -> Value {
    json!({
        "_global_result": {
            "status": "0",
            "status_str": "You've logged in successfully.",
            "UIDARUBA": uid
        }
    })
}

/// Value of a query parameter in a request path.
pub fn query_param(path: &str, key: &str) -> Option<String> {
    let query = path.split_once('?')?.1;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

// ============================================================================
// Fake Controller
// ============================================================================

#[derive(Default)]
struct ControllerState {
    objects: Vec<Value>,
    pending: u64,
    commits: u32,
    fail_commit: bool,
    reject_with: Option<String>,
    deny_with: Option<String>,
    fail_writes: bool,
}

/// A stateful controller behind a wiremock server.
///
/// Every object pushed to `/configuration/object...` is stored once; pushing
/// an object that is already present changes nothing. Objects carrying
/// `"_action": "delete"` remove their counterpart. The `config` endpoint
/// returns the stored objects, so before/after comparisons see real changes.
#[derive(Clone, Default)]
pub struct FakeController {
    state: Arc<Mutex<ControllerState>>,
}

impl FakeController {
    /// Start a server with this controller mounted on every path.
    pub async fn start() -> (MockServer, FakeController) {
        let server = MockServer::start().await;
        let controller = FakeController::default();
        Mock::given(any())
            .respond_with(controller.clone())
            .mount(&server)
            .await;
        (server, controller)
    }

    /// Seed the controller with existing configuration.
    pub fn seed(&self, object: Value) {
        self.state.lock().objects.push(object);
    }

    pub fn objects(&self) -> Vec<Value> {
        self.state.lock().objects.clone()
    }

    pub fn pending(&self) -> u64 {
        self.state.lock().pending
    }

    pub fn commits(&self) -> u32 {
        self.state.lock().commits
    }

    /// Make `write_memory` answer 500.
    pub fn fail_commits(&self) {
        self.state.lock().fail_commit = true;
    }

    /// Make every write report a nested failure with `message`.
    pub fn reject_writes(&self, message: &str) {
        self.state.lock().reject_with = Some(message.to_string());
    }

    /// Make every write fail in the global status with `message`.
    pub fn deny_writes(&self, message: &str) {
        self.state.lock().deny_with = Some(message.to_string());
    }

    /// Make every write answer 400 after applying it.
    pub fn fail_writes_after_applying(&self) {
        self.state.lock().fail_writes = true;
    }

    fn apply(state: &mut ControllerState, body: &Value) {
        let items = match body.get("_list") {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![body.clone()],
        };
        for mut item in items {
            let delete = item.get("_action") == Some(&json!("delete"));
            if let Value::Object(map) = &mut item {
                map.remove("_action");
            }
            if delete {
                let before = state.objects.len();
                state.objects.retain(|o| o != &item);
                if state.objects.len() != before {
                    state.pending += 1;
                }
            } else if !state.objects.contains(&item) {
                state.objects.push(item);
                state.pending += 1;
            }
        }
    }

    fn global(state: &ControllerState) -> Value {
        json!({"status": 0, "status_str": "Success", "_pending": state.pending})
    }
}

impl Respond for FakeController {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let params: Vec<(String, String)> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let path = request.url.path();
        let method = request.method.as_str();

        if method == "GET" && path == "/v1/api/login" {
            return if param("username").as_deref() == Some(USERNAME)
                && param("password").as_deref() == Some(PASSWORD)
            {
                ResponseTemplate::new(200).set_body_json(login_body(TOKEN))
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "_global_result": {"status": "1", "status_str": "Authentication failed"}
                }))
            };
        }

        if method == "GET" && path == "/v1/api/logout" {
            return ResponseTemplate::new(200).set_body_json(json!({
                "_global_result": {"status": "0", "status_str": "You've logged out successfully."}
            }));
        }

        let cookie = request
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        if param("UIDARUBA").as_deref() != Some(TOKEN)
            || cookie.as_deref() != Some(&format!("SESSION={}", TOKEN))
        {
            return ResponseTemplate::new(401).set_body_string("Unauthorized");
        }

        let mut state = self.state.lock();
        match (method, path) {
            ("GET", "/v1/configuration/object/config") => ResponseTemplate::new(200)
                .set_body_json(json!({"_data": {"config": state.objects}})),
            ("GET", "/v1/configuration/object/vlan_id") => {
                let vlans: Vec<&Value> =
                    state.objects.iter().filter(|o| o.get("id").is_some()).collect();
                ResponseTemplate::new(200).set_body_json(json!({"_data": {"vlan_id": vlans}}))
            }
            ("GET", "/v1/configuration/showcommand") => match param("command").as_deref() {
                Some("show version") => ResponseTemplate::new(200)
                    .set_body_json(json!({"_data": ["Aruba Operating System Software."]})),
                _ => ResponseTemplate::new(200).set_body_json(json!({})),
            },
            ("POST", "/v1/configuration/object/write_memory") => {
                if state.fail_commit {
                    return ResponseTemplate::new(500).set_body_string("write failed");
                }
                state.pending = 0;
                state.commits += 1;
                ResponseTemplate::new(200).set_body_json(json!({
                    "write_memory": {"_result": {"status": 0, "status_str": "Success"}},
                    "_global_result": Self::global(&state)
                }))
            }
            ("POST", p) if p.starts_with("/v1/configuration/object") => {
                let body: Value = match serde_json::from_slice(&request.body) {
                    Ok(body) => body,
                    Err(_) => return ResponseTemplate::new(400).set_body_string("bad json"),
                };
                if let Some(message) = state.deny_with.clone() {
                    return ResponseTemplate::new(200).set_body_json(json!({
                        "_global_result": {"status": 1, "status_str": message}
                    }));
                }
                if let Some(message) = state.reject_with.clone() {
                    return ResponseTemplate::new(200).set_body_json(json!({
                        "_global_result": Self::global(&state),
                        "object": {"_result": {"status": 1, "status_str": message}}
                    }));
                }
                Self::apply(&mut state, &body);
                if state.fail_writes {
                    return ResponseTemplate::new(400)
                        .set_body_json(json!({"Error": "partially applied"}));
                }
                ResponseTemplate::new(200).set_body_json(json!({
                    "_global_result": Self::global(&state)
                }))
            }
            _ => ResponseTemplate::new(404).set_body_string("Not Found"),
        }
    }
}

// ============================================================================
// Client Helpers
// ============================================================================

/// Client talking plain HTTP to a mock server.
pub fn api_for(server: &MockServer) -> AosApi {
    let config = HostConfig::new("127.0.0.1").use_ssl(false).timeout(5);
    let transport = HttpTransport::with_base_url(config, server.uri());
    AosApi::new(HttpApi::new(Arc::new(transport)))
}

pub fn credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD)
}

/// Module context with a logged-in session against `server`.
pub async fn logged_in_context(server: &MockServer) -> ModuleContext {
    let api = api_for(server);
    let mut context = ModuleContext::new(api.clone());
    api.login(&mut context.session, &credentials())
        .await
        .expect("login should succeed");
    context
}

/// Build module parameters from a JSON object.
pub fn params(value: Value) -> ModuleParams {
    serde_json::from_value(value).expect("params must be a JSON object")
}
