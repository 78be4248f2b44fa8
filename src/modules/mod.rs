//! Module system for rustible-aos
//!
//! Modules turn a declarative parameter map into configuration operations
//! against a controller. Each module parses its parameters into a typed
//! struct before any request is issued, then runs through the
//! [`AosApi`](crate::client::AosApi) held by the [`ModuleContext`].

pub mod aos_api_config;
pub mod aos_cap_whitelist;
pub mod aos_show_command;
pub mod aos_vlan;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, Instrument};

use crate::client::{AosApi, ClientError};
use crate::httpapi::{ApiResponse, Session};
use crate::telemetry::spans::{create_module_span, SpanExt};

/// Errors that stop a module before it produces an output. A controller
/// rejecting a change is not one of these; it yields a failed [`ModuleOutput`].
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result type for module operations
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Outcome reported by a module run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// The controller's configuration differs from before the run
    Changed,
    /// Nothing changed
    Ok,
    /// The controller rejected the operation
    Failed,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::Changed => write!(f, "changed"),
            ModuleStatus::Ok => write!(f, "ok"),
            ModuleStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of a module execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleOutput {
    /// Whether the module changed anything
    pub changed: bool,
    /// Human-readable message about what happened
    pub msg: String,
    /// Status of the execution
    pub status: ModuleStatus,
    /// Additional data returned by the module
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, Value>,
}

impl ModuleOutput {
    fn with_status(changed: bool, msg: impl Into<String>, status: ModuleStatus) -> Self {
        Self {
            changed,
            msg: msg.into(),
            status,
            data: HashMap::new(),
        }
    }

    /// Create a new successful output with no changes
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::with_status(false, msg, ModuleStatus::Ok)
    }

    /// Create a new successful output with changes
    pub fn changed(msg: impl Into<String>) -> Self {
        Self::with_status(true, msg, ModuleStatus::Changed)
    }

    /// Successful output, changed or not
    pub fn succeeded(changed: bool, msg: impl Into<String>) -> Self {
        if changed {
            Self::changed(msg)
        } else {
            Self::ok(msg)
        }
    }

    /// Create a failed output
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::with_status(false, msg, ModuleStatus::Failed)
    }

    /// Failed output for a client error raised after an earlier request of
    /// the same run changed configuration. The change stays recorded.
    pub fn failed_after_change(err: &ClientError) -> Self {
        Self::failed(err.to_string()).with_changed(true)
    }

    /// Record that configuration changed even though the module failed
    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    /// Add data to the output
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Attach a controller response as `response` / `response_code`
    pub fn with_response(self, response: &ApiResponse) -> Self {
        self.with_data("response", response.body.clone().into_value())
            .with_data("response_code", Value::from(response.code))
    }

    /// Whether the module reported failure
    pub fn is_failed(&self) -> bool {
        self.status == ModuleStatus::Failed
    }

    /// Turn a failed output into [`Error::ModuleFailed`](crate::error::Error::ModuleFailed)
    /// for callers that stop at the first failure.
    pub fn into_result(self, module: &str) -> crate::error::Result<Self> {
        if self.is_failed() {
            Err(crate::error::Error::module_failed(module, self.msg, self.changed))
        } else {
            Ok(self)
        }
    }
}

/// Parameters passed to a module
pub type ModuleParams = HashMap<String, Value>;

/// Controller access for a module run.
#[derive(Debug)]
pub struct ModuleContext {
    /// Transaction client
    pub api: AosApi,
    /// Session every request of the run is issued on
    pub session: Session,
}

impl ModuleContext {
    /// Context with a fresh, unauthenticated session
    pub fn new(api: AosApi) -> Self {
        let session = api.open_session();
        Self { api, session }
    }

    /// Context reusing an existing session
    pub fn with_session(api: AosApi, session: Session) -> Self {
        Self { api, session }
    }
}

/// A named controller operation driven by a parameter map.
#[async_trait]
pub trait Module: Send + Sync {
    /// Registry name, e.g. `aos_vlan`
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Run against the controller behind `context`. All requests go through
    /// `context.session`.
    async fn execute(
        &self,
        params: &ModuleParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput>;

    /// Checked by the registry before `execute`, so bad parameters never
    /// reach the controller.
    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let _ = params;
        Ok(())
    }

    /// Parameters that must be present and non-null
    fn required_params(&self) -> &[&'static str] {
        &[]
    }
}

/// Typed accessors over [`ModuleParams`]. Scalars are accepted in their
/// string spellings, as playbooks often quote them.
pub trait ParamExt {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>>;
    fn get_string_required(&self, key: &str) -> ModuleResult<String>;
    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>>;
    fn get_bool_or(&self, key: &str, default: bool) -> bool;
    fn get_u64(&self, key: &str) -> ModuleResult<Option<u64>>;
    fn get_object_list(&self, key: &str) -> ModuleResult<Vec<Value>>;
}

impl ParamExt for ModuleParams {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a string",
                key
            ))),
        }
    }

    fn get_string_required(&self, key: &str) -> ModuleResult<String> {
        self.get_string(key)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ModuleError::MissingParameter(key.to_string()))
    }

    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(ModuleError::InvalidParameter(format!(
                    "{} must be a boolean",
                    key
                ))),
            },
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a boolean",
                key
            ))),
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).ok().flatten().unwrap_or(default)
    }

    fn get_u64(&self, key: &str) -> ModuleResult<Option<u64>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
                ModuleError::InvalidParameter(format!("{} must be a non-negative integer", key))
            }),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| {
                ModuleError::InvalidParameter(format!("{} must be a non-negative integer", key))
            }),
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a non-negative integer",
                key
            ))),
        }
    }

    fn get_object_list(&self, key: &str) -> ModuleResult<Vec<Value>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => {
                if let Some(position) = items.iter().position(|item| !item.is_object()) {
                    return Err(ModuleError::InvalidParameter(format!(
                        "{}[{}] must be an object",
                        key, position
                    )));
                }
                Ok(items.clone())
            }
            Some(obj @ Value::Object(_)) => Ok(vec![obj.clone()]),
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a list of objects",
                key
            ))),
        }
    }
}

/// Registry for looking up modules by name
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Create a registry with all built-in modules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(aos_api_config::AosApiConfigModule));
        registry.register(Arc::new(aos_show_command::AosShowCommandModule));
        registry.register(Arc::new(aos_cap_whitelist::AosCapWhitelistModule));
        registry.register(Arc::new(aos_vlan::AosVlanModule));
        registry
    }

    /// Register a module
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.insert(module.name().to_string(), module);
    }

    /// Get a module by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    /// Check if a module exists
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Get all module names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a module by name
    pub async fn execute(
        &self,
        name: &str,
        params: &ModuleParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let module = self
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;

        for param in module.required_params() {
            if matches!(params.get(*param), None | Some(Value::Null)) {
                return Err(ModuleError::MissingParameter((*param).to_string()));
            }
        }
        module.validate_params(params)?;

        let span = create_module_span(name, context.session.endpoint());
        let result = module
            .execute(params, context)
            .instrument(span.clone())
            .await;

        match &result {
            Ok(output) if output.is_failed() => span.record_failed(&output.msg),
            Ok(output) if output.changed => span.record_changed(),
            Ok(_) => span.record_ok(),
            Err(e) => span.record_error(e),
        }
        if let Ok(output) = &result {
            debug!(module = %name, status = %output.status, changed = output.changed, "Module finished");
        }

        result
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
