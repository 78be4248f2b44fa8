//! Control-plane security AP whitelist module
//!
//! Adds or removes an AP's MAC address from the CPsec whitelist.
//!
//! ## Parameters
//!
//! - `action`: add or delete (required)
//! - `mac_address`: AP MAC address (required)
//! - `ap_name`, `ap_group`, `description`: entry details for add
//! - `config_path`: hierarchy node the entry belongs to
//!
//! ```yaml
//! - name: Whitelist an AP
//!   aos_cap_whitelist:
//!     action: add
//!     mac_address: "00:1a:1e:00:11:22"
//!     ap_group: default
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{
    Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use crate::client::validate::{is_zero_status, GLOBAL_RESULT_KEY};
use crate::client::{validate_config_path, ConfigPush, Payload};
use crate::httpapi::ApiResponse;

const ADD_PATH: &str = "/configuration/object/wdb_cpsec_add_mac";
const DELETE_PATH: &str = "/configuration/object/wdb_cpsec_del_mac";

/// Whitelist action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistAction {
    Add,
    Delete,
}

impl WhitelistAction {
    fn from_str(s: &str) -> ModuleResult<Self> {
        match s.to_lowercase().as_str() {
            "add" => Ok(WhitelistAction::Add),
            "delete" => Ok(WhitelistAction::Delete),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid action '{}'. Valid options: add, delete",
                s
            ))),
        }
    }

    /// Endpoint the action posts to
    pub fn path(self) -> &'static str {
        match self {
            WhitelistAction::Add => ADD_PATH,
            WhitelistAction::Delete => DELETE_PATH,
        }
    }
}

/// Normalize a MAC address to lowercase, colon-separated form.
pub fn normalize_mac(mac: &str) -> ModuleResult<String> {
    let octets: Vec<&str> = mac.trim().split([':', '-']).collect();
    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ModuleError::InvalidParameter(format!(
            "mac_address '{}' is not a valid MAC address",
            mac
        )));
    }
    Ok(octets.join(":").to_lowercase())
}

/// Parsed module parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CapWhitelistParams {
    pub action: WhitelistAction,
    pub mac_address: String,
    pub ap_name: Option<String>,
    pub ap_group: Option<String>,
    pub description: Option<String>,
    pub config_path: Option<String>,
}

impl CapWhitelistParams {
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let config_path = params.get_string("config_path")?;
        if let Some(path) = &config_path {
            validate_config_path(path)?;
        }

        Ok(Self {
            action: WhitelistAction::from_str(&params.get_string_required("action")?)?,
            mac_address: normalize_mac(&params.get_string_required("mac_address")?)?,
            ap_name: params.get_string("ap_name")?,
            ap_group: params.get_string("ap_group")?,
            description: params.get_string("description")?,
            config_path,
        })
    }

    /// Object posted for this action
    pub fn payload(&self) -> Value {
        let mut object = Map::new();
        if self.action == WhitelistAction::Add {
            for (key, value) in [
                ("description", &self.description),
                ("ap_name", &self.ap_name),
                ("ap_group", &self.ap_group),
            ] {
                if let Some(value) = value {
                    object.insert(key.to_string(), Value::String(value.clone()));
                }
            }
        }
        object.insert("name".to_string(), Value::String(self.mac_address.clone()));
        Value::Object(object)
    }
}

/// The whitelist endpoints always answer with a global envelope; a body
/// without one is a failure.
fn global_status_ok(response: &ApiResponse) -> bool {
    response
        .body
        .get(GLOBAL_RESULT_KEY)
        .and_then(|g| g.get("status"))
        .is_some_and(|status| is_zero_status(Some(status)))
}

fn global_status_str(response: &ApiResponse) -> String {
    response
        .body
        .get(GLOBAL_RESULT_KEY)
        .and_then(|g| g.get("status_str"))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("Unexpected response: {}", response.body))
}

/// Module for managing the CPsec AP whitelist
pub struct AosCapWhitelistModule;

#[async_trait]
impl Module for AosCapWhitelistModule {
    fn name(&self) -> &'static str {
        "aos_cap_whitelist"
    }

    fn description(&self) -> &'static str {
        "Add or delete APs on the control-plane security whitelist"
    }

    fn required_params(&self) -> &[&'static str] {
        &["action", "mac_address"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        CapWhitelistParams::from_params(params).map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let params = CapWhitelistParams::from_params(params)?;
        let push = ConfigPush::new(
            params.action.path(),
            params.config_path.clone(),
            Payload::single(params.payload()),
        )?;

        let (response, changed) = context.api.post(&mut context.session, &push).await?;

        let output = if global_status_ok(&response) {
            ModuleOutput::succeeded(changed, "")
        } else {
            ModuleOutput::failed(global_status_str(&response))
        };
        Ok(output.with_response(&response))
    }
}
