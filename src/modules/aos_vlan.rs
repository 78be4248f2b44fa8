//! VLAN module
//!
//! Lists, creates and deletes VLAN IDs and named VLANs.
//!
//! ## Parameters
//!
//! - `action`: get, create or delete (required)
//! - `config_path`: hierarchy node, e.g. `/md/Boston` (required)
//! - `vlan_id`: a VLAN ID or a list of VLAN IDs
//! - `vlan_name`: name of a named VLAN
//! - `type`: for get, `all` (default) or `named_vlan`
//!
//! Creating a named VLAN that already exists replaces its ID mapping; VLANs
//! previously mapped to it become unnamed.
//!
//! ```yaml
//! - name: Create VLANs 5 and 10
//!   aos_vlan:
//!     action: create
//!     vlan_id: [5, 10]
//!     config_path: /md/Boston
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use crate::client::request::OBJECT_PATH;
use crate::client::{
    validate_config_path, ConfigPush, ObjectQuery, Payload, QueryModifiers, ValidationOutcome,
};
use crate::httpapi::ApiResponse;

const VLAN_ID_OBJECT: &str = "vlan_id";
const VLAN_NAME_ID_OBJECT: &str = "vlan_name_id";

/// Message for a delete naming both a VLAN name and IDs
pub const DELETE_BOTH_MESSAGE: &str = "To delete named VLAN, first delete a valid vlan_name. \
     Then use the vlan_id in a subsequent task if you wish to remove the VLAN ID associated \
     to the named VLAN.";

/// Message for a successful get
pub const GET_MESSAGE: &str = "Response shows the VLANs configured on the given config_path \
     along with the ones inherited from the hierarchy above";

/// Requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanAction {
    Get,
    Create,
    Delete,
}

impl VlanAction {
    fn from_str(s: &str) -> ModuleResult<Self> {
        match s.to_lowercase().as_str() {
            "get" => Ok(VlanAction::Get),
            "create" => Ok(VlanAction::Create),
            "delete" => Ok(VlanAction::Delete),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid action '{}'. Valid options: get, create, delete",
                s
            ))),
        }
    }
}

/// Which VLANs a get lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VlanListType {
    #[default]
    All,
    NamedVlan,
}

impl VlanListType {
    fn from_str(s: &str) -> ModuleResult<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(VlanListType::All),
            "named_vlan" => Ok(VlanListType::NamedVlan),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid type '{}'. Valid options: all, named_vlan",
                s
            ))),
        }
    }

    fn api_object(self) -> &'static str {
        match self {
            VlanListType::All => VLAN_ID_OBJECT,
            VlanListType::NamedVlan => VLAN_NAME_ID_OBJECT,
        }
    }
}

fn parse_vlan_id(value: &Value) -> ModuleResult<u16> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    match id {
        Some(id @ 1..=4094) => Ok(id as u16),
        _ => Err(ModuleError::InvalidParameter(format!(
            "vlan_id {} must be an integer between 1 and 4094",
            value
        ))),
    }
}

/// Parse `vlan_id`: a single ID or a list of IDs.
pub fn parse_vlan_ids(value: Option<&Value>) -> ModuleResult<Vec<u16>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(parse_vlan_id).collect(),
        Some(single) => Ok(vec![parse_vlan_id(single)?]),
    }
}

/// Parsed module parameters
#[derive(Debug, Clone, PartialEq)]
pub struct VlanParams {
    pub action: VlanAction,
    pub config_path: String,
    pub vlan_name: Option<String>,
    pub vlan_ids: Vec<u16>,
    pub list_type: VlanListType,
}

impl VlanParams {
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let action = VlanAction::from_str(&params.get_string_required("action")?)?;
        let config_path = params.get_string_required("config_path")?;
        validate_config_path(&config_path)?;

        let list_type = match params.get_string("type")? {
            Some(t) => VlanListType::from_str(&t)?,
            None => VlanListType::default(),
        };

        let parsed = Self {
            action,
            config_path,
            vlan_name: params.get_string("vlan_name")?.filter(|n| !n.is_empty()),
            vlan_ids: parse_vlan_ids(params.get("vlan_id"))?,
            list_type,
        };

        match parsed.action {
            VlanAction::Create if parsed.vlan_ids.is_empty() => Err(ModuleError::MissingParameter(
                "vlan_id is required to create VLANs".to_string(),
            )),
            VlanAction::Delete if parsed.vlan_ids.is_empty() && parsed.vlan_name.is_none() => {
                Err(ModuleError::MissingParameter(
                    "vlan_id or vlan_name is required to delete VLANs".to_string(),
                ))
            }
            _ => Ok(parsed),
        }
    }

    fn id_list(&self) -> String {
        self.vlan_ids
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn vlan_id_push(&self, object: Value) -> ModuleResult<ConfigPush> {
        Ok(ConfigPush::new(
            format!("{}/{}", OBJECT_PATH, VLAN_ID_OBJECT),
            Some(self.config_path.clone()),
            Payload::single(object),
        )?)
    }

    /// Pushes needed for a create or delete, in order
    pub fn pushes(&self) -> ModuleResult<Vec<ConfigPush>> {
        match (self.action, &self.vlan_name) {
            (VlanAction::Create, Some(name)) => {
                let ids = self.id_list();
                let data = json!({
                    "vlan_name": [{"_action": "modify", "name": name}],
                    "vlan_range": {"_action": "modify", "WORD": ids},
                    "vlan_name_id": [{"_action": "modify", "name": name, "vlan-ids": ids}]
                });
                Ok(vec![ConfigPush::object(
                    self.config_path.clone(),
                    Payload::single(data),
                )?])
            }
            (VlanAction::Create, None) => self
                .vlan_ids
                .iter()
                .map(|id| self.vlan_id_push(json!({"id": id})))
                .collect(),
            (VlanAction::Delete, Some(name)) => {
                let data = json!({
                    "vlan_name_id": [{"_action": "delete", "name": name}],
                    "vlan_name": [{"_action": "delete", "name": name}]
                });
                Ok(vec![ConfigPush::object(
                    self.config_path.clone(),
                    Payload::single(data),
                )?])
            }
            (VlanAction::Delete, None) => self
                .vlan_ids
                .iter()
                .map(|id| self.vlan_id_push(json!({"id": id, "_action": "delete"})))
                .collect(),
            (VlanAction::Get, _) => Ok(Vec::new()),
        }
    }
}

/// Module for managing VLANs
pub struct AosVlanModule;

impl AosVlanModule {
    async fn list(&self, params: &VlanParams, context: &mut ModuleContext) -> ModuleResult<ModuleOutput> {
        let query = ObjectQuery::new(
            params.list_type.api_object(),
            QueryModifiers::for_path(params.config_path.clone()),
        )?;
        let response = context.api.get_object(&mut context.session, &query).await?;

        let output = if response.body.contains_key("_data") {
            ModuleOutput::ok(GET_MESSAGE)
        } else {
            ModuleOutput::failed("Response carries no VLAN data")
        };
        Ok(output.with_response(&response))
    }

    async fn apply(&self, params: &VlanParams, context: &mut ModuleContext) -> ModuleResult<ModuleOutput> {
        let mut changed = false;
        let mut responses = Vec::new();
        let mut failures = Vec::new();

        for push in params.pushes()? {
            let (response, push_changed) = match context.api.post(&mut context.session, &push).await {
                Ok(pushed) => pushed,
                Err(err) if changed => {
                    let output = ModuleOutput::failed_after_change(&err);
                    return Ok(Self::attach_responses(output, params, &responses));
                }
                Err(err) => return Err(err.into()),
            };
            changed |= push_changed;
            let outcome = ValidationOutcome::from_body(&response.body);
            if !outcome.success {
                failures.push(outcome.message);
            }
            responses.push(response);
        }

        let output = if failures.is_empty() {
            ModuleOutput::succeeded(changed, "")
        } else {
            ModuleOutput::failed(failures.join(", ")).with_changed(changed)
        };
        Ok(Self::attach_responses(output, params, &responses))
    }

    // Named operations send one request; per-ID operations report a list
    fn attach_responses(output: ModuleOutput, params: &VlanParams, responses: &[ApiResponse]) -> ModuleOutput {
        match (params.vlan_name.is_some(), responses.last()) {
            (true, Some(response)) => output.with_response(response),
            (false, Some(last)) => output
                .with_data(
                    "response",
                    Value::Array(
                        responses
                            .iter()
                            .map(|r| r.body.clone().into_value())
                            .collect(),
                    ),
                )
                .with_data("response_code", Value::from(last.code)),
            (_, None) => output,
        }
    }
}

#[async_trait]
impl Module for AosVlanModule {
    fn name(&self) -> &'static str {
        "aos_vlan"
    }

    fn description(&self) -> &'static str {
        "Get, create and delete VLANs and named VLANs"
    }

    fn required_params(&self) -> &[&'static str] {
        &["action", "config_path"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        VlanParams::from_params(params).map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let params = VlanParams::from_params(params)?;

        match params.action {
            VlanAction::Get => self.list(&params, context).await,
            VlanAction::Delete if params.vlan_name.is_some() && !params.vlan_ids.is_empty() => {
                Ok(ModuleOutput::failed(DELETE_BOTH_MESSAGE))
            }
            VlanAction::Create | VlanAction::Delete => self.apply(&params, context).await,
        }
    }
}
