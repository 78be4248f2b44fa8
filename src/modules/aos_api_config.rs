//! Generic configuration object module
//!
//! Reads any configuration object with GET, or pushes a list of objects with
//! POST. Pushes go through the idempotent write path, so `changed` reflects
//! whether the node's configuration actually moved. With `commit: true`,
//! pending changes are written to startup configuration afterwards.
//!
//! ## Parameters
//!
//! - `method`: GET or POST (required)
//! - `config_path`: hierarchy node, e.g. `/md/Boston` (required)
//! - `api_object`: object name for GET, e.g. `vlan_id`
//! - `data`: list of objects to push for POST
//! - `commit`: write pending changes to startup configuration (default false)
//! - `filter`, `sort`, `count`, `limit`, `offset`, `total`: GET modifiers
//!
//! ## Example
//!
//! ```yaml
//! - name: Create VLAN 5 and commit
//!   aos_api_config:
//!     method: POST
//!     config_path: /md/Boston
//!     commit: true
//!     data:
//!       - vlan_id:
//!           id: 5
//! ```

use async_trait::async_trait;
use serde_json::Value;

use super::{
    Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use crate::client::{
    validate_config_path, AosApi, ConfigPush, ObjectQuery, Payload, QueryModifiers,
    ValidationOutcome,
};
use crate::httpapi::ResponseBody;

/// Message for a GET that returned nothing
pub const EMPTY_GET_MESSAGE: &str = "Check if valid parameters are provided in the playbook.";

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
}

impl ApiMethod {
    fn from_str(s: &str) -> ModuleResult<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(ApiMethod::Get),
            "POST" => Ok(ApiMethod::Post),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid method type '{}'. Only GET and POST methods are supported on \
                 Aruba Mobility Master and Controllers",
                s
            ))),
        }
    }
}

/// Parsed module parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfigParams {
    pub method: ApiMethod,
    pub config_path: String,
    pub api_object: Option<String>,
    pub data: Vec<Value>,
    pub commit: bool,
    pub modifiers: QueryModifiers,
}

impl ApiConfigParams {
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let method = ApiMethod::from_str(&params.get_string_required("method")?)?;
        let config_path = params.get_string_required("config_path")?;
        validate_config_path(&config_path)?;

        let api_object = params.get_string("api_object")?;
        let data = params.get_object_list("data")?;

        match method {
            ApiMethod::Get if api_object.is_none() => {
                return Err(ModuleError::MissingParameter(
                    "api_object is required for GET".to_string(),
                ));
            }
            ApiMethod::Post if data.is_empty() => {
                return Err(ModuleError::MissingParameter(
                    "data is required for POST".to_string(),
                ));
            }
            _ => {}
        }

        // An empty filter list means no filter
        let filter = match params.get("filter") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(filter) => Some(filter.clone()),
        };

        let modifiers = QueryModifiers {
            config_path: Some(config_path.clone()),
            filter,
            sort: params.get_string("sort")?,
            count: params.get_string("count")?,
            limit: params.get_u64("limit")?,
            offset: params.get_u64("offset")?,
            total: params.get_u64("total")?,
        };

        Ok(Self {
            method,
            config_path,
            api_object,
            data,
            commit: params.get_bool("commit")?.unwrap_or(false),
            modifiers,
        })
    }
}

/// Module for reading and pushing arbitrary configuration objects
pub struct AosApiConfigModule;

impl AosApiConfigModule {
    async fn read(
        &self,
        params: &ApiConfigParams,
        api_object: &str,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let query = ObjectQuery::new(api_object, params.modifiers.clone())?;
        let response = context.api.get_object(&mut context.session, &query).await?;

        let output = match &response.body {
            ResponseBody::Json(Value::Null) => ModuleOutput::failed(EMPTY_GET_MESSAGE),
            _ => ModuleOutput::ok(""),
        };
        Ok(output.with_response(&response))
    }

    async fn push(
        &self,
        params: &ApiConfigParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let push = ConfigPush::object(
            params.config_path.clone(),
            Payload::from_objects(params.data.clone()),
        )?;
        let (response, changed) = context.api.post(&mut context.session, &push).await?;

        if response.code != 200 {
            return Ok(ModuleOutput::failed(format!(
                "Unexpected response code {}",
                response.code
            ))
            .with_changed(changed)
            .with_response(&response));
        }

        let outcome = if response.body.is_empty() {
            None
        } else {
            Some(ValidationOutcome::from_body(&response.body))
        };
        let message = outcome
            .as_ref()
            .map(|o| o.message.clone())
            .unwrap_or_default();
        let failed = outcome.as_ref().is_some_and(|o| !o.success);

        let mut output = if failed {
            ModuleOutput::failed(message).with_changed(changed)
        } else {
            ModuleOutput::succeeded(changed, message)
        };

        if let Some(outcome) = &outcome {
            if params.commit && outcome.pending != 0 {
                match context
                    .api
                    .write_mem(&mut context.session, &params.config_path)
                    .await
                {
                    Ok(committed) => {
                        output = output.with_data("committed", Value::Bool(committed));
                    }
                    Err(err) if changed => output = ModuleOutput::failed_after_change(&err),
                    Err(err) => return Err(err.into()),
                }
            }
        }

        Ok(output.with_response(&response))
    }
}

#[async_trait]
impl Module for AosApiConfigModule {
    fn name(&self) -> &'static str {
        "aos_api_config"
    }

    fn description(&self) -> &'static str {
        "Read or push configuration objects through the ArubaOS REST API"
    }

    fn required_params(&self) -> &[&'static str] {
        &["method", "config_path"]
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        ApiConfigParams::from_params(params).map(|_| ())
    }

    async fn execute(
        &self,
        params: &ModuleParams,
        context: &mut ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let params = ApiConfigParams::from_params(params)?;

        match (params.method, params.api_object.as_deref()) {
            (ApiMethod::Get, Some(api_object)) => self.read(&params, api_object, context).await,
            (ApiMethod::Get, None) => Err(ModuleError::MissingParameter(
                "api_object is required for GET".to_string(),
            )),
            (ApiMethod::Post, _) => self.push(&params, context).await,
        }
    }
}

/// Read URL a GET with these parameters would use
pub fn read_url(params: &ApiConfigParams) -> ModuleResult<String> {
    let api_object = params
        .api_object
        .as_deref()
        .ok_or_else(|| ModuleError::MissingParameter("api_object".to_string()))?;
    let query = ObjectQuery::new(api_object, params.modifiers.clone())?;
    Ok(AosApi::get_url(&query.path(), &query.modifiers().query_params()))
}
