//! Typed configuration requests.
//!
//! Requests are validated when they are built, so a malformed object name or
//! config path is rejected before any traffic reaches the controller.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ClientError;

/// Object endpoint prefix
pub const OBJECT_PATH: &str = "/configuration/object";

/// Check that a hierarchical config path is usable (`/md`, `/mm/mynode`, ...)
pub fn validate_config_path(config_path: &str) -> Result<(), ClientError> {
    if config_path.is_empty() {
        return Err(ClientError::InvalidRequest(
            "config_path must not be empty".to_string(),
        ));
    }
    if !config_path.starts_with('/') {
        return Err(ClientError::InvalidRequest(format!(
            "config_path '{}' must be an absolute path such as /md",
            config_path
        )));
    }
    Ok(())
}

/// Optional modifiers for object reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryModifiers {
    /// Node in the configuration hierarchy
    pub config_path: Option<String>,
    /// Filter expression, JSON-encoded into the query string
    pub filter: Option<Value>,
    /// Sort key
    pub sort: Option<String>,
    /// Attribute to count
    pub count: Option<String>,
    /// Page size
    pub limit: Option<u64>,
    /// Page offset
    pub offset: Option<u64>,
    /// Cap on the number of results
    pub total: Option<u64>,
}

impl QueryModifiers {
    /// Modifiers scoped to a config path
    pub fn for_path(config_path: impl Into<String>) -> Self {
        Self {
            config_path: Some(config_path.into()),
            ..Self::default()
        }
    }

    /// Set the filter expression
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the sort key
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Set the count attribute
    pub fn count(mut self, count: impl Into<String>) -> Self {
        self.count = Some(count.into());
        self
    }

    /// Set the page size
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the result cap
    pub fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Query parameters for the modifiers that are present, in a fixed order.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(config_path) = &self.config_path {
            params.push(("config_path", config_path.clone()));
        }
        if let Some(filter) = &self.filter {
            params.push(("filter", filter.to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(count) = &self.count {
            params.push(("count", count.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        if let Some(total) = self.total {
            params.push(("total", total.to_string()));
        }
        params
    }
}

/// Read of a single configuration object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectQuery {
    api_object: String,
    modifiers: QueryModifiers,
}

impl ObjectQuery {
    /// Build a query for `api_object` (e.g. `vlan_id`, `ap_group`).
    pub fn new(api_object: impl Into<String>, modifiers: QueryModifiers) -> Result<Self, ClientError> {
        let api_object = api_object.into();
        if api_object.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "api_object must not be empty".to_string(),
            ));
        }
        if api_object.contains(['/', '?', '&']) {
            return Err(ClientError::InvalidRequest(format!(
                "api_object '{}' must be a bare object name",
                api_object
            )));
        }
        if let Some(config_path) = &modifiers.config_path {
            validate_config_path(config_path)?;
        }
        Ok(Self {
            api_object,
            modifiers,
        })
    }

    /// Object name
    pub fn api_object(&self) -> &str {
        &self.api_object
    }

    /// Query modifiers
    pub fn modifiers(&self) -> &QueryModifiers {
        &self.modifiers
    }

    /// Endpoint path, relative to the API version prefix
    pub fn path(&self) -> String {
        format!("{}/{}", OBJECT_PATH, self.api_object)
    }
}

/// Body of a configuration write.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `{}`
    Empty,
    /// One or more configuration objects
    Objects(Vec<Value>),
}

impl Payload {
    /// Payload made of the given objects
    pub fn from_objects(objects: Vec<Value>) -> Self {
        Payload::Objects(objects)
    }

    /// Payload made of a single object
    pub fn single(object: Value) -> Self {
        Payload::Objects(vec![object])
    }

    /// Empty object payload
    pub fn empty() -> Self {
        Payload::Empty
    }

    /// Wire form: a single object is sent as-is, anything else is wrapped
    /// as `{"_list": [...]}`.
    pub fn to_json(&self) -> Value {
        match self {
            Payload::Empty => json!({}),
            Payload::Objects(objects) if objects.len() == 1 => objects[0].clone(),
            Payload::Objects(objects) => json!({ "_list": objects }),
        }
    }
}

/// A configuration write together with the hierarchy node it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPush {
    url: String,
    config_path: Option<String>,
    payload: Payload,
}

impl ConfigPush {
    /// Build a write to `url` (relative to the API version prefix, e.g.
    /// `/configuration/object/vlan_id`).
    pub fn new(
        url: impl Into<String>,
        config_path: Option<String>,
        payload: Payload,
    ) -> Result<Self, ClientError> {
        let url = url.into();
        if !url.starts_with('/') || url.contains('?') {
            return Err(ClientError::InvalidRequest(format!(
                "write url '{}' must be an absolute path without a query string",
                url
            )));
        }
        if let Some(config_path) = &config_path {
            validate_config_path(config_path)?;
        }
        Ok(Self {
            url,
            config_path,
            payload,
        })
    }

    /// Write to the generic object endpoint
    pub fn object(config_path: impl Into<String>, payload: Payload) -> Result<Self, ClientError> {
        Self::new(OBJECT_PATH, Some(config_path.into()), payload)
    }

    /// Write endpoint path
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hierarchy node the write applies to
    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// Request body
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Query parameters the write is sent with
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        self.config_path
            .iter()
            .map(|path| ("config_path", path.clone()))
            .collect()
    }
}
