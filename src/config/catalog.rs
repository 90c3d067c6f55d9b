//! API endpoint catalog configuration.
//!
//! ```yaml
//! conexResourceId: res-42
//! serviceName: users
//! serviceTitle: User service
//! endpoints:
//!   - name: getUser
//!     url: /users/{id}
//!     method: GET
//!     auth: true
//!     retry: 2
//!     cache: true
//!     requestSchema:
//!       id:
//!         required: true
//!         type: integer
//! ```

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::form::ValidationBlock;
use super::{load_yaml, read_document, validator::ConfigValidator, LoadError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conex_resource_id: Option<String>,
    #[serde(default)]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl ApiCatalog {
    /// Parse an endpoint catalog from YAML text and validate it.
    pub fn from_yaml(text: &str) -> Result<Self, LoadError> {
        let catalog: ApiCatalog = load_yaml(text)?;
        ConfigValidator::validate_catalog(&catalog).map_err(LoadError::Invalid)?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::from_yaml(&read_document(path)?)
    }

    /// Exact-name lookup.
    pub fn find(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Consume the catalog into a name → endpoint mapping (declaration order).
    pub fn into_endpoint_map(self) -> IndexMap<String, EndpointConfig> {
        self.endpoints
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect()
    }
}

/// One declarative REST call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub name: String,
    /// URL template; `{field}` placeholders are filled from the payload
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, alias = "requiresAuth")]
    pub auth: bool,
    /// Additional attempts after a failed dispatch
    #[serde(default)]
    pub retry: u32,
    #[serde(default)]
    pub mock: bool,
    #[serde(default)]
    pub cache: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_schema: IndexMap<String, FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method,
            auth: false,
            retry: 0,
            mock: false,
            cache: false,
            request_schema: IndexMap::new(),
            description: None,
        }
    }
}

/// HTTP verb; parsed case-insensitively from YAML
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(format!(
                "unknown HTTP method `{}`, expected one of GET, POST, PUT, PATCH, DELETE",
                s
            )),
        }
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the payload travels as a JSON body rather than a query string.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-schema entry for one payload field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
