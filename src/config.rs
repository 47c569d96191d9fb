//! API description config (YAML).
//!
//! The config declares the document info, servers, the path/operation surface
//! and an optional global authorization spec. Schemas are referenced by Go
//! struct name and resolved against the source file at build time.

use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Top-level config document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub info: InfoConfig,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    /// Raw path template -> method -> operation
    #[serde(default)]
    pub paths: BTreeMap<String, BTreeMap<String, EndpointSpec>>,
    #[serde(default)]
    pub authorization: Option<AuthorizationSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One operation under a path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointSpec {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Struct name of the JSON request body
    #[serde(rename = "requestBody", default)]
    pub request_body: Option<String>,
    #[serde(default)]
    pub parameter: Option<ParameterSpec>,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    /// Status code -> response
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseSpec>,
    /// Whether the operation requires the global security schemes
    #[serde(default)]
    pub authorization: bool,
    /// Query parameter name -> Go type name
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub description: String,
    /// Struct name of the JSON response body
    #[serde(default)]
    pub schema: String,
}

/// The free-form `parameter` field: either a bare type name or a full definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSpec {
    Inline(String),
    Object(ObjectParameter),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectParameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "in", default)]
    pub location: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Struct name or Go scalar type name
    #[serde(default)]
    pub schema: Option<String>,
}

/// An explicitly declared parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub param_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Global authorization; `types[i]` pairs with `schemes[i]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationSpec {
    /// Header or query parameter name for apiKey schemes
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    #[serde(rename = "scheme", default)]
    pub schemes: Vec<String>,
    /// apiKey location (`header` or `query`)
    #[serde(rename = "in", default)]
    pub location: Option<String>,
}

impl ApiConfig {
    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(path, &content)
    }

    /// Parses config text; `path` is only used for diagnostics.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let config: ApiConfig =
            serde_yaml::from_str(content).map_err(|e| Error::config(path, e))?;
        debug!(
            "Config declares {} paths, {} servers",
            config.paths.len(),
            config.servers.len()
        );
        Ok(config)
    }

    /// Total number of operations across all paths
    pub fn endpoint_count(&self) -> usize {
        self.paths.values().map(BTreeMap::len).sum()
    }
}
