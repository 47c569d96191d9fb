//! Serde model of the emitted OpenAPI 3.0 document.
//!
//! Maps are ordered so that repeated runs produce identical JSON.

use crate::schema_generator::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenAPI version literal written into every document
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Content type used for every request and response body
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Security requirement: scheme name -> scopes. An empty map means "no auth".
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// Lower-cased HTTP method -> operation
pub type PathItem = BTreeMap<String, Operation>;

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Document-wide security default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

/// An `http` or `apiKey` security scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    /// HTTP auth scheme (`bearer`, `basic`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// apiKey header or query parameter name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// apiKey location
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// `Some(vec![{}])` explicitly opts the operation out of global security
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// `{"application/json": {"schema": ...}}`
pub fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    BTreeMap::from([(JSON_CONTENT_TYPE.to_string(), MediaType { schema })])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_security_requirement_serializes_as_empty_object() {
        let operation = Operation {
            security: Some(vec![SecurityRequirement::new()]),
            ..Operation::default()
        };

        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(value, json!({"security": [{}], "responses": {}}));
    }

    #[test]
    fn test_optional_sections_are_omitted() {
        let doc = OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: "T".to_string(),
                version: "1".to_string(),
                description: None,
            },
            servers: Vec::new(),
            security: Vec::new(),
            paths: BTreeMap::new(),
            components: Components::default(),
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {},
                "components": {"schemas": {}}
            })
        );
    }

    #[test]
    fn test_json_content_wraps_schema() {
        let content = json_content(Schema::reference("Pet"));
        let value = serde_json::to_value(&content).unwrap();

        assert_eq!(
            value,
            json!({"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}})
        );
    }
}
