use crate::config::{
    ApiConfig, AuthorizationSpec, EndpointSpec, InfoConfig, ParameterDecl, ParameterSpec,
    ServerConfig,
};
use crate::document::{
    json_content, Components, Info, OpenApiDocument, Operation, Parameter, PathItem, RequestBody,
    Response, SecurityRequirement, SecurityScheme, Server, OPENAPI_VERSION,
};
use crate::schema_generator::{Schema, SchemaRegistry};
use crate::type_resolver::ScalarType;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};

/// Declared paths as they appear in the config: raw template -> method -> operation
pub type PathMap = BTreeMap<String, BTreeMap<String, EndpointSpec>>;

/// Types an explicit parameter may already be written in
const OPENAPI_PRIMITIVES: &[&str] = &["string", "integer", "number", "boolean", "object", "array"];

/// OpenAPI document builder
pub struct OpenApiBuilder {
    info: Info,
    servers: Vec<Server>,
    /// Security scheme key -> scheme
    security_schemes: BTreeMap<String, SecurityScheme>,
    /// Raw path template -> method -> operation
    paths: PathMap,
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info::default(),
            servers: Vec::new(),
            security_schemes: BTreeMap::new(),
            paths: BTreeMap::new(),
        }
    }

    /// Builder pre-populated with every section of `config`.
    pub fn from_config(config: &ApiConfig) -> Self {
        let mut builder = Self::new()
            .with_info(&config.info)
            .with_servers(&config.servers)
            .with_authorization(config.authorization.as_ref());
        for (path, methods) in &config.paths {
            builder.add_path(path, methods);
        }
        builder
    }

    pub fn with_info(mut self, info: &InfoConfig) -> Self {
        self.info = Info {
            title: info.title.clone(),
            version: info.version.clone(),
            description: non_empty(info.description.as_deref()),
        };
        self
    }

    pub fn with_servers(mut self, servers: &[ServerConfig]) -> Self {
        self.servers = servers
            .iter()
            .map(|server| Server {
                url: server.url.clone(),
                description: non_empty(server.description.as_deref()),
            })
            .collect();
        self
    }

    pub fn with_authorization(mut self, auth: Option<&AuthorizationSpec>) -> Self {
        self.security_schemes = auth.map(build_security_schemes).unwrap_or_default();
        self
    }

    /// Register the methods of one raw path template. Re-adding a template merges methods.
    pub fn add_path(&mut self, raw_path: &str, methods: &BTreeMap<String, EndpointSpec>) {
        debug!("Adding path: {} ({} methods)", raw_path, methods.len());
        let entry = self.paths.entry(raw_path.to_string()).or_default();
        for (method, spec) in methods {
            entry.insert(method.clone(), spec.clone());
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self, registry: SchemaRegistry) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        let paths = build_paths(&self.paths, &self.security_schemes, &registry);

        // Every scheme is an alternative; operations opt out individually
        let security = self
            .security_schemes
            .keys()
            .map(|key| SecurityRequirement::from([(key.clone(), Vec::new())]))
            .collect();

        info!(
            "Assembled document: {} paths, {} schemas, {} security schemes",
            paths.len(),
            registry.len(),
            self.security_schemes.len()
        );

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            security,
            paths,
            components: Components {
                schemas: registry.into_schemas(),
                security_schemes: self.security_schemes,
            },
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles the complete document from a config and a finished schema registry.
pub fn assemble_document(config: &ApiConfig, registry: SchemaRegistry) -> OpenApiDocument {
    OpenApiBuilder::from_config(config).build(registry)
}

/// Security schemes declared by an authorization spec.
///
/// `types[i]` pairs with `schemes[i]`; when schemes run out the first one is
/// reused. Keys are the lower-cased type and scheme concatenated without spaces.
pub fn build_security_schemes(auth: &AuthorizationSpec) -> BTreeMap<String, SecurityScheme> {
    let mut schemes = BTreeMap::new();

    for (i, auth_type) in auth.types.iter().enumerate() {
        let auth_type = auth_type.to_lowercase();
        let scheme = auth
            .schemes
            .get(i)
            .or_else(|| auth.schemes.first())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        let key = format!("{}{}", auth_type, scheme).replace(' ', "");

        let security_scheme = match auth_type.as_str() {
            "http" => SecurityScheme {
                scheme_type: "http".to_string(),
                scheme: Some(scheme),
                name: None,
                location: None,
            },
            "apikey" => SecurityScheme {
                scheme_type: "apiKey".to_string(),
                scheme: None,
                name: Some(auth.name.clone()),
                location: Some(
                    auth.location
                        .as_deref()
                        .filter(|l| !l.is_empty())
                        .map(str::to_lowercase)
                        .unwrap_or_else(|| "header".to_string()),
                ),
            },
            other => {
                warn!("Ignoring unsupported authorization type: {}", other);
                continue;
            }
        };

        debug!("Registering security scheme: {}", key);
        schemes.insert(key, security_scheme);
    }

    schemes
}

/// Builds the `paths` object.
///
/// Templates are normalized on output; templates that normalize to the same
/// key share one path item.
pub fn build_paths(
    paths: &PathMap,
    security_schemes: &BTreeMap<String, SecurityScheme>,
    registry: &SchemaRegistry,
) -> BTreeMap<String, PathItem> {
    let builder = OperationBuilder {
        registry,
        scheme_names: security_schemes.keys().cloned().collect(),
    };

    let mut result: BTreeMap<String, PathItem> = BTreeMap::new();
    for (raw_path, methods) in paths {
        let path_item = result.entry(normalize_path(raw_path)).or_default();
        for (method, spec) in methods {
            debug!("Building operation: {} {}", method.to_uppercase(), raw_path);
            path_item.insert(method.to_lowercase(), builder.operation(raw_path, spec));
        }
    }
    result
}

/// Converts `:param` segments to the OpenAPI `{param}` form.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Names of the path parameters in a template, in order of appearance.
///
/// Both `:param` and `{param}` segments are recognized.
pub fn extract_path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|part| {
            part.strip_prefix(':').or_else(|| {
                part.strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
            })
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds operations against a finished registry
struct OperationBuilder<'a> {
    registry: &'a SchemaRegistry,
    scheme_names: Vec<String>,
}

impl OperationBuilder<'_> {
    fn operation(&self, raw_path: &str, spec: &EndpointSpec) -> Operation {
        let responses = spec
            .responses
            .iter()
            .map(|(code, response)| {
                let content = self.body_schema(&response.schema).map(json_content);
                (
                    code.clone(),
                    Response {
                        description: response.description.clone(),
                        content,
                    },
                )
            })
            .collect();

        let request_body = spec
            .request_body
            .as_deref()
            .and_then(|name| self.body_schema(name))
            .map(|schema| RequestBody {
                required: true,
                content: json_content(schema),
            });

        Operation {
            summary: spec.summary.clone(),
            tags: spec.tags.clone(),
            security: self.security(spec.authorization),
            parameters: self.parameters(raw_path, spec),
            request_body,
            responses,
        }
    }

    /// `[{}]` clears global security for public operations
    fn security(&self, authorization: bool) -> Option<Vec<SecurityRequirement>> {
        if !authorization {
            return Some(vec![SecurityRequirement::new()]);
        }
        if self.scheme_names.is_empty() {
            return None;
        }
        Some(
            self.scheme_names
                .iter()
                .map(|name| SecurityRequirement::from([(name.clone(), Vec::new())]))
                .collect(),
        )
    }

    /// Path, query, free-form and explicit parameters, in that order
    fn parameters(&self, raw_path: &str, spec: &EndpointSpec) -> Vec<Parameter> {
        let mut params: Vec<Parameter> = extract_path_params(raw_path)
            .into_iter()
            .map(|name| Parameter {
                name,
                location: "path".to_string(),
                required: true,
                description: None,
                schema: Some(Schema::typed("string")),
            })
            .collect();

        params.extend(spec.query.iter().map(|(name, go_type)| Parameter {
            name: name.clone(),
            location: "query".to_string(),
            required: false,
            description: None,
            schema: Some(Schema::for_go_type(go_type)),
        }));

        if let Some(param) = spec.parameter.as_ref().and_then(|p| self.free_form(p)) {
            params.push(param);
        }

        params.extend(spec.parameters.iter().map(explicit_parameter));
        dedup_parameters(raw_path, params)
    }

    fn free_form(&self, spec: &ParameterSpec) -> Option<Parameter> {
        match spec {
            ParameterSpec::Inline(go_type) => Some(Parameter {
                name: "body".to_string(),
                location: "query".to_string(),
                required: true,
                description: None,
                schema: Some(Schema::for_go_type(go_type)),
            }),
            ParameterSpec::Object(object) => {
                let Some(name) = object.name.as_deref().filter(|n| !n.is_empty()) else {
                    warn!("Skipping parameter object without a name");
                    return None;
                };
                Some(Parameter {
                    name: name.to_string(),
                    location: object
                        .location
                        .as_deref()
                        .filter(|l| !l.is_empty())
                        .unwrap_or("query")
                        .to_string(),
                    required: object.required,
                    description: None,
                    schema: object.schema.as_deref().map(|s| self.named_schema(s)),
                })
            }
        }
    }

    /// Body schema for a declared name; `None` when nothing is declared.
    fn body_schema(&self, name: &str) -> Option<Schema> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if !self.registry.contains(name.trim_start_matches("[]")) {
            warn!("Schema {} is not a struct in the source file, inlining it", name);
        }
        Some(self.named_schema(name))
    }

    /// `$ref` for known structs, arrays of them, otherwise the mapped scalar.
    fn named_schema(&self, name: &str) -> Schema {
        if let Some(element) = name.strip_prefix("[]") {
            return Schema::array(self.named_schema(element));
        }
        if self.registry.contains(name) {
            Schema::reference(name)
        } else {
            Schema::for_go_type(name)
        }
    }
}

/// Keeps the first parameter for each `(name, in)` pair.
fn dedup_parameters(raw_path: &str, params: Vec<Parameter>) -> Vec<Parameter> {
    let mut seen = HashSet::new();
    params
        .into_iter()
        .filter(|param| {
            let fresh = seen.insert((param.name.clone(), param.location.clone()));
            if !fresh {
                warn!(
                    "Dropping duplicate {} parameter {} on {}",
                    param.location, param.name, raw_path
                );
            }
            fresh
        })
        .collect()
}

fn explicit_parameter(decl: &ParameterDecl) -> Parameter {
    let declared = decl.param_type.trim();
    let schema_type = if declared.is_empty() {
        "string".to_string()
    } else if OPENAPI_PRIMITIVES.contains(&declared) {
        declared.to_string()
    } else {
        ScalarType::from_go_type(declared).as_str().to_string()
    };

    let mut schema = Schema::typed(schema_type.as_str());
    match schema_type.as_str() {
        "integer" => schema.format = Some("int64".to_string()),
        "number" => schema.format = Some("double".to_string()),
        _ => {}
    }

    Parameter {
        name: decl.name.clone(),
        location: decl.location.clone(),
        required: decl.required,
        description: non_empty(decl.description.as_deref()),
        schema: Some(schema),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
