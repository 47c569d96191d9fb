//! Sanity checks for API configs, located on the config text.
//!
//! Validation never fails: every problem becomes a [`ValidationFinding`] and
//! the caller decides how to report it.

use crate::config::ApiConfig;
use log::debug;
use std::collections::HashMap;

const VALID_METHODS: &[&str] = &[
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

const VALID_LOCATIONS: &[&str] = &["query", "path", "header", "cookie"];

const VALID_AUTH_TYPES: &[&str] = &["http", "apikey"];

/// One problem found in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    pub message: String,
    /// 1-based line in the config text, when the field could be located
    pub line: Option<usize>,
    /// Dotted key path of the offending field (`servers[0].url`)
    pub field: Option<String>,
}

/// Validates config text and returns every finding, in document order of the checks.
pub fn validate_config(content: &str) -> Vec<ValidationFinding> {
    let config: ApiConfig = match serde_yaml::from_str(content) {
        Ok(config) => config,
        Err(err) => {
            return vec![ValidationFinding {
                message: format!("YAML parse error: {}", err),
                line: err.location().map(|loc| loc.line()),
                field: None,
            }];
        }
    };

    let mut checker = Checker {
        lines: LineMap::from_content(content),
        findings: Vec::new(),
    };
    checker.check(&config);
    debug!("Validation produced {} findings", checker.findings.len());
    checker.findings
}

struct Checker {
    lines: LineMap,
    findings: Vec<ValidationFinding>,
}

impl Checker {
    fn report(&mut self, field: String, message: impl Into<String>) {
        self.findings.push(ValidationFinding {
            message: message.into(),
            line: self.lines.locate(&field),
            field: Some(field),
        });
    }

    fn check(&mut self, config: &ApiConfig) {
        if config.info.title.is_empty() {
            self.report("info.title".to_string(), "Title is required");
        }
        if config.info.version.is_empty() {
            self.report("info.version".to_string(), "Version is required");
        }

        if config.paths.is_empty() {
            self.report("paths".to_string(), "At least one path must be defined");
        }

        if config.servers.is_empty() {
            self.report("servers".to_string(), "At least one server must be defined");
        }
        for (i, server) in config.servers.iter().enumerate() {
            if server.url.is_empty() {
                self.report(format!("servers[{}].url", i), "Server URL is required");
            }
        }

        for (path, methods) in &config.paths {
            if !path.starts_with('/') {
                self.report(format!("paths.{}", path), "Path must start with '/'");
            }

            for (method, endpoint) in methods {
                let prefix = format!("paths.{}.{}", path, method);

                if !VALID_METHODS.contains(&method.to_lowercase().as_str()) {
                    self.report(prefix.clone(), format!("Invalid HTTP method: {}", method));
                }

                if endpoint.responses.is_empty() {
                    self.report(
                        format!("{}.responses", prefix),
                        "At least one response must be defined",
                    );
                }
                for (status, response) in &endpoint.responses {
                    let field = format!("{}.responses.{}", prefix, status);
                    if !is_valid_status_code(status) {
                        self.report(field.clone(), format!("Invalid status code: {}", status));
                    }
                    if response.description.is_empty() {
                        self.report(format!("{}.description", field), "Description is required");
                    }
                    if response.schema.is_empty() {
                        self.report(format!("{}.schema", field), "Schema is required");
                    }
                }

                for (i, param) in endpoint.parameters.iter().enumerate() {
                    let field = format!("{}.parameters[{}]", prefix, i);
                    if param.name.is_empty() {
                        self.report(format!("{}.name", field), "Parameter name is required");
                    }

                    let location = param.location.to_lowercase();
                    if location.is_empty() {
                        self.report(
                            format!("{}.in", field),
                            "Parameter location (in) is required",
                        );
                    } else if !VALID_LOCATIONS.contains(&location.as_str()) {
                        self.report(
                            format!("{}.in", field),
                            format!("Invalid 'in' value: {}", param.location),
                        );
                    }

                    if location == "path" && !param.required {
                        self.report(
                            format!("{}.required", field),
                            "Path parameters must be required",
                        );
                    }
                }
            }
        }

        if let Some(auth) = &config.authorization {
            if auth.types.is_empty() {
                self.report(
                    "authorization.type".to_string(),
                    "At least one authorization type must be specified",
                );
            }
            if auth.schemes.is_empty() {
                self.report(
                    "authorization.scheme".to_string(),
                    "At least one authorization scheme must be specified",
                );
            }
            for auth_type in &auth.types {
                if !VALID_AUTH_TYPES.contains(&auth_type.to_lowercase().as_str()) {
                    self.report(
                        "authorization.type".to_string(),
                        format!("Unsupported authorization type: {}", auth_type),
                    );
                }
            }
            let needs_name = auth.types.iter().any(|t| t.eq_ignore_ascii_case("apikey"));
            if needs_name && auth.name.is_empty() {
                self.report(
                    "authorization.name".to_string(),
                    "Authorization name is required for apiKey",
                );
            }
        }
    }
}

/// Status codes need at least three characters and a 1xx-5xx class digit.
fn is_valid_status_code(status: &str) -> bool {
    status.len() >= 3 && matches!(status.as_bytes()[0], b'1'..=b'5')
}

/// Dotted key path -> 1-based line of the key in block-style YAML.
///
/// Sequence items are addressed by index (`servers[0]`, `servers[0].url`).
/// Flow collections and multi-line scalars are not descended into.
#[derive(Debug, Default)]
pub struct LineMap {
    lines: HashMap<String, usize>,
}

struct Frame {
    indent: usize,
    path: String,
    is_item: bool,
}

impl LineMap {
    pub fn from_content(content: &str) -> Self {
        let mut map = Self::default();
        let mut stack: Vec<Frame> = Vec::new();
        let mut item_counts: HashMap<String, usize> = HashMap::new();

        for (i, raw) in content.lines().enumerate() {
            let line_no = i + 1;
            let text = raw.trim_start_matches(' ');
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let indent = raw.len() - text.len();

            if let Some(rest) = sequence_item(text) {
                while stack
                    .last()
                    .is_some_and(|f| f.indent > indent || (f.indent == indent && f.is_item))
                {
                    stack.pop();
                }
                let owner = stack.last().map(|f| f.path.clone()).unwrap_or_default();
                let count = item_counts.entry(owner.clone()).or_insert(0);
                let item_path = format!("{}[{}]", owner, count);
                *count += 1;

                map.insert(&item_path, line_no);
                stack.push(Frame {
                    indent,
                    path: item_path,
                    is_item: true,
                });

                let rest_trimmed = rest.trim_start_matches(' ');
                let rest_indent = indent + (text.len() - rest_trimmed.len());
                if let Some(key) = mapping_key(rest_trimmed) {
                    map.push_key(&mut stack, key, rest_indent, line_no);
                }
                continue;
            }

            if let Some(key) = mapping_key(text) {
                while stack.last().is_some_and(|f| f.indent >= indent) {
                    stack.pop();
                }
                map.push_key(&mut stack, key, indent, line_no);
            }
        }

        map
    }

    fn push_key(&mut self, stack: &mut Vec<Frame>, key: &str, indent: usize, line_no: usize) {
        let path = match stack.last() {
            Some(parent) => format!("{}.{}", parent.path, key),
            None => key.to_string(),
        };
        self.insert(&path, line_no);
        stack.push(Frame {
            indent,
            path,
            is_item: false,
        });
    }

    fn insert(&mut self, path: &str, line_no: usize) {
        self.lines.entry(path.to_string()).or_insert(line_no);
    }

    /// Line of `field` itself, or of its closest recorded ancestor.
    pub fn locate(&self, field: &str) -> Option<usize> {
        let mut candidate = field;
        loop {
            if let Some(line) = self.lines.get(candidate) {
                return Some(*line);
            }
            let cut = candidate.rfind(['.', '['])?;
            candidate = &candidate[..cut];
        }
    }

    pub fn get(&self, field: &str) -> Option<usize> {
        self.lines.get(field).copied()
    }
}

fn sequence_item(text: &str) -> Option<&str> {
    if text == "-" {
        Some("")
    } else {
        text.strip_prefix("- ")
    }
}

/// Key of a `key: value` or `key:` line; the colon must end the line or be followed by whitespace.
fn mapping_key(text: &str) -> Option<&str> {
    if text.starts_with(['{', '[']) {
        return None;
    }
    let bytes = text.as_bytes();
    let colon = (0..bytes.len()).find(|&i| {
        bytes[i] == b':' && bytes.get(i + 1).map_or(true, |b| *b == b' ' || *b == b'\t')
    })?;
    let key = text[..colon].trim().trim_matches(['"', '\'']);
    (!key.is_empty()).then_some(key)
}
