//! Struct extraction from parsed Go source files.
//!
//! The extractor walks the top-level `type` declarations of a [`ParsedFile`] and
//! records every named struct type together with its fields, their struct tags
//! and the declaration's leading doc comment.
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_go::extractor::StructExtractor;
//! use openapi_from_go::parser::GoParser;
//! use std::path::Path;
//!
//! let parsed = GoParser::parse_file(Path::new("models.go")).unwrap();
//! let structs = StructExtractor::extract(&parsed);
//! println!("Found {} structs", structs.len());
//! ```

pub mod tag;

use crate::parser::ParsedFile;
use crate::type_resolver::TypeExpr;
use log::{debug, warn};
use std::collections::HashMap;
use tag::JsonTag;
use tree_sitter::Node;

/// A named Go struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    /// Type name, unique within a [`StructSet`]
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDecl>,
    /// Doc comment of the enclosing `type` declaration, comment markers stripped
    pub doc: Option<String>,
}

/// A single struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name; `None` for embedded fields
    pub name: Option<String>,
    /// The declared type
    pub ty: TypeExpr,
    /// Value of the `json` tag key
    pub json: Option<String>,
    /// Value of the `validate` tag key
    pub validate: Option<String>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            fields,
            doc: None,
        }
    }
}

impl FieldDecl {
    /// Creates an untagged named field.
    pub fn named(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            json: None,
            validate: None,
        }
    }

    /// Creates an embedded (anonymous) field.
    pub fn embedded(ty: TypeExpr) -> Self {
        Self {
            name: None,
            ty,
            json: None,
            validate: None,
        }
    }

    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.json = Some(json.into());
        self
    }

    pub fn with_validate(mut self, validate: impl Into<String>) -> Self {
        self.validate = Some(validate.into());
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.name.is_none()
    }

    /// Key under which the field appears in the schema, or `None` when the
    /// field is skipped (`json:"-"`) or embedded.
    pub fn output_key(&self) -> Option<String> {
        let name = self.name.as_ref()?;
        match self.json.as_deref().map(JsonTag::parse) {
            Some(tag) if tag.is_skip() => None,
            Some(tag) if !tag.name.is_empty() => Some(tag.name),
            _ => Some(name.clone()),
        }
    }

    /// Fields are required unless tagged `omitempty`; a `validate:"required"`
    /// rule overrides `omitempty`.
    pub fn is_required(&self) -> bool {
        if self.validate.as_deref().is_some_and(tag::validate_requires) {
            return true;
        }
        !self
            .json
            .as_deref()
            .map(JsonTag::parse)
            .is_some_and(|tag| tag.omitempty)
    }
}

/// The structs of one source file, keyed by name in declaration order.
#[derive(Debug, Clone, Default)]
pub struct StructSet {
    structs: Vec<StructDecl>,
    index: HashMap<String, usize>,
    /// Diagnostics raised while collecting (duplicate names)
    pub warnings: Vec<String>,
}

impl StructSet {
    /// Builds a set from declarations; on duplicate names the first declaration wins.
    pub fn from_decls(decls: impl IntoIterator<Item = StructDecl>) -> Self {
        let mut set = Self::default();
        for decl in decls {
            set.insert(decl);
        }
        set
    }

    fn insert(&mut self, decl: StructDecl) {
        if self.index.contains_key(&decl.name) {
            let warning = format!(
                "duplicate struct `{}`: keeping the first declaration",
                decl.name
            );
            warn!("{}", warning);
            self.warnings.push(warning);
            return;
        }
        self.index.insert(decl.name.clone(), self.structs.len());
        self.structs.push(decl);
    }

    pub fn get(&self, name: &str) -> Option<&StructDecl> {
        self.index.get(name).map(|&i| &self.structs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructDecl> {
        self.structs.iter()
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
}

/// Collects struct declarations from a parsed Go file.
pub struct StructExtractor;

impl StructExtractor {
    /// Extracts every named struct type declared at the top level of `file`.
    ///
    /// The doc comment directly above a `type` declaration is attached to every
    /// struct declared in that block.
    pub fn extract(file: &ParsedFile) -> StructSet {
        let root = file.root();
        let mut decls = Vec::new();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            if node.kind() != "type_declaration" {
                continue;
            }

            let doc = leading_doc_comment(file, node);

            let mut spec_cursor = node.walk();
            for spec in node.named_children(&mut spec_cursor) {
                if spec.kind() != "type_spec" {
                    continue;
                }
                let (Some(name_node), Some(type_node)) = (
                    spec.child_by_field_name("name"),
                    spec.child_by_field_name("type"),
                ) else {
                    continue;
                };
                if type_node.kind() != "struct_type" {
                    continue;
                }

                let name = file.text(name_node).to_string();
                let fields = struct_fields(file, type_node);
                debug!("Found struct {} with {} fields", name, fields.len());

                decls.push(StructDecl {
                    name,
                    fields,
                    doc: doc.clone(),
                });
            }
        }

        let set = StructSet::from_decls(decls);
        debug!(
            "Extracted {} structs from {}",
            set.len(),
            file.path.display()
        );
        set
    }
}

fn struct_fields(file: &ParsedFile, struct_node: Node<'_>) -> Vec<FieldDecl> {
    let mut fields = Vec::new();

    let mut cursor = struct_node.walk();
    let Some(list) = struct_node
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return fields;
    };

    let mut list_cursor = list.walk();
    for decl in list.named_children(&mut list_cursor) {
        if decl.kind() != "field_declaration" {
            continue;
        }

        let ty = decl
            .child_by_field_name("type")
            .map(|t| lower_type(file, t))
            .unwrap_or(TypeExpr::Unknown);

        let raw_tag = decl
            .child_by_field_name("tag")
            .map(|t| tag::literal_contents(file.text(t)));
        let json = raw_tag.as_deref().and_then(|t| tag::lookup(t, "json"));
        let validate = raw_tag.as_deref().and_then(|t| tag::lookup(t, "validate"));

        let mut name_cursor = decl.walk();
        let names: Vec<String> = decl
            .children_by_field_name("name", &mut name_cursor)
            .map(|n| file.text(n).to_string())
            .collect();

        if names.is_empty() {
            fields.push(FieldDecl {
                name: None,
                ty,
                json,
                validate,
            });
            continue;
        }

        for name in names {
            fields.push(FieldDecl {
                name: Some(name),
                ty: ty.clone(),
                json: json.clone(),
                validate: validate.clone(),
            });
        }
    }

    fields
}

/// Lowers a tree-sitter type node into a [`TypeExpr`].
fn lower_type(file: &ParsedFile, node: Node<'_>) -> TypeExpr {
    match node.kind() {
        "type_identifier" => TypeExpr::ident(file.text(node)),
        "pointer_type" => first_named_child(node)
            .map(|inner| TypeExpr::pointer(lower_type(file, inner)))
            .unwrap_or(TypeExpr::Unknown),
        "slice_type" | "array_type" | "implicit_length_array_type" => node
            .child_by_field_name("element")
            .map(|elem| TypeExpr::slice(lower_type(file, elem)))
            .unwrap_or(TypeExpr::Unknown),
        "qualified_type" => match (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) {
            (Some(pkg), Some(name)) => TypeExpr::qualified(file.text(pkg), file.text(name)),
            _ => TypeExpr::Unknown,
        },
        "map_type" => match (
            node.child_by_field_name("key"),
            node.child_by_field_name("value"),
        ) {
            (Some(key), Some(value)) => {
                TypeExpr::map(lower_type(file, key), lower_type(file, value))
            }
            _ => TypeExpr::Unknown,
        },
        "interface_type" => TypeExpr::Interface,
        "parenthesized_type" => first_named_child(node)
            .map(|inner| lower_type(file, inner))
            .unwrap_or(TypeExpr::Unknown),
        other => {
            debug!("Unsupported type node `{}`", other);
            TypeExpr::Unknown
        }
    }
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let child = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    child
}

/// Collects the comment run directly above `decl`, with no blank line between.
fn leading_doc_comment(file: &ParsedFile, decl: Node<'_>) -> Option<String> {
    let mut comments = Vec::new();
    let mut current = decl;

    while let Some(prev) = current.prev_sibling() {
        if prev.kind() != "comment" || prev.end_position().row + 1 < current.start_position().row
        {
            break;
        }
        comments.push(file.text(prev));
        current = prev;
    }

    if comments.is_empty() {
        return None;
    }
    comments.reverse();

    let lines: Vec<String> = comments
        .into_iter()
        .flat_map(comment_lines)
        .collect();
    let text = lines.join("\n").trim().to_string();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn comment_lines(comment: &str) -> Vec<String> {
    if let Some(line) = comment.strip_prefix("//") {
        if line.starts_with("go:") {
            return Vec::new();
        }
        return vec![line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()];
    }

    let body = comment
        .strip_prefix("/*")
        .and_then(|c| c.strip_suffix("*/"))
        .unwrap_or(comment);
    body.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("* ")
                .or_else(|| line.strip_prefix('*'))
                .unwrap_or(line)
                .to_string()
        })
        .collect()
}
