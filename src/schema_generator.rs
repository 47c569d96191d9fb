use crate::extractor::{StructDecl, StructSet};
use crate::type_resolver::{is_timestamp, ScalarType};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Prefix every schema reference points into
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "date-time", "int64", "double")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Struct doc comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required field names for object types, in field order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

impl Schema {
    /// `{"$ref": "#/components/schemas/<name>"}`
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, name)),
            ..Self::default()
        }
    }

    /// A bare `{"type": ...}` schema.
    pub fn typed(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Self::default()
        }
    }

    /// Schema for a canonical Go scalar name; timestamps gain `format: date-time`.
    pub fn for_go_type(type_name: &str) -> Self {
        let mut schema = Self::typed(ScalarType::from_go_type(type_name).as_str());
        if is_timestamp(type_name) {
            schema.format = Some("date-time".to_string());
        }
        schema
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Per-run registry of built struct schemas.
///
/// Owned by the [`SchemaGenerator`] while it runs and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
    order: Vec<String>,
}

impl SchemaRegistry {
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Names in the order their schemas were finished
    pub fn emission_order(&self) -> &[String] {
        &self.order
    }

    pub fn schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }

    fn insert(&mut self, name: &str, schema: Schema) {
        self.order.push(name.to_string());
        self.schemas.insert(name.to_string(), schema);
    }
}

/// Schema generator - converts extracted Go structs to OpenAPI schemas
pub struct SchemaGenerator<'a> {
    /// Structs declared in the source file
    structs: &'a StructSet,
    /// Schemas finished so far
    registry: SchemaRegistry,
    /// Names reserved before their dependencies are visited
    in_progress: HashSet<String>,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(structs: &'a StructSet) -> Self {
        debug!("Initializing SchemaGenerator for {} structs", structs.len());
        Self {
            structs,
            registry: SchemaRegistry::default(),
            in_progress: HashSet::new(),
        }
    }

    /// Builds one schema per struct, dependencies first.
    pub fn build(mut self) -> SchemaRegistry {
        let structs = self.structs;
        for decl in structs.iter() {
            self.process(decl);
        }
        debug!("Built {} schemas", self.registry.len());
        self.registry
    }

    fn process(&mut self, decl: &StructDecl) {
        if self.registry.contains(&decl.name) || self.in_progress.contains(&decl.name) {
            return;
        }
        self.in_progress.insert(decl.name.clone());

        let structs = self.structs;
        for field in &decl.fields {
            let type_name = field.ty.canonical();
            let dependency = type_name.strip_prefix("[]").unwrap_or(&type_name);
            if let Some(dep) = structs.get(dependency) {
                self.process(dep);
            }
        }

        debug!("Generating struct schema for: {}", decl.name);
        let schema = self.struct_schema(decl);
        self.registry.insert(&decl.name, schema);
        self.in_progress.remove(&decl.name);
    }

    fn struct_schema(&self, decl: &StructDecl) -> Schema {
        let mut required = Vec::new();
        let mut embedding_chain = Vec::new();
        let properties = self.collect_properties(decl, &mut embedding_chain, Some(&mut required));

        Schema {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            description: decl
                .doc
                .as_deref()
                .map(str::trim)
                .filter(|doc| !doc.is_empty())
                .map(str::to_string),
            ..Schema::default()
        }
    }

    /// Property map of `decl` with embedded structs flattened in field order.
    ///
    /// Embedded structs are expanded from their declarations, never from the
    /// registry, so the result does not depend on declaration order. Only
    /// `chain` (the structs currently being flattened) stops recursion.
    /// Required names are collected for the outermost struct only.
    fn collect_properties(
        &self,
        decl: &StructDecl,
        chain: &mut Vec<String>,
        mut required: Option<&mut Vec<String>>,
    ) -> BTreeMap<String, Schema> {
        let mut properties = BTreeMap::new();
        chain.push(decl.name.clone());

        for field in &decl.fields {
            if field.is_embedded() {
                let embedded = field.ty.canonical();
                match self.structs.get(&embedded) {
                    None => debug!(
                        "Embedded type {} in {} is not a local struct",
                        embedded, decl.name
                    ),
                    Some(_) if chain.contains(&embedded) => warn!(
                        "Cannot flatten {} into {}: embedding cycle",
                        embedded, decl.name
                    ),
                    Some(inner) => {
                        properties.extend(self.collect_properties(inner, chain, None));
                    }
                }
                continue;
            }

            let Some(key) = field.output_key() else {
                debug!("Skipping field {:?} of {}", field.name, decl.name);
                continue;
            };

            if field.is_required() {
                if let Some(required) = required.as_deref_mut() {
                    required.push(key.clone());
                }
            }
            properties.insert(key, self.field_schema(&field.ty.canonical()));
        }

        chain.pop();
        properties
    }

    /// Schema for a field of the given canonical type.
    ///
    /// References are decided by name only, so a struct still under construction
    /// is referenced the same way as a finished one.
    fn field_schema(&self, type_name: &str) -> Schema {
        if let Some(element) = type_name.strip_prefix("[]") {
            let items = if self.structs.contains(element) {
                Schema::reference(element)
            } else {
                Schema::for_go_type(element)
            };
            return Schema::array(items);
        }

        if self.structs.contains(type_name) {
            return Schema::reference(type_name);
        }

        Schema::for_go_type(type_name)
    }
}

/// Builds the schema registry for `structs`.
pub fn build_schemas(structs: &StructSet) -> SchemaRegistry {
    SchemaGenerator::new(structs).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{FieldDecl, StructExtractor};
    use crate::parser::GoParser;
    use crate::type_resolver::TypeExpr;

    /// Helper function to build schemas from Go code
    fn build_from_code(code: &str) -> SchemaRegistry {
        let parsed = GoParser::parse_source("test.go", code).unwrap();
        let structs = StructExtractor::extract(&parsed);
        build_schemas(&structs)
    }

    fn position(registry: &SchemaRegistry, name: &str) -> usize {
        registry
            .emission_order()
            .iter()
            .position(|n| n == name)
            .unwrap()
    }

    #[test]
    fn test_struct_schema_generation() {
        let registry = build_from_code(
            r#"
package pets

type Pet struct {
    Name string
    Age  int
}
"#,
        );

        let pet = registry.get("Pet").unwrap();
        assert_eq!(pet.schema_type.as_deref(), Some("object"));
        let properties = pet.properties.as_ref().unwrap();
        assert_eq!(properties["Name"], Schema::typed("string"));
        assert_eq!(properties["Age"], Schema::typed("integer"));
        assert_eq!(
            pet.required,
            Some(vec!["Name".to_string(), "Age".to_string()])
        );
        assert!(pet.description.is_none());
    }

    #[test]
    fn test_struct_with_json_tags() {
        let registry = build_from_code(
            r#"
package users

type User struct {
    ID       int64  `json:"id"`
    Email    string `json:"email,omitempty"`
    Phone    string `json:"phone,omitempty" validate:"required"`
    Password string `json:"-" validate:"required"`
}
"#,
        );

        let user = registry.get("User").unwrap();
        let properties = user.properties.as_ref().unwrap();
        assert_eq!(properties.len(), 3);
        assert!(properties.contains_key("id"));
        assert!(properties.contains_key("email"));
        assert!(properties.contains_key("phone"));
        assert!(!properties.contains_key("Password"));
        assert!(!properties.contains_key("-"));

        assert_eq!(
            user.required,
            Some(vec!["id".to_string(), "phone".to_string()])
        );
    }

    #[test]
    fn test_no_required_list_when_everything_optional() {
        let registry = build_from_code(
            r#"
package users

type Filter struct {
    Query string `json:"q,omitempty"`
}
"#,
        );

        assert!(registry.get("Filter").unwrap().required.is_none());
    }

    #[test]
    fn test_nested_and_array_references() {
        let registry = build_from_code(
            r#"
package pets

type Owner struct {
    Pets  []Pet
    Best  *Pet
    Tags  []string
    Extra map[string]int
}

type Pet struct {
    Name string
}
"#,
        );

        let owner = registry.get("Owner").unwrap();
        let properties = owner.properties.as_ref().unwrap();
        assert_eq!(properties["Pets"], Schema::array(Schema::reference("Pet")));
        assert_eq!(properties["Best"], Schema::reference("Pet"));
        assert_eq!(properties["Tags"], Schema::array(Schema::typed("string")));
        assert_eq!(properties["Extra"], Schema::typed("object"));
    }

    #[test]
    fn test_timestamp_format() {
        let registry = build_from_code(
            r#"
package audit

import "time"

type Event struct {
    At      time.Time
    History []time.Time
}
"#,
        );

        let properties = registry.get("Event").unwrap().properties.clone().unwrap();
        assert_eq!(
            properties["At"],
            Schema::typed("string").with_format("date-time")
        );
        assert_eq!(
            properties["History"],
            Schema::array(Schema::typed("string").with_format("date-time"))
        );
    }

    #[test]
    fn test_unknown_types_degrade_to_object() {
        let registry = build_from_code(
            r#"
package misc

import "database/sql"

type Row struct {
    Value   sql.NullString
    Any     interface{}
    Handler func()
    Custom  Money
}
"#,
        );

        let properties = registry.get("Row").unwrap().properties.clone().unwrap();
        for key in ["Value", "Any", "Handler", "Custom"] {
            assert_eq!(properties[key], Schema::typed("object"), "{}", key);
        }
    }

    #[test]
    fn test_description_from_doc_comment() {
        let registry = build_from_code(
            r#"
package pets

// Pet is a pet.
type Pet struct {
    Name string
}
"#,
        );

        assert_eq!(
            registry.get("Pet").unwrap().description.as_deref(),
            Some("Pet is a pet.")
        );
    }

    #[test]
    fn test_dependencies_emitted_first() {
        let registry = build_from_code(
            r#"
package shop

type Order struct {
    Customer Customer
    Lines    []LineItem
}

type LineItem struct {
    Product *Product
    Qty     int
}

type Customer struct {
    Address Address
}

type Product struct {
    Name string
}

type Address struct {
    City string
}
"#,
        );

        assert_eq!(registry.len(), 5);
        assert!(position(&registry, "Product") < position(&registry, "LineItem"));
        assert!(position(&registry, "LineItem") < position(&registry, "Order"));
        assert!(position(&registry, "Address") < position(&registry, "Customer"));
        assert!(position(&registry, "Customer") < position(&registry, "Order"));
    }

    #[test]
    fn test_each_struct_built_once() {
        let registry = build_from_code(
            r#"
package shop

type A struct {
    One   Shared
    Two   []Shared
    Three *Shared
}

type B struct {
    Shared Shared
}

type Shared struct {
    X int
}
"#,
        );

        let count = registry
            .emission_order()
            .iter()
            .filter(|n| n.as_str() == "Shared")
            .count();
        assert_eq!(count, 1);
        assert_eq!(registry.emission_order().len(), 3);
    }

    #[test]
    fn test_mutual_references_terminate_with_refs() {
        let registry = build_from_code(
            r#"
package graph

type Node struct {
    Edges []Edge
    Self  *Node
}

type Edge struct {
    From *Node
    To   *Node
}
"#,
        );

        assert_eq!(registry.len(), 2);
        let node = registry.get("Node").unwrap().properties.clone().unwrap();
        assert_eq!(node["Edges"], Schema::array(Schema::reference("Edge")));
        assert_eq!(node["Self"], Schema::reference("Node"));

        let edge = registry.get("Edge").unwrap().properties.clone().unwrap();
        assert_eq!(edge["From"], Schema::reference("Node"));
        assert_eq!(edge["To"], Schema::reference("Node"));
    }

    #[test]
    fn test_embedded_struct_is_flattened() {
        let registry = build_from_code(
            r#"
package models

type Model struct {
    ID        uint `json:"id"`
    CreatedAt int64 `json:"created_at"`
}

type User struct {
    Model
    Name string `json:"name"`
}
"#,
        );

        let user = registry.get("User").unwrap();
        let properties = user.properties.as_ref().unwrap();
        assert_eq!(properties.len(), 3);
        assert!(properties.contains_key("id"));
        assert!(properties.contains_key("created_at"));
        assert!(properties.contains_key("name"));
        assert!(user.reference.is_none());
        assert_eq!(user.required, Some(vec!["name".to_string()]));
    }

    #[test]
    fn test_embedded_pointer_declared_later() {
        let registry = build_from_code(
            r#"
package models

type User struct {
    *Base
    Name string
}

type Base struct {
    ID int
}
"#,
        );

        let properties = registry.get("User").unwrap().properties.clone().unwrap();
        assert!(properties.contains_key("ID"));
        assert!(position(&registry, "Base") < position(&registry, "User"));
    }

    #[test]
    fn test_embedding_cycle_does_not_loop() {
        let structs = StructSet::from_decls(vec![
            StructDecl::new(
                "A",
                vec![
                    FieldDecl::embedded(TypeExpr::pointer(TypeExpr::ident("B"))),
                    FieldDecl::named("X", TypeExpr::ident("int")),
                ],
            ),
            StructDecl::new(
                "B",
                vec![
                    FieldDecl::embedded(TypeExpr::pointer(TypeExpr::ident("A"))),
                    FieldDecl::named("Y", TypeExpr::ident("int")),
                ],
            ),
        ]);

        let registry = build_schemas(&structs);

        assert_eq!(registry.len(), 2);
        let b = registry.get("B").unwrap().properties.clone().unwrap();
        assert!(b.contains_key("X"));
        assert!(b.contains_key("Y"));
        let a = registry.get("A").unwrap().properties.clone().unwrap();
        assert!(a.contains_key("X"));
        assert!(a.contains_key("Y"));
    }

    #[test]
    fn test_embedding_through_reference_cycle_ignores_declaration_order() {
        let node_first = build_from_code(
            r#"
package tree

type Node struct {
    Children []Leaf
}

type Leaf struct {
    Node
    Name string
}
"#,
        );
        let leaf_first = build_from_code(
            r#"
package tree

type Leaf struct {
    Node
    Name string
}

type Node struct {
    Children []Leaf
}
"#,
        );

        for registry in [&node_first, &leaf_first] {
            let leaf = registry.get("Leaf").unwrap().properties.clone().unwrap();
            let keys: Vec<_> = leaf.keys().cloned().collect();
            assert_eq!(keys, vec!["Children".to_string(), "Name".to_string()]);
            assert_eq!(leaf["Children"], Schema::array(Schema::reference("Leaf")));
        }
        assert_eq!(node_first.schemas(), leaf_first.schemas());
    }

    #[test]
    fn test_schema_serialization_shape() {
        let structs = StructSet::from_decls(vec![StructDecl::new(
            "Pet",
            vec![
                FieldDecl::named("Name", TypeExpr::ident("string")),
                FieldDecl::named("Age", TypeExpr::ident("int")),
            ],
        )]);
        let registry = build_schemas(&structs);

        let value = serde_json::to_value(registry.get("Pet").unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "object",
                "properties": {
                    "Name": {"type": "string"},
                    "Age": {"type": "integer"}
                },
                "required": ["Name", "Age"]
            })
        );
    }

    #[test]
    fn test_empty_struct_set() {
        let registry = build_schemas(&StructSet::default());
        assert!(registry.is_empty());
        assert!(registry.emission_order().is_empty());
    }
}
