//! Canonical type names for Go type expressions and their OpenAPI scalar mapping.

use std::fmt;

/// Canonical name of the well-known timestamp type.
pub const TIMESTAMP_TYPE: &str = "time.Time";

/// Canonical name used for any interface type.
pub const INTERFACE_TYPE: &str = "interface{}";

/// A Go type expression, lowered from the syntax tree at extraction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A plain identifier such as `string` or `User`
    Ident(String),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T` or `[N]T`
    Slice(Box<TypeExpr>),
    /// A package-scoped name such as `time.Time`
    Qualified { owner: String, name: String },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `interface{ ... }`
    Interface,
    /// Anything else (function types, channels, generic instantiations, ...)
    Unknown,
}

impl TypeExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        TypeExpr::Ident(name.into())
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn slice(element: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(element))
    }

    pub fn qualified(owner: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Returns the canonical textual form of the type.
    ///
    /// Pointers are transparent, slices render as `[]elem`, qualified names as
    /// `Owner.Name`, maps as `map[key]value` and every interface as `interface{}`.
    pub fn canonical(&self) -> String {
        match self {
            TypeExpr::Ident(name) => name.clone(),
            TypeExpr::Pointer(inner) => inner.canonical(),
            TypeExpr::Slice(element) => format!("[]{}", element.canonical()),
            TypeExpr::Qualified { owner, name } => format!("{}.{}", owner, name),
            TypeExpr::Map { key, value } => {
                format!("map[{}]{}", key.canonical(), value.canonical())
            }
            TypeExpr::Interface => INTERFACE_TYPE.to_string(),
            TypeExpr::Unknown => "unknown".to_string(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// OpenAPI primitive type names a Go type can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
}

impl ScalarType {
    /// Maps a canonical Go type name to an OpenAPI type.
    ///
    /// Unknown names (custom types, maps, interfaces, generics) map to `Object`
    /// so one odd field never fails the whole document.
    pub fn from_go_type(type_name: &str) -> Self {
        match type_name {
            "string" => ScalarType::String,
            "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
            | "uint32" | "uint64" => ScalarType::Integer,
            "float32" | "float64" => ScalarType::Number,
            "bool" => ScalarType::Boolean,
            TIMESTAMP_TYPE => ScalarType::String,
            _ => ScalarType::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Object => "object",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true for the canonical timestamp type, which carries `format: date-time`.
pub fn is_timestamp(type_name: &str) -> bool {
    type_name == TIMESTAMP_TYPE
}
