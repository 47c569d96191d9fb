//! OpenAPI generation from Go struct declarations.
//!
//! A YAML config declares the API surface (info, servers, paths, operations
//! and authorization) and names request/response bodies by Go struct name.
//! The structs themselves are read from a Go source file, turned into JSON
//! schemas, and merged with the config into an OpenAPI 3.0 JSON document.
//!
//! # Architecture
//!
//! 1. [`config`] - Typed model of the YAML API config
//! 2. [`parser`] - Parses Go source files with tree-sitter
//! 3. [`extractor`] - Collects struct declarations, their fields and tags
//! 4. [`type_resolver`] - Canonical type names and the scalar type mapping
//! 5. [`schema_generator`] - Dependency-ordered struct -> schema conversion
//! 6. [`openapi_builder`] - Paths, operations, security and document assembly
//! 7. [`document`] - Serde model of the emitted document
//! 8. [`serializer`] - JSON serialization and output files
//! 9. [`generator`] - The end-to-end pipeline
//! 10. [`validator`] and [`watcher`] - Config sanity checks and watch mode
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_go::{generator::generate_document, serializer::serialize_json};
//! use std::path::Path;
//!
//! let document = generate_document(Path::new("api.yml"), Path::new("models.go")).unwrap();
//! println!("{}", serialize_json(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod openapi_builder;
pub mod parser;
pub mod schema_generator;
pub mod serializer;
pub mod type_resolver;
pub mod validator;
pub mod watcher;
