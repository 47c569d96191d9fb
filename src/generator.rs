//! The generation pipeline: config + Go source -> OpenAPI document.
//!
//! Each call owns its own schema registry, so independent runs never share
//! state.

use crate::config::ApiConfig;
use crate::document::OpenApiDocument;
use crate::error::Result;
use crate::extractor::StructExtractor;
use crate::openapi_builder::assemble_document;
use crate::parser::{GoParser, ParsedFile};
use crate::schema_generator::build_schemas;
use crate::serializer::{default_output_path, serialize_json, write_to_file};
use log::info;
use std::path::{Path, PathBuf};

/// Loads both inputs from disk and builds the document.
pub fn generate_document(config_path: &Path, source_path: &Path) -> Result<OpenApiDocument> {
    info!("Loading config from {}", config_path.display());
    let config = ApiConfig::load(config_path)?;

    info!("Parsing Go source {}", source_path.display());
    let parsed = GoParser::parse_file(source_path)?;

    Ok(build_document(&config, &parsed))
}

/// Builds the document from in-memory config and source text.
pub fn generate_from_sources(config_yaml: &str, go_source: &str) -> Result<OpenApiDocument> {
    let config = ApiConfig::parse(Path::new("<config>"), config_yaml)?;
    let parsed = GoParser::parse_source("<source>", go_source)?;
    Ok(build_document(&config, &parsed))
}

/// Runs the pipeline and writes the JSON document, returning the path written.
///
/// Without an explicit `output` a timestamped file in the working directory
/// is used.
pub fn generate_to_file(
    config_path: &Path,
    source_path: &Path,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let document = generate_document(config_path, source_path)?;
    let json = serialize_json(&document)?;

    let output = output.map(Path::to_path_buf).unwrap_or_else(default_output_path);
    write_to_file(&json, &output)?;
    info!("Wrote OpenAPI document to {}", output.display());
    Ok(output)
}

fn build_document(config: &ApiConfig, parsed: &ParsedFile) -> OpenApiDocument {
    let structs = StructExtractor::extract(parsed);
    info!("Extracted {} structs", structs.len());

    let registry = build_schemas(&structs);
    info!(
        "Built {} schemas for {} endpoints",
        registry.len(),
        config.endpoint_count()
    );

    assemble_document(config, registry)
}
