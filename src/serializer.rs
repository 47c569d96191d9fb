//! Serialization of OpenAPI documents to JSON files.

use crate::document::OpenApiDocument;
use crate::error::{Error, Result};
use chrono::Local;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// File name prefix for documents written without an explicit output path
pub const DEFAULT_OUTPUT_PREFIX: &str = "openapi_gen";

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// Maps in the document are ordered, so the same input always produces the
/// same text.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
/// Missing parent directories are created.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    fs::write(path, content).map_err(|e| Error::io(path, e))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// `openapi_gen_<YYYYMMDD_HHMMSS>.json` in the working directory.
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "{}_{}.json",
        DEFAULT_OUTPUT_PREFIX,
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
