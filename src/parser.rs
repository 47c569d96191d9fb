use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Go source parser backed by tree-sitter.
///
/// tree-sitter recovers from syntax errors instead of failing, so the parser
/// inspects the resulting tree and turns any error node into
/// [`Error::SourceParse`]. There is no partial-file recovery: a file with a
/// single syntax error is rejected as a whole.
///
/// # Example
///
/// ```no_run
/// use openapi_from_go::parser::GoParser;
/// use std::path::Path;
///
/// let parsed = GoParser::parse_file(Path::new("models.go")).unwrap();
/// println!("Parsed {} top-level nodes", parsed.root().named_child_count());
/// ```
pub struct GoParser;

/// A successfully parsed Go file with its syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The original source text the tree points into
    pub source: String,
    tree: Tree,
}

impl ParsedFile {
    /// Root `source_file` node of the syntax tree
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }
}

impl GoParser {
    /// Reads and parses a single Go source file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Go syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_source(path, source)
    }

    /// Parses Go source text; `path` is only used for diagnostics.
    pub fn parse_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<ParsedFile> {
        let path = path.into();
        let source = source.into();

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::SourceParse {
                file: path.clone(),
                message: format!("failed to load Go grammar: {}", e),
            })?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Error::SourceParse {
                file: path.clone(),
                message: "parser produced no syntax tree".to_string(),
            })?;

        if let Some(node) = first_error(tree.root_node()) {
            let pos = node.start_position();
            let what = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                "unexpected syntax".to_string()
            };
            return Err(Error::SourceParse {
                file: path,
                message: format!("{} at line {}, column {}", what, pos.row + 1, pos.column + 1),
            });
        }

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile { path, source, tree })
    }
}

/// Finds the first error or missing node in source order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
