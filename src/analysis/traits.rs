//! Core traits for language analysis.

use std::path::Path;

use super::{FileFacts, Grammar, LanguageFamily, LoggerBinding, ModuleStyle, Span};
use crate::config::LoggerBackend;

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// This is kept separate from FileFacts so the fixer can re-parse its own
/// output and inspect the tree without extracting facts again.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
    /// Grammar the tree was produced with.
    pub grammar: Grammar,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Whether the tree contains ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Location of the first ERROR or MISSING node in document order.
    pub fn first_error(&self) -> Option<Span> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                return Some(Span::from_node(node));
            }
            if !node.has_error() {
                continue;
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            // Push in reverse so the leftmost child is visited first.
            stack.extend(children.into_iter().rev());
        }
        Some(Span::from_node(root))
    }
}

/// Language-specific analyzer trait.
///
/// Each language family implements this trait to provide AST-backed
/// detection of ad-hoc logging calls and the text templates the fixer
/// inserts.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser per
/// call.
pub trait LanguageAnalyzer: Send + Sync {
    /// The family this analyzer handles.
    fn family(&self) -> LanguageFamily;

    /// File extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Syntax errors are not an `Err`: the tree is returned with ERROR
    /// nodes and callers decide via [`ParsedFile::has_errors`].
    fn parse(&self, grammar: Grammar, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Extract call sites, logger facts and the import insertion point.
    fn extract_facts(&self, parsed: &ParsedFile) -> anyhow::Result<FileFacts>;

    /// Statement importing `backend`, without trailing newline.
    fn import_statement(&self, backend: LoggerBackend, style: ModuleStyle) -> String;

    /// Statement creating a logger named `name` from `binding`, without
    /// trailing newline.
    fn instance_statement(&self, binding: &LoggerBinding, name: &str) -> String;
}

/// Create a parser for `language` and parse `source`.
pub(crate) fn parse_with(
    language: &tree_sitter::Language,
    grammar: Grammar,
    path: &Path,
    source: &[u8],
) -> anyhow::Result<ParsedFile> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(language)?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("failed to parse {}", path.display()))?;
    Ok(ParsedFile {
        tree,
        source: source.to_vec(),
        path: path.to_string_lossy().to_string(),
        grammar,
    })
}
