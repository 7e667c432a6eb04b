//! AST-backed code analysis module.
//!
//! This module provides a language-agnostic interface for extracting "facts"
//! from source code using tree-sitter. Facts include:
//! - Ad-hoc logging call sites (`print(...)`, `console.warn(...)`)
//! - Module-scope structured logger imports and instances
//! - Names already bound at module scope
//! - Where new import / instance lines belong
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ Analyzers    │────▶│ FileFacts     │
//! └─────────────────┘     │ (JS/TS, Py)  │     │ (Calls,       │
//!                         └──────────────┘     │  LoggerFacts) │
//!                                              └───────────────┘
//!                                                 │         │
//!                                                 ▼         ▼
//!                                         ┌──────────┐ ┌─────────┐
//!                                         │ Detector │ │ Fixer   │
//!                                         └──────────┘ └─────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/`
//! 2. Implement `LanguageAnalyzer` trait
//! 3. Define tree-sitter queries for call extraction
//! 4. Register the grammar and analyzer in `languages/mod.rs`
//!
//! See `languages/python.rs` for a reference implementation.

mod facts;
mod languages;
pub(crate) mod traits;

pub use facts::{
    BindingKind, CallKind, CallSite, FileFacts, InsertionPoint, LogLevel, LoggerBinding,
    LoggerFacts, ModuleStyle, Span,
};
pub use languages::{
    analyzer_for, registered_extensions, Grammar, JavaScriptAnalyzer, LanguageFamily,
    PythonAnalyzer,
};
pub use traits::{LanguageAnalyzer, ParsedFile};

use std::path::Path;

/// Parse `source` with the grammar for `path` and extract its facts.
///
/// Returns `Ok(None)` when no grammar handles the extension.
pub fn analyze_source(path: &Path, source: &[u8]) -> anyhow::Result<Option<(ParsedFile, FileFacts)>> {
    let Some(grammar) = Grammar::from_path(path) else {
        return Ok(None);
    };
    let analyzer = analyzer_for(grammar.family());
    let parsed = analyzer.parse(grammar, path, source)?;
    let facts = analyzer.extract_facts(&parsed)?;
    Ok(Some((parsed, facts)))
}
