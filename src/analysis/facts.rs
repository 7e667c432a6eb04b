//! Fact structures extracted from AST analysis.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::LanguageFamily;
use crate::config::LoggerBackend;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Which ad-hoc logging convention a call follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    /// A bare print-like call (`print(...)`, `pprint(...)`).
    Print,
    /// A severity-named method on a console-like global (`console.warn(...)`).
    Console,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Print => "print",
            CallKind::Console => "console",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured log level an ad-hoc call maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    /// Method name on the structured logger.
    pub fn method(&self, family: LanguageFamily) -> &'static str {
        match (self, family) {
            (LogLevel::Info, _) => "info",
            (LogLevel::Warn, LanguageFamily::JavaScript) => "warn",
            (LogLevel::Warn, LanguageFamily::Python) => "warning",
            (LogLevel::Error, _) => "error",
            (LogLevel::Debug, _) => "debug",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ad-hoc logging call found in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub kind: CallKind,
    /// Call variant, e.g. `warn` for `console.warn` or `stderr.write`.
    pub method: Option<String>,
    pub level: LogLevel,
    /// Span of the callee expression; the fixer replaces exactly this range.
    pub callee: Span,
    /// Original callee text.
    pub callee_text: String,
    /// Span of the whole call expression.
    pub call: Span,
}

/// What an imported backend name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// The backend module itself (`import logging`, `import winston from 'winston'`).
    Module,
    /// A factory taken from the backend (`from logging import getLogger`,
    /// `import { createLogger } from 'winston'`).
    Factory,
}

/// A known backend imported under a usable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerBinding {
    pub backend: LoggerBackend,
    /// Local name of the import (`pino`, `logging`, `getLogger`, an alias...).
    pub binding: String,
    pub kind: BindingKind,
}

impl LoggerBinding {
    /// Binding for a freshly inserted backend import.
    pub fn module(backend: LoggerBackend) -> Self {
        Self {
            backend,
            binding: backend.module().to_string(),
            kind: BindingKind::Module,
        }
    }
}

/// Module-scope structured logging infrastructure already present in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerFacts {
    pub has_import: bool,
    pub has_instance: bool,
    /// Logger variable names in source order.
    pub names: Vec<String>,
    /// Subset of `names` bound by a module-scope instantiation.
    pub instantiated: Vec<String>,
    /// Backend import that an instance can be created from.
    pub binding: Option<LoggerBinding>,
}

impl LoggerFacts {
    /// Record an imported logger instance.
    pub(crate) fn add_name(&mut self, name: &str) {
        self.has_instance = true;
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    /// Record a logger created at module scope.
    pub(crate) fn add_instance(&mut self, name: &str) {
        self.add_name(name);
        if !self.instantiated.iter().any(|n| n == name) {
            self.instantiated.push(name.to_string());
        }
    }

    /// Name rewritten calls should use: a local instantiation wins over an
    /// imported instance.
    pub fn preferred_name(&self) -> Option<&str> {
        self.instantiated
            .first()
            .or_else(|| self.names.first())
            .map(String::as_str)
    }
}

/// How a JavaScript file imports its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStyle {
    EsModule,
    CommonJs,
}

/// Where new import / instance lines are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    /// Byte offset; always at the start of a line or at end of file.
    pub byte: usize,
    /// 1-indexed line the first inserted line will occupy.
    pub line: usize,
    /// `byte` is not at the start of a line, so one must be prepended.
    pub needs_leading_newline: bool,
    /// Code follows `byte` on the same line, so the inserted text must not
    /// end in a newline.
    pub mid_line: bool,
}

impl InsertionPoint {
    /// Point just after the line containing `end_byte`.
    pub fn after_line(source: &[u8], end_byte: usize) -> Self {
        match source[end_byte.min(source.len())..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let byte = end_byte + offset + 1;
                Self {
                    byte,
                    line: line_of(source, byte),
                    needs_leading_newline: false,
                    mid_line: false,
                }
            }
            None => Self {
                byte: source.len(),
                line: line_of(source, source.len()) + 1,
                needs_leading_newline: true,
                mid_line: false,
            },
        }
    }

    /// Point after the top-level statement `node`.
    ///
    /// When another statement shares its last line (`import os; print(1)`),
    /// the point is the end of `node` itself so inserted lines land before
    /// that statement.
    pub fn after_statement(source: &[u8], node: tree_sitter::Node) -> Self {
        let row = node.end_position().row;
        let mut next = node.next_named_sibling();
        while let Some(sibling) = next {
            if sibling.kind() != "comment" {
                break;
            }
            next = sibling.next_named_sibling();
        }

        match next {
            Some(sibling) if sibling.start_position().row == row => Self {
                byte: node.end_byte(),
                line: row + 2,
                needs_leading_newline: true,
                mid_line: true,
            },
            _ => Self::after_line(source, node.end_byte()),
        }
    }

    /// Top of the file.
    pub fn start() -> Self {
        Self {
            byte: 0,
            line: 1,
            needs_leading_newline: false,
            mid_line: false,
        }
    }
}

fn line_of(source: &[u8], byte: usize) -> usize {
    source[..byte.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

/// Everything the detector and fixer need to know about one file.
#[derive(Debug, Clone)]
pub struct FileFacts {
    pub path: String,
    pub language: LanguageFamily,
    /// Ad-hoc logging calls in source order.
    pub calls: Vec<CallSite>,
    pub logger: LoggerFacts,
    /// Names bound at module scope (imports, variables, functions, classes).
    pub declared_names: HashSet<String>,
    /// End of the leading import block.
    pub import_insertion: InsertionPoint,
    pub module_style: ModuleStyle,
    pub has_parse_errors: bool,
    /// Location of the first syntax error, if any.
    pub parse_error: Option<Span>,
}
