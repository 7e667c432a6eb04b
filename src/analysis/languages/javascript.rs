//! JavaScript / TypeScript analyzer using tree-sitter.
//!
//! One analyzer serves `.js`, `.jsx`, `.mjs`, `.cjs` (javascript grammar),
//! `.ts`, `.mts`, `.cts` (typescript grammar) and `.tsx` (tsx grammar).

use std::collections::HashSet;
use std::path::Path;

use phf::{phf_map, phf_set};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

use super::{looks_like_logger_name, Grammar, LanguageFamily};
use crate::analysis::traits::parse_with;
use crate::analysis::{
    BindingKind, CallKind, CallSite, FileFacts, InsertionPoint, LanguageAnalyzer, LogLevel,
    LoggerBinding, LoggerFacts, ModuleStyle, ParsedFile, Span,
};
use crate::config::LoggerBackend;

/// `console.<method>(...)` calls.
const CONSOLE_CALL_QUERY: &str = r#"
(call_expression
  function: (member_expression
    object: (identifier) @object
    property: (property_identifier) @method
  ) @callee
) @call
"#;

/// Severity-named console methods and the structured level they map to.
static CONSOLE_LEVELS: phf::Map<&'static str, LogLevel> = phf_map! {
    "log" => LogLevel::Info,
    "info" => LogLevel::Info,
    "warn" => LogLevel::Warn,
    "error" => LogLevel::Error,
    "debug" => LogLevel::Debug,
    "trace" => LogLevel::Debug,
};

/// Packages that provide structured loggers.
static LOGGER_MODULES: phf::Set<&'static str> = phf_set! {
    "pino",
    "winston",
    "bunyan",
    "loglevel",
    "log4js",
    "consola",
    "tslog",
};

/// Last path segments that mark a project-local logger module.
static LOGGER_MODULE_SEGMENTS: phf::Set<&'static str> = phf_set! {
    "logger",
    "log",
    "logging",
    "loggers",
};

/// Callees known to return a logger instance.
static LOGGER_FACTORIES: phf::Set<&'static str> = phf_set! {
    "pino",
    "winston.createLogger",
    "bunyan.createLogger",
    "log4js.getLogger",
    "log.getLogger",
    "loglevel.getLogger",
    "createLogger",
    "getLogger",
    "consola.create",
    "consola.withTag",
};

pub struct JavaScriptAnalyzer {
    javascript: Language,
    typescript: Language,
    tsx: Language,
}

impl JavaScriptAnalyzer {
    pub fn new() -> Self {
        Self {
            javascript: tree_sitter_javascript::LANGUAGE.into(),
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn language(&self, grammar: Grammar) -> &Language {
        match grammar {
            Grammar::TypeScript => &self.typescript,
            Grammar::Tsx => &self.tsx,
            _ => &self.javascript,
        }
    }

    fn extract_calls(&self, parsed: &ParsedFile) -> anyhow::Result<Vec<CallSite>> {
        let language = self.language(parsed.grammar);
        let query = Query::new(language, CONSOLE_CALL_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut calls = Vec::new();
        while let Some(m) = matches.next() {
            let mut object = "";
            let mut method = "";
            let mut callee = None;
            let mut call = None;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "object" => object = parsed.node_text(capture.node),
                    "method" => method = parsed.node_text(capture.node),
                    "callee" => callee = Some(capture.node),
                    "call" => call = Some(capture.node),
                    _ => {}
                }
            }

            if object != "console" {
                continue;
            }
            let (Some(level), Some(callee), Some(call)) = (CONSOLE_LEVELS.get(method), callee, call)
            else {
                continue;
            };

            calls.push(CallSite {
                kind: CallKind::Console,
                method: Some(method.to_string()),
                level: *level,
                callee: Span::from_node(callee),
                callee_text: parsed.node_text(callee).to_string(),
                call: Span::from_node(call),
            });
        }

        calls.sort_by_key(|c| c.call.start_byte);
        calls.dedup_by_key(|c| c.call.start_byte);
        Ok(calls)
    }

    /// Walk module-scope statements collecting logger imports, instances and
    /// top-level names.
    fn extract_module_scope(&self, parsed: &ParsedFile) -> ModuleScope {
        let root = parsed.tree.root_node();
        let mut scope = ModuleScope::default();
        let mut cursor = root.walk();

        for child in root.named_children(&mut cursor) {
            let stmt = if child.kind() == "export_statement" {
                child.child_by_field_name("declaration").unwrap_or(child)
            } else {
                child
            };

            match stmt.kind() {
                "import_statement" => self.visit_import(parsed, stmt, &mut scope),
                "lexical_declaration" | "variable_declaration" => {
                    self.visit_declaration(parsed, stmt, &mut scope)
                }
                "function_declaration"
                | "generator_function_declaration"
                | "class_declaration"
                | "abstract_class_declaration" => {
                    if let Some(name) = stmt.child_by_field_name("name") {
                        scope.declared.insert(parsed.node_text(name).to_string());
                    }
                }
                "expression_statement" => {
                    let text = parsed.node_text(stmt);
                    if text.starts_with("module.exports") || text.starts_with("exports.") {
                        scope.uses_commonjs_exports = true;
                    }
                }
                _ => {}
            }
        }

        scope
    }

    fn visit_import(&self, parsed: &ParsedFile, stmt: Node, scope: &mut ModuleScope) {
        scope.has_es_import = true;
        let Some(source) = stmt
            .child_by_field_name("source")
            .and_then(|s| string_value(parsed, s))
        else {
            return;
        };

        let logger_module = is_logger_module(&source);
        if logger_module {
            scope.logger.has_import = true;
        }

        let mut cursor = stmt.walk();
        for clause in stmt.named_children(&mut cursor) {
            if clause.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = clause.walk();
            for binding in clause.named_children(&mut clause_cursor) {
                match binding.kind() {
                    // default import
                    "identifier" => {
                        let name = parsed.node_text(binding);
                        self.bind_module(&source, name, None, scope);
                    }
                    "namespace_import" => {
                        if let Some(ident) = binding.named_child(0) {
                            let name = parsed.node_text(ident);
                            self.bind_module(&source, name, None, scope);
                        }
                    }
                    "named_imports" => {
                        let mut spec_cursor = binding.walk();
                        for spec in binding.named_children(&mut spec_cursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(imported) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let local = spec.child_by_field_name("alias").unwrap_or(imported);
                            self.bind_module(
                                &source,
                                parsed.node_text(local),
                                Some(parsed.node_text(imported)),
                                scope,
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Record a name bound by an import or require of `source`.
    ///
    /// `imported` is the exported name for named imports and `None` when the
    /// whole module (default or namespace) is bound.
    fn bind_module(&self, source: &str, name: &str, imported: Option<&str>, scope: &mut ModuleScope) {
        scope.declared.insert(name.to_string());

        // Anything taken from a backend package is a module or factory, never
        // a ready logger.
        if let Some(backend) = backend_for_module(source) {
            let kind = match (imported, backend) {
                (None, _) => Some(BindingKind::Module),
                (Some("createLogger"), LoggerBackend::Winston) => Some(BindingKind::Factory),
                (Some("pino" | "default"), LoggerBackend::Pino) => Some(BindingKind::Factory),
                _ => None,
            };
            if let (Some(kind), None) = (kind, &scope.logger.binding) {
                scope.logger.binding = Some(LoggerBinding {
                    backend,
                    binding: name.to_string(),
                    kind,
                });
            }
            return;
        }

        if looks_like_logger_name(name) {
            scope.logger.has_import = true;
            scope.logger.add_name(name);
        }
    }

    fn visit_declaration(&self, parsed: &ParsedFile, stmt: Node, scope: &mut ModuleScope) {
        let mut cursor = stmt.walk();
        for declarator in stmt.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let names = bound_identifiers(parsed, name_node);
            for name in &names {
                scope.declared.insert(name.clone());
            }

            let Some(value) = declarator.child_by_field_name("value").map(unwrap_expression)
            else {
                continue;
            };

            if let Some(source) = require_source(parsed, value) {
                scope.has_require_import = true;
                if is_logger_module(&source) {
                    scope.logger.has_import = true;
                }
                // `const { createLogger } = require('winston')` binds exports
                let whole_module = name_node.kind() == "identifier";
                for name in &names {
                    let imported = (!whole_module).then_some(name.as_str());
                    self.bind_module(&source, name, imported, scope);
                }
                continue;
            }

            if name_node.kind() != "identifier" {
                continue;
            }
            let name = parsed.node_text(name_node);
            if self.is_logger_factory(parsed, value, scope) {
                scope.logger.add_instance(name);
            }
        }
    }

    fn is_logger_factory(&self, parsed: &ParsedFile, value: Node, scope: &ModuleScope) -> bool {
        match value.kind() {
            "call_expression" => {
                let Some(callee) = value.child_by_field_name("function") else {
                    return false;
                };

                // require('pino')(...)
                if let Some(source) = require_source(parsed, callee) {
                    return is_logger_module(&source);
                }

                let callee_text: String = parsed
                    .node_text(callee)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                if LOGGER_FACTORIES.contains(callee_text.as_str()) {
                    return true;
                }
                if let Some(binding) = &scope.logger.binding {
                    let factory = match (binding.kind, binding.backend) {
                        (BindingKind::Module, LoggerBackend::Winston) => {
                            format!("{}.createLogger", binding.binding)
                        }
                        _ => binding.binding.clone(),
                    };
                    if callee_text == factory {
                        return true;
                    }
                }

                // parentLogger.child({...})
                if callee.kind() == "member_expression" {
                    let object = callee.child_by_field_name("object");
                    let property = callee.child_by_field_name("property");
                    if let (Some(object), Some(property)) = (object, property) {
                        return parsed.node_text(property) == "child"
                            && scope
                                .logger
                                .names
                                .iter()
                                .any(|n| n == parsed.node_text(object));
                    }
                }
                false
            }
            "new_expression" => value
                .child_by_field_name("constructor")
                .map(|c| {
                    let text = parsed.node_text(c);
                    text == "Logger" || text.ends_with(".Logger")
                })
                .unwrap_or(false),
            _ => false,
        }
    }

    /// End of the leading import block, skipping a shebang and directives.
    fn import_insertion(&self, parsed: &ParsedFile) -> InsertionPoint {
        let root = parsed.tree.root_node();
        let mut cursor = root.walk();
        let mut prelude_end = None;
        let mut block_end = None;

        for child in root.children(&mut cursor) {
            match child.kind() {
                "comment" => continue,
                "hash_bang_line" => prelude_end = Some(child),
                "import_statement" => block_end = Some(child),
                "expression_statement" if block_end.is_none() && is_directive(child) => {
                    prelude_end = Some(child)
                }
                "expression_statement" if is_bare_require(parsed, child) => block_end = Some(child),
                "lexical_declaration" | "variable_declaration" if is_require_declaration(parsed, child) => {
                    block_end = Some(child)
                }
                _ => break,
            }
        }

        match block_end.or(prelude_end) {
            Some(end) => InsertionPoint::after_statement(&parsed.source, end),
            None => InsertionPoint::start(),
        }
    }
}

impl Default for JavaScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for JavaScriptAnalyzer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::JavaScript
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs", "ts", "mts", "cts", "tsx"]
    }

    fn parse(&self, grammar: Grammar, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        parse_with(self.language(grammar), grammar, path, source)
    }

    fn extract_facts(&self, parsed: &ParsedFile) -> anyhow::Result<FileFacts> {
        let calls = self.extract_calls(parsed)?;
        let scope = self.extract_module_scope(parsed);

        let is_cjs_file = Path::new(&parsed.path)
            .extension()
            .map(|e| e == "cjs")
            .unwrap_or(false);
        let commonjs = parsed.grammar == Grammar::JavaScript
            && (is_cjs_file
                || (!scope.has_es_import && (scope.has_require_import || scope.uses_commonjs_exports)));

        Ok(FileFacts {
            path: parsed.path.clone(),
            language: LanguageFamily::JavaScript,
            calls,
            logger: scope.logger,
            declared_names: scope.declared,
            import_insertion: self.import_insertion(parsed),
            module_style: if commonjs {
                ModuleStyle::CommonJs
            } else {
                ModuleStyle::EsModule
            },
            has_parse_errors: parsed.has_errors(),
            parse_error: parsed.first_error(),
        })
    }

    fn import_statement(&self, backend: LoggerBackend, style: ModuleStyle) -> String {
        let module = backend.module();
        match style {
            ModuleStyle::EsModule => format!("import {} from '{}';", module, module),
            ModuleStyle::CommonJs => format!("const {} = require('{}');", module, module),
        }
    }

    fn instance_statement(&self, binding: &LoggerBinding, name: &str) -> String {
        match (binding.kind, binding.backend) {
            (BindingKind::Module, LoggerBackend::Winston) => {
                format!("const {} = {}.createLogger();", name, binding.binding)
            }
            _ => format!("const {} = {}();", name, binding.binding),
        }
    }
}

#[derive(Default)]
struct ModuleScope {
    logger: LoggerFacts,
    declared: HashSet<String>,
    has_es_import: bool,
    has_require_import: bool,
    uses_commonjs_exports: bool,
}

/// Strip wrappers that do not change which value is bound.
fn unwrap_expression(mut node: Node) -> Node {
    while matches!(
        node.kind(),
        "await_expression"
            | "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression"
    ) {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Module named by `require('<module>')`, if `node` is such a call.
fn require_source(parsed: &ParsedFile, node: Node) -> Option<String> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "identifier" || parsed.node_text(callee) != "require" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    string_value(parsed, first)
}

fn string_value(parsed: &ParsedFile, node: Node) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    Some(
        parsed
            .node_text(node)
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string(),
    )
}

/// Identifiers bound by a declarator name (plain or destructured).
fn bound_identifiers(parsed: &ParsedFile, name: Node) -> Vec<String> {
    match name.kind() {
        "identifier" => vec![parsed.node_text(name).to_string()],
        "object_pattern" | "array_pattern" => {
            let mut names = Vec::new();
            let mut stack = vec![name];
            while let Some(node) = stack.pop() {
                match node.kind() {
                    "shorthand_property_identifier_pattern" | "identifier" => {
                        names.push(parsed.node_text(node).to_string())
                    }
                    "pair_pattern" => {
                        if let Some(value) = node.child_by_field_name("value") {
                            stack.push(value);
                        }
                    }
                    _ => {
                        let mut cursor = node.walk();
                        stack.extend(node.named_children(&mut cursor));
                    }
                }
            }
            names.reverse();
            names
        }
        _ => Vec::new(),
    }
}

fn is_logger_module(source: &str) -> bool {
    let root = if source.starts_with('@') {
        source.splitn(3, '/').take(2).collect::<Vec<_>>().join("/")
    } else {
        source.split('/').next().unwrap_or(source).to_string()
    };
    if LOGGER_MODULES.contains(root.as_str()) {
        return true;
    }

    let last = source.rsplit('/').next().unwrap_or(source);
    let stem = last.split('.').next().unwrap_or(last);
    LOGGER_MODULE_SEGMENTS.contains(stem)
}

fn backend_for_module(source: &str) -> Option<LoggerBackend> {
    match source {
        "pino" => Some(LoggerBackend::Pino),
        "winston" => Some(LoggerBackend::Winston),
        _ => None,
    }
}

fn is_directive(node: Node) -> bool {
    node.named_child_count() == 1
        && node
            .named_child(0)
            .map(|c| c.kind() == "string")
            .unwrap_or(false)
}

fn is_bare_require(parsed: &ParsedFile, node: Node) -> bool {
    node.named_child(0)
        .map(|c| require_source(parsed, c).is_some())
        .unwrap_or(false)
}

fn is_require_declaration(parsed: &ParsedFile, node: Node) -> bool {
    let mut cursor = node.walk();
    let declarators: Vec<_> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "variable_declarator")
        .collect();
    !declarators.is_empty()
        && declarators.iter().all(|d| {
            d.child_by_field_name("value")
                .map(|v| {
                    let v = unwrap_expression(v);
                    // require('x') or require('x').member
                    require_source(parsed, v).is_some()
                        || (v.kind() == "member_expression"
                            && v.child_by_field_name("object")
                                .map(|o| require_source(parsed, o).is_some())
                                .unwrap_or(false))
                })
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts_for(path: &str, source: &str) -> FileFacts {
        let analyzer = JavaScriptAnalyzer::new();
        let grammar = Grammar::from_path(Path::new(path)).unwrap();
        let parsed = analyzer
            .parse(grammar, Path::new(path), source.as_bytes())
            .unwrap();
        analyzer.extract_facts(&parsed).unwrap()
    }

    #[test]
    fn test_console_calls_and_levels() {
        let source = r#"
console.log("a");
console.warn("b", ...rest);
console.error?.("c");
console.debug(obj?.field ?? 1);
console.table(rows);
other.log("not console");
"#;
        let facts = facts_for("a.js", source);
        let methods: Vec<_> = facts
            .calls
            .iter()
            .map(|c| (c.method.clone().unwrap(), c.level))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("log".to_string(), LogLevel::Info),
                ("warn".to_string(), LogLevel::Warn),
                ("error".to_string(), LogLevel::Error),
                ("debug".to_string(), LogLevel::Debug),
            ]
        );
        assert_eq!(facts.calls[0].call.start_line, 2);
        assert_eq!(facts.calls[0].callee_text, "console.log");
    }

    #[test]
    fn test_typescript_and_tsx_syntax() {
        let ts = r#"
@Component()
class Widget {
  async *items(): AsyncGenerator<number> {
    const { a, ...rest } = this.opts ?? {};
    console.info(a, rest);
  }
}
"#;
        let facts = facts_for("widget.ts", ts);
        assert!(!facts.has_parse_errors);
        assert_eq!(facts.calls.len(), 1);

        let tsx = r#"
export function App() {
  console.log("render");
  return <div onClick={() => console.warn("click")}>hi</div>;
}
"#;
        let facts = facts_for("App.tsx", tsx);
        assert!(!facts.has_parse_errors);
        assert_eq!(facts.calls.len(), 2);
    }

    #[test]
    fn test_detects_existing_pino_instance() {
        let source = r#"import pino from 'pino';
const appLog = pino({ level: 'info' });
console.log("x");
"#;
        let facts = facts_for("a.ts", source);
        assert!(facts.logger.has_import);
        assert!(facts.logger.has_instance);
        assert_eq!(facts.logger.names, vec!["appLog"]);
        let binding = facts.logger.binding.unwrap();
        assert_eq!(binding.backend, LoggerBackend::Pino);
        assert_eq!(binding.binding, "pino");
    }

    #[test]
    fn test_named_logger_import_counts_as_instance() {
        let source = "import { logger } from './utils/logger';\nconsole.log(1);\n";
        let facts = facts_for("a.js", source);
        assert!(facts.logger.has_import);
        assert_eq!(facts.logger.names, vec!["logger"]);
    }

    #[test]
    fn test_backend_factory_import_is_not_instance() {
        let source = "import { createLogger, format } from 'winston';\n\nconsole.log('hi');\n";
        let facts = facts_for("a.js", source);
        assert!(facts.logger.has_import);
        assert!(!facts.logger.has_instance);
        let binding = facts.logger.binding.unwrap();
        assert_eq!(binding.kind, BindingKind::Factory);
        assert_eq!(binding.binding, "createLogger");

        let facts = facts_for("a.js", "import logger from 'pino';\nconsole.log(1);\n");
        assert!(!facts.logger.has_instance);
        let binding = facts.logger.binding.unwrap();
        assert_eq!(binding.kind, BindingKind::Module);
        assert_eq!(binding.binding, "logger");
    }

    #[test]
    fn test_instance_from_factory_preferred_over_import() {
        let source = "import { logger } from './logger';\nimport { createLogger } from 'winston';\nconst appLog = createLogger();\n";
        let facts = facts_for("a.ts", source);
        assert_eq!(facts.logger.names, vec!["logger", "appLog"]);
        assert_eq!(facts.logger.preferred_name(), Some("appLog"));
    }

    #[test]
    fn test_instance_statement_templates() {
        let analyzer = JavaScriptAnalyzer::new();
        let factory = LoggerBinding {
            backend: LoggerBackend::Winston,
            binding: "createLogger".to_string(),
            kind: BindingKind::Factory,
        };
        assert_eq!(analyzer.instance_statement(&factory, "logger"), "const logger = createLogger();");
        assert_eq!(
            analyzer.instance_statement(&LoggerBinding::module(LoggerBackend::Winston), "logger"),
            "const logger = winston.createLogger();"
        );
        assert_eq!(
            analyzer.instance_statement(&LoggerBinding::module(LoggerBackend::Pino), "log"),
            "const log = pino();"
        );
    }

    #[test]
    fn test_function_scoped_logger_ignored() {
        let source = r#"import pino from 'pino';
function handler() {
  const log = pino();
  console.log("x");
}
"#;
        let facts = facts_for("a.js", source);
        assert!(facts.logger.has_import);
        assert!(!facts.logger.has_instance);
    }

    #[test]
    fn test_class_named_logger_import_is_not_instance() {
        let source = "import { Logger } from '@nestjs/common';\n";
        let facts = facts_for("a.ts", source);
        assert!(!facts.logger.has_instance);
    }

    #[test]
    fn test_commonjs_detection() {
        let facts = facts_for("a.js", "const fs = require('fs');\nconsole.log(1);\n");
        assert_eq!(facts.module_style, ModuleStyle::CommonJs);
        let facts = facts_for("a.js", "import fs from 'fs';\nconsole.log(1);\n");
        assert_eq!(facts.module_style, ModuleStyle::EsModule);
        let facts = facts_for("a.cjs", "console.log(1);\n");
        assert_eq!(facts.module_style, ModuleStyle::CommonJs);
    }

    #[test]
    fn test_require_logger_instance() {
        let source = "const log = require('pino')();\n";
        let facts = facts_for("a.js", source);
        assert!(facts.logger.has_instance);
        assert_eq!(facts.logger.names, vec!["log"]);
    }

    #[test]
    fn test_import_insertion_after_block() {
        let source = "#!/usr/bin/env node\n'use strict';\nimport a from 'a';\nimport b from 'b';\n\nconsole.log(a, b);\n";
        let facts = facts_for("a.mjs", source);
        assert_eq!(facts.import_insertion.line, 5);
        assert_eq!(&source[facts.import_insertion.byte..], "\nconsole.log(a, b);\n");
    }

    #[test]
    fn test_import_insertion_before_same_line_statement() {
        let source = "import pino from 'pino'; console.log(1);\n";
        let point = facts_for("a.js", source).import_insertion;
        assert!(point.mid_line);
        assert_eq!(point.byte, "import pino from 'pino';".len());
        assert_eq!(point.line, 2);
    }

    #[test]
    fn test_import_insertion_without_imports() {
        let facts = facts_for("a.js", "console.log(1);\n");
        assert_eq!(facts.import_insertion, InsertionPoint::start());

        let facts = facts_for("a.js", "'use strict';\nconsole.log(1);\n");
        assert_eq!(facts.import_insertion.line, 2);
    }

    #[test]
    fn test_parse_error_reported() {
        let facts = facts_for("a.js", "function broken( {\n  console.log(1);\n");
        assert!(facts.has_parse_errors);
        assert!(facts.parse_error.is_some());
    }

    #[test]
    fn test_logger_module_recognition() {
        assert!(is_logger_module("pino"));
        assert!(is_logger_module("winston/lib/winston/transports"));
        assert!(is_logger_module("../infra/logger"));
        assert!(is_logger_module("@acme/logger"));
        assert!(is_logger_module("./log.js"));
        assert!(!is_logger_module("lodash"));
        assert!(!is_logger_module("./catalog"));
    }
}
