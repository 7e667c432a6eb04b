//! Python language analyzer using tree-sitter.

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

const CALL_QUERY: &str = r#"
(call
  function: (_) @callee
) @call
"#;

/// Print-like callees: kind, method variant and mapped level.
static PRINT_CALLS: phf::Map<&'static str, (CallKind, Option<&'static str>, LogLevel)> = phf_map! {
    "print" => (CallKind::Print, None, LogLevel::Info),
    "pprint" => (CallKind::Print, Some("pprint"), LogLevel::Debug),
    "pprint.pprint" => (CallKind::Print, Some("pprint"), LogLevel::Debug),
    "sys.stdout.write" => (CallKind::Console, Some("stdout.write"), LogLevel::Info),
    "sys.stderr.write" => (CallKind::Console, Some("stderr.write"), LogLevel::Error),
};

static LOGGER_MODULES: phf::Set<&'static str> = phf_set! {
    "logging",
    "structlog",
    "loguru",
};

static LOGGER_FACTORIES: phf::Set<&'static str> = phf_set! {
    "logging.getLogger",
    "structlog.get_logger",
    "structlog.getLogger",
    "structlog.stdlib.get_logger",
    "getLogger",
    "get_logger",
    "loguru.logger.bind",
};

pub struct PythonAnalyzer {
    language: Language,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn extract_calls(&self, parsed: &ParsedFile) -> anyhow::Result<Vec<CallSite>> {
        let query = Query::new(&self.language, CALL_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut calls = Vec::new();
        while let Some(m) = matches.next() {
            let mut callee = None;
            let mut call = None;
            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "callee" => callee = Some(capture.node),
                    "call" => call = Some(capture.node),
                    _ => {}
                }
            }
            let (Some(callee), Some(call)) = (callee, call) else {
                continue;
            };

            let callee_text = compact(parsed.node_text(callee));
            let Some((kind, method, level)) = PRINT_CALLS.get(callee_text.as_str()) else {
                continue;
            };

            calls.push(CallSite {
                kind: *kind,
                method: method.map(|m| m.to_string()),
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

    fn extract_module_scope(&self, parsed: &ParsedFile) -> (LoggerFacts, HashSet<String>) {
        let root = parsed.tree.root_node();
        let mut logger = LoggerFacts::default();
        let mut declared = HashSet::new();
        let mut cursor = root.walk();

        for child in root.named_children(&mut cursor) {
            let stmt = if child.kind() == "decorated_definition" {
                child.child_by_field_name("definition").unwrap_or(child)
            } else {
                child
            };

            match stmt.kind() {
                "import_statement" => {
                    let mut names_cursor = stmt.walk();
                    for name in stmt.children_by_field_name("name", &mut names_cursor) {
                        let (dotted, alias) = import_name(parsed, name);
                        let root_module = dotted.split('.').next().unwrap_or(&dotted).to_string();
                        let local = alias.clone().unwrap_or_else(|| root_module.clone());
                        declared.insert(local.clone());

                        if LOGGER_MODULES.contains(root_module.as_str()) {
                            logger.has_import = true;
                        }
                        if let Some(backend) = backend_for_module(&root_module) {
                            // `import logging.config as cfg` does not bind `logging`
                            if (alias.is_none() || dotted == root_module) && logger.binding.is_none() {
                                logger.binding = Some(LoggerBinding {
                                    backend,
                                    binding: local,
                                    kind: BindingKind::Module,
                                });
                            }
                        }
                    }
                }
                "import_from_statement" => {
                    let module = stmt
                        .child_by_field_name("module_name")
                        .map(|m| parsed.node_text(m).to_string())
                        .unwrap_or_default();
                    let root_module = module.split('.').next().unwrap_or("").to_string();
                    if LOGGER_MODULES.contains(root_module.as_str()) {
                        logger.has_import = true;
                    }

                    let mut names_cursor = stmt.walk();
                    for name in stmt.children_by_field_name("name", &mut names_cursor) {
                        let (imported, alias) = import_name(parsed, name);
                        let local = alias.unwrap_or_else(|| imported.clone());
                        declared.insert(local.clone());
                        if let Some(backend) = backend_for_module(&root_module) {
                            if matches!(imported.as_str(), "getLogger" | "get_logger")
                                && logger.binding.is_none()
                            {
                                logger.binding = Some(LoggerBinding {
                                    backend,
                                    binding: local.clone(),
                                    kind: BindingKind::Factory,
                                });
                            }
                        }
                        let loguru_logger = root_module == "loguru" && imported == "logger";
                        if loguru_logger || looks_like_logger_name(&local) {
                            logger.has_import = true;
                            logger.add_name(&local);
                        }
                    }
                }
                "function_definition" | "class_definition" => {
                    if let Some(name) = stmt.child_by_field_name("name") {
                        declared.insert(parsed.node_text(name).to_string());
                    }
                }
                "expression_statement" => {
                    let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment")
                    else {
                        continue;
                    };
                    let Some(left) = assignment.child_by_field_name("left") else {
                        continue;
                    };
                    collect_identifiers(parsed, left, &mut declared);

                    if left.kind() != "identifier" {
                        continue;
                    }
                    let is_factory = assignment
                        .child_by_field_name("right")
                        .map(|right| self.is_logger_factory(parsed, right, &logger))
                        .unwrap_or(false);
                    if is_factory {
                        logger.add_instance(parsed.node_text(left));
                    }
                }
                _ => {}
            }
        }

        (logger, declared)
    }

    fn is_logger_factory(&self, parsed: &ParsedFile, value: Node, logger: &LoggerFacts) -> bool {
        if value.kind() != "call" {
            return false;
        }
        let Some(callee) = value.child_by_field_name("function") else {
            return false;
        };
        let callee_text = compact(parsed.node_text(callee));
        if LOGGER_FACTORIES.contains(callee_text.as_str()) {
            return true;
        }
        if let Some(binding) = &logger.binding {
            let factory = match (binding.kind, binding.backend) {
                (BindingKind::Factory, _) => binding.binding.clone(),
                (BindingKind::Module, LoggerBackend::Structlog) => {
                    format!("{}.get_logger", binding.binding)
                }
                (BindingKind::Module, _) => format!("{}.getLogger", binding.binding),
            };
            if callee_text == factory {
                return true;
            }
        }

        // parent.bind(...), parent.getChild(...)
        if callee.kind() == "attribute" {
            let object = callee.child_by_field_name("object");
            let attribute = callee.child_by_field_name("attribute");
            if let (Some(object), Some(attribute)) = (object, attribute) {
                let method = parsed.node_text(attribute);
                let parent = parsed.node_text(object);
                return matches!(method, "bind" | "getChild" | "new")
                    && logger.names.iter().any(|n| n == parent);
            }
        }
        false
    }

    /// End of the leading import block, after a shebang, encoding cookie or
    /// module docstring.
    fn import_insertion(&self, parsed: &ParsedFile) -> InsertionPoint {
        let root = parsed.tree.root_node();
        let mut cursor = root.walk();
        let mut prelude_end = None;
        let mut block_end = None;
        let mut seen_docstring = false;

        for child in root.children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    let text = parsed.node_text(child);
                    let header = child.start_position().row <= 1
                        && (text.starts_with("#!") || text.contains("coding"));
                    if header && block_end.is_none() {
                        prelude_end = Some(child);
                    }
                }
                "expression_statement"
                    if block_end.is_none() && !seen_docstring && is_docstring(child) =>
                {
                    seen_docstring = true;
                    prelude_end = Some(child);
                }
                "future_import_statement" | "import_statement" | "import_from_statement" => {
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

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn family(&self) -> LanguageFamily {
        LanguageFamily::Python
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn parse(&self, grammar: Grammar, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        parse_with(&self.language, grammar, path, source)
    }

    fn extract_facts(&self, parsed: &ParsedFile) -> anyhow::Result<FileFacts> {
        let calls = self.extract_calls(parsed)?;
        let (logger, declared_names) = self.extract_module_scope(parsed);

        Ok(FileFacts {
            path: parsed.path.clone(),
            language: LanguageFamily::Python,
            calls,
            logger,
            declared_names,
            import_insertion: self.import_insertion(parsed),
            module_style: ModuleStyle::EsModule,
            has_parse_errors: parsed.has_errors(),
            parse_error: parsed.first_error(),
        })
    }

    fn import_statement(&self, backend: LoggerBackend, _style: ModuleStyle) -> String {
        format!("import {}", backend.module())
    }

    fn instance_statement(&self, binding: &LoggerBinding, name: &str) -> String {
        match (binding.kind, binding.backend) {
            (BindingKind::Factory, _) => format!("{} = {}(__name__)", name, binding.binding),
            (BindingKind::Module, LoggerBackend::Structlog) => {
                format!("{} = {}.get_logger(__name__)", name, binding.binding)
            }
            (BindingKind::Module, _) => format!("{} = {}.getLogger(__name__)", name, binding.binding),
        }
    }
}

/// Imported dotted name and optional alias.
fn import_name(parsed: &ParsedFile, node: Node) -> (String, Option<String>) {
    if node.kind() == "aliased_import" {
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(n).to_string())
            .unwrap_or_default();
        let alias = node
            .child_by_field_name("alias")
            .map(|n| parsed.node_text(n).to_string());
        (name, alias)
    } else {
        (parsed.node_text(node).to_string(), None)
    }
}

fn collect_identifiers(parsed: &ParsedFile, node: Node, out: &mut HashSet<String>) {
    if node.kind() == "identifier" {
        out.insert(parsed.node_text(node).to_string());
        return;
    }
    if matches!(node.kind(), "pattern_list" | "tuple_pattern" | "list_pattern") {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            collect_identifiers(parsed, child, out);
        }
    }
}

fn backend_for_module(module: &str) -> Option<LoggerBackend> {
    match module {
        "logging" => Some(LoggerBackend::Logging),
        "structlog" => Some(LoggerBackend::Structlog),
        _ => None,
    }
}

fn is_docstring(node: Node) -> bool {
    node.named_child_count() == 1
        && node
            .named_child(0)
            .map(|c| c.kind() == "string")
            .unwrap_or(false)
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts_for(source: &str) -> FileFacts {
        let analyzer = PythonAnalyzer::new();
        let parsed = analyzer
            .parse(Grammar::Python, Path::new("mod.py"), source.as_bytes())
            .unwrap();
        analyzer.extract_facts(&parsed).unwrap()
    }

    #[test]
    fn test_print_like_calls() {
        let source = r#"
import sys
from pprint import pprint

def run(items):
    print("start", *items, sep=", ")
    pprint(items)
    sys.stderr.write("boom\n")
    sys.stdout.write("ok\n")
    printer.print("not flagged")
"#;
        let facts = facts_for(source);
        let kinds: Vec<_> = facts
            .calls
            .iter()
            .map(|c| (c.kind, c.method.clone(), c.level))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (CallKind::Print, None, LogLevel::Info),
                (CallKind::Print, Some("pprint".to_string()), LogLevel::Debug),
                (CallKind::Console, Some("stderr.write".to_string()), LogLevel::Error),
                (CallKind::Console, Some("stdout.write".to_string()), LogLevel::Info),
            ]
        );
        assert_eq!(facts.calls[0].call.start_line, 6);
        assert_eq!(facts.calls[0].call.start_col, 5);
    }

    #[test]
    fn test_modern_syntax_parses() {
        let source = r#"
@dataclass
class Job:
    name: str

async def stream(jobs):
    async for job in jobs:
        if (n := len(job.name)) > 3:
            print(f"{job.name=}", n)
        yield job

match command:
    case {"action": action, **rest}:
        print(action, rest)
"#;
        let facts = facts_for(source);
        assert!(!facts.has_parse_errors);
        assert_eq!(facts.calls.len(), 2);
    }

    #[test]
    fn test_existing_logging_instance() {
        let source = "import logging\n\napp_log = logging.getLogger(__name__)\n";
        let facts = facts_for(source);
        assert!(facts.logger.has_import);
        assert_eq!(facts.logger.names, vec!["app_log"]);
        let binding = facts.logger.binding.unwrap();
        assert_eq!(binding.backend, LoggerBackend::Logging);
        assert_eq!(binding.binding, "logging");
    }

    #[test]
    fn test_aliased_backend_import() {
        let source = "import structlog as sl\nlog = sl.get_logger()\n";
        let facts = facts_for(source);
        assert_eq!(facts.logger.names, vec!["log"]);
        assert_eq!(facts.logger.binding.unwrap().binding, "sl");
    }

    #[test]
    fn test_loguru_logger_import() {
        let facts = facts_for("from loguru import logger\n");
        assert!(facts.logger.has_import);
        assert_eq!(facts.logger.names, vec!["logger"]);
        assert!(facts.logger.binding.is_none());
    }

    #[test]
    fn test_factory_import_is_not_an_instance() {
        let facts = facts_for("from logging import getLogger\n\nprint('hi')\n");
        assert!(facts.logger.has_import);
        assert!(!facts.logger.has_instance);
        let binding = facts.logger.binding.unwrap();
        assert_eq!(binding.kind, BindingKind::Factory);
        assert_eq!(binding.binding, "getLogger");
        assert_eq!(binding.backend, LoggerBackend::Logging);
    }

    #[test]
    fn test_instance_from_imported_factory() {
        let source = "from structlog import get_logger as gl\nlog = gl()\n";
        let facts = facts_for(source);
        assert_eq!(facts.logger.names, vec!["log"]);
        assert_eq!(facts.logger.preferred_name(), Some("log"));
        assert_eq!(facts.logger.binding.unwrap().backend, LoggerBackend::Structlog);
    }

    #[test]
    fn test_instance_statement_templates() {
        let analyzer = PythonAnalyzer::new();
        let factory = LoggerBinding {
            backend: LoggerBackend::Logging,
            binding: "getLogger".to_string(),
            kind: BindingKind::Factory,
        };
        assert_eq!(
            analyzer.instance_statement(&factory, "logger"),
            "logger = getLogger(__name__)"
        );
        assert_eq!(
            analyzer.instance_statement(&LoggerBinding::module(LoggerBackend::Structlog), "log"),
            "log = structlog.get_logger(__name__)"
        );
    }

    #[test]
    fn test_function_scoped_logger_ignored() {
        let source = "import logging\n\ndef f():\n    log = logging.getLogger('x')\n    print(1)\n";
        let facts = facts_for(source);
        assert!(facts.logger.has_import);
        assert!(!facts.logger.has_instance);
    }

    #[test]
    fn test_import_insertion_after_docstring_and_imports() {
        let source = "#!/usr/bin/env python3\n\"\"\"Module docs.\"\"\"\nfrom __future__ import annotations\nimport os\n\nprint(os.getcwd())\n";
        let facts = facts_for(source);
        assert_eq!(facts.import_insertion.line, 5);
    }

    #[test]
    fn test_import_insertion_before_same_line_statement() {
        let facts = facts_for("import os; print(os.sep)\n");
        let point = facts.import_insertion;
        assert!(point.mid_line);
        assert!(point.needs_leading_newline);
        assert_eq!(point.byte, "import os".len());
        assert_eq!(point.line, 2);

        let facts = facts_for("import os  # paths\nprint(os.sep)\n");
        assert!(!facts.import_insertion.mid_line);
        assert_eq!(facts.import_insertion.line, 2);
    }

    #[test]
    fn test_import_insertion_after_shebang_only() {
        let facts = facts_for("#!/usr/bin/env python3\nprint('hi')\n");
        assert_eq!(facts.import_insertion.line, 2);

        let facts = facts_for("# greeting helper\nprint('hi')\n");
        assert_eq!(facts.import_insertion, InsertionPoint::start());
    }

    #[test]
    fn test_unbalanced_syntax_reported() {
        let facts = facts_for("def broken(:\n    print('x'\n");
        assert!(facts.has_parse_errors);
    }
}
