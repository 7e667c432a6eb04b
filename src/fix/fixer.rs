//! Rewrites ad-hoc logging calls to a structured logger.
//!
//! The fixer never trusts an earlier detector pass: it re-reads and re-parses
//! the file, plans byte-range edits against the fresh tree, applies them to
//! the original text and re-parses the result before anything is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::edits::{apply_edits, TextEdit};
use super::naming::logger_name_for;
use super::{ChangeType, FixChange, FixErrorKind, FixOptions, FixResult};
use crate::analysis::{analyzer_for, CallSite, FileFacts, Grammar, LanguageFamily, LoggerBinding};
use crate::config::{Config, LanguageConfig, SyntaxCheckConfig};
use crate::detect::{active_calls, parse_and_extract, syntax_error_message, Detector};
use crate::error::ConfigError;
use crate::fs_util::write_atomic;
use crate::interpreter::check_syntax;

/// A fix computed in memory, not yet checked externally or written.
#[derive(Debug, Clone)]
pub struct FixPlan {
    path: PathBuf,
    syntax_check: Option<SyntaxCheckConfig>,
    result: FixResult,
}

/// Plans and applies fixes for files under one project root.
pub struct Fixer {
    detector: Arc<Detector>,
}

impl Fixer {
    pub fn new<P: AsRef<Path>>(root: P, config: Arc<Config>) -> Result<Self, ConfigError> {
        Ok(Self::with_detector(Arc::new(Detector::new(root, config)?)))
    }

    /// Share the classifier and config of an existing detector.
    pub fn with_detector(detector: Arc<Detector>) -> Self {
        Self { detector }
    }

    /// Plan, verify and (unless `dry_run`) write the fix for one file.
    pub async fn fix(&self, path: &Path, options: FixOptions) -> FixResult {
        let plan = self.plan(path);
        self.apply(plan, options).await
    }

    /// Compute the fixed content in memory.
    ///
    /// This is pure CPU work and safe to run on a blocking thread.
    pub fn plan(&self, path: &Path) -> FixPlan {
        let file_path = self.detector.display_path(path);
        let mut plan = FixPlan {
            path: path.to_path_buf(),
            syntax_check: None,
            result: FixResult::unchanged(file_path.clone(), String::new()),
        };

        let Some(grammar) = Grammar::from_path(path) else {
            plan.result = FixResult::failed(
                file_path,
                String::new(),
                FixErrorKind::UnsupportedLanguage,
                format!("no analyzer for {}", path.display()),
            );
            return plan;
        };
        let family = grammar.family();
        let lang = self.detector.config().language(family);
        if !lang.enabled || !lang.auto_fix {
            debug!(file = %file_path, %family, "auto-fix disabled");
            return plan;
        }
        if let Some(reason) = self.detector.classify(path).reason {
            debug!(file = %file_path, %reason, "excluded from fixing");
            return plan;
        }

        let original = match std::fs::read(path).map(String::from_utf8) {
            Ok(Ok(content)) => content,
            Ok(Err(_)) => {
                plan.result = FixResult::failed(
                    file_path,
                    String::new(),
                    FixErrorKind::Io,
                    format!("{} is not valid UTF-8", path.display()),
                );
                return plan;
            }
            Err(e) => {
                plan.result = FixResult::failed(
                    file_path,
                    String::new(),
                    FixErrorKind::Io,
                    format!("reading {}: {}", path.display(), e),
                );
                return plan;
            }
        };
        plan.result = FixResult::unchanged(file_path.clone(), original.clone());

        let (parsed, facts) = match parse_and_extract(grammar, path, original.as_bytes()) {
            Ok(pair) => pair,
            Err(e) => {
                plan.result.fail(FixErrorKind::Parse, e.to_string());
                return plan;
            }
        };
        if let Some(message) = syntax_error_message(&file_path, &facts) {
            plan.result.fail(FixErrorKind::Parse, message);
            return plan;
        }

        let calls = active_calls(&parsed, &facts, lang);
        if calls.is_empty() {
            return plan;
        }
        if facts.logger.preferred_name().is_none() {
            let point = facts.import_insertion;
            if let Some(early) = calls.iter().find(|c| c.call.start_byte < point.byte) {
                plan.result.fail(
                    FixErrorKind::Regeneration,
                    format!(
                        "call at {}:{} runs before the logger could be declared at line {}",
                        file_path, early.call, point.line
                    ),
                );
                return plan;
            }
        }

        let (edits, changes) = build_edits(&file_path, family, lang, &facts, &calls);
        let fixed = match apply_edits(&original, edits) {
            Ok(fixed) => fixed,
            Err(e) => {
                plan.result.fail(FixErrorKind::Regeneration, e.to_string());
                return plan;
            }
        };

        match parse_and_extract(grammar, path, fixed.as_bytes()) {
            Ok((_, refacts)) => {
                if let Some(message) = syntax_error_message(&file_path, &refacts) {
                    plan.result.fail(
                        FixErrorKind::Regeneration,
                        format!("regenerated source does not parse: {}", message),
                    );
                    return plan;
                }
            }
            Err(e) => {
                plan.result.fail(FixErrorKind::Regeneration, e.to_string());
                return plan;
            }
        }

        plan.result.fixed_content = fixed;
        plan.result.changes = changes;
        plan.syntax_check = lang.syntax_check.clone();
        plan
    }

    /// Run the external check and write the planned content.
    pub async fn apply(&self, plan: FixPlan, options: FixOptions) -> FixResult {
        let FixPlan {
            path,
            syntax_check,
            mut result,
        } = plan;
        if !result.success || !result.has_changes() {
            return result;
        }

        if let Some(check) = &syntax_check {
            if let Err(e) = check_syntax(check, &result.fixed_content).await {
                warn!(file = %result.file_path, error = %e, "interpreter rejected fixed source");
                result.fail(FixErrorKind::ExternalInterpreter, e.to_string());
                return result;
            }
        }

        if options.dry_run {
            debug!(file = %result.file_path, changes = result.changes.len(), "dry run");
            return result;
        }

        if let Err(e) = write_atomic(&path, result.fixed_content.as_bytes()) {
            result.fail(FixErrorKind::Io, format!("writing {}: {}", path.display(), e));
            return result;
        }
        result.written = true;
        info!(
            file = %result.file_path,
            calls = result.calls_rewritten(),
            changes = result.changes.len(),
            "fixed"
        );
        result
    }
}

/// Edits for one file plus the changes they make, positioned in the output.
fn build_edits(
    file_path: &str,
    family: LanguageFamily,
    lang: &LanguageConfig,
    facts: &FileFacts,
    calls: &[CallSite],
) -> (Vec<TextEdit>, Vec<FixChange>) {
    let analyzer = analyzer_for(family);
    let mut inserted: Vec<(ChangeType, String)> = Vec::new();

    let name = match facts.logger.preferred_name() {
        Some(existing) => existing.to_string(),
        None => {
            let name = logger_name_for(file_path, family, lang, &facts.declared_names);
            let binding = match &facts.logger.binding {
                Some(b) => b.clone(),
                None => {
                    let binding = LoggerBinding::module(lang.logger_backend);
                    inserted.push((
                        ChangeType::ImportAdded,
                        analyzer.import_statement(binding.backend, facts.module_style),
                    ));
                    binding
                }
            };
            inserted.push((
                ChangeType::LoggerInstanceAdded,
                analyzer.instance_statement(&binding, &name),
            ));
            name
        }
    };

    let mut edits = Vec::new();
    let mut changes = Vec::new();
    let point = facts.import_insertion;

    if !inserted.is_empty() {
        let lines: Vec<&str> = inserted.iter().map(|(_, line)| line.as_str()).collect();
        let mut text = String::new();
        if point.needs_leading_newline {
            text.push('\n');
        }
        text.push_str(&lines.join("\n"));
        if !point.mid_line {
            text.push('\n');
        }
        for (offset, (change_type, line)) in inserted.iter().enumerate() {
            changes.push(FixChange {
                line: point.line + offset,
                column: 1,
                old: String::new(),
                new: line.clone(),
                change_type: *change_type,
            });
        }
        edits.push(TextEdit::insert(point.byte, text));
    }

    // Calls sharing the import's last line continue the last inserted line.
    let tail_width = inserted.last().map(|(_, line)| line.len()).unwrap_or(0);
    for call in calls {
        let new = format!("{}.{}", name, call.level.method(family));
        let shifted = !inserted.is_empty() && call.callee.start_byte >= point.byte;
        let same_line = shifted && point.mid_line && call.callee.start_line + 1 == point.line;
        changes.push(FixChange {
            line: call.callee.start_line + if shifted { inserted.len() } else { 0 },
            column: if same_line {
                tail_width + (call.callee.start_byte - point.byte) + 1
            } else {
                call.callee.start_col
            },
            old: call.callee_text.clone(),
            new: new.clone(),
            change_type: ChangeType::CallRewrite,
        });
        edits.push(TextEdit::replace(call.callee.start_byte, call.callee.end_byte, new));
    }

    changes.sort_by_key(|c| (c.line, c.column));
    (edits, changes)
}
