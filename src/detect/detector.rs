//! Per-file detection of ad-hoc logging calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::exclusion::relative_path;
use super::{
    filter_calls, parse_suppressions, Classification, ExclusionClassifier, FileAnalysisResult,
    FileErrorKind, Violation,
};
use crate::analysis::{analyzer_for, CallSite, FileFacts, Grammar, ParsedFile};
use crate::config::{Config, LanguageConfig};
use crate::error::ConfigError;

/// Classifies and analyzes files. Never modifies them.
pub struct Detector {
    root: PathBuf,
    config: Arc<Config>,
    classifier: ExclusionClassifier,
}

impl Detector {
    /// Create a detector for files under `root`.
    pub fn new<P: AsRef<Path>>(root: P, config: Arc<Config>) -> Result<Self, ConfigError> {
        let root = root.as_ref().to_path_buf();
        let classifier = ExclusionClassifier::new(&root, &config)?;
        Ok(Self {
            root,
            config,
            classifier,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classify(&self, path: &Path) -> Classification {
        self.classifier.classify(path)
    }

    /// Project-relative display path for `path`.
    pub fn display_path(&self, path: &Path) -> String {
        relative_path(&self.root, path)
    }

    /// Analyze one file.
    ///
    /// Failures are reported on the result, never as an error.
    pub fn analyze(&self, path: &Path) -> FileAnalysisResult {
        let file_path = self.display_path(path);

        let Some(grammar) = Grammar::from_path(path) else {
            return FileAnalysisResult::failed(
                file_path,
                None,
                FileErrorKind::UnsupportedLanguage,
                format!("no analyzer for {}", path.display()),
            );
        };
        let family = grammar.family();
        let lang = self.config.language(family);
        if !lang.enabled {
            debug!(file = %file_path, %family, "language disabled");
            return FileAnalysisResult::new(file_path, Some(family));
        }

        let classification = self.classify(path);
        if let Some(reason) = classification.reason {
            debug!(file = %file_path, %reason, "excluded");
            return FileAnalysisResult::excluded(file_path, Some(family), reason);
        }

        let source = match std::fs::read(path) {
            Ok(s) => s,
            Err(e) => {
                return FileAnalysisResult::failed(
                    file_path,
                    Some(family),
                    FileErrorKind::Io,
                    format!("reading {}: {}", path.display(), e),
                )
            }
        };

        let (parsed, facts) = match parse_and_extract(grammar, path, &source) {
            Ok(pair) => pair,
            Err(e) => {
                return FileAnalysisResult::failed(
                    file_path,
                    Some(family),
                    FileErrorKind::Parse,
                    e.to_string(),
                )
            }
        };
        if let Some(message) = syntax_error_message(&file_path, &facts) {
            return FileAnalysisResult::failed(file_path, Some(family), FileErrorKind::Parse, message);
        }

        let mut result = FileAnalysisResult::new(file_path, Some(family));
        result.has_logger_import = facts.logger.has_import;
        result.has_logger_instance = facts.logger.has_instance;
        result.logger_names = facts.logger.names.clone();
        result.violations = active_calls(&parsed, &facts, lang)
            .iter()
            .map(|call| Violation::from_call(&result.file_path, call, lang.severity))
            .collect();
        result
            .violations
            .sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));

        debug!(
            file = %result.file_path,
            violations = result.violations.len(),
            has_logger = result.has_logger_instance,
            "analyzed"
        );
        result
    }
}

pub(crate) fn parse_and_extract(
    grammar: Grammar,
    path: &Path,
    source: &[u8],
) -> anyhow::Result<(ParsedFile, FileFacts)> {
    let analyzer = analyzer_for(grammar.family());
    let parsed = analyzer.parse(grammar, path, source)?;
    let facts = analyzer.extract_facts(&parsed)?;
    Ok((parsed, facts))
}

/// Human-readable location of the first syntax error, if the tree has one.
pub(crate) fn syntax_error_message(file_path: &str, facts: &FileFacts) -> Option<String> {
    if !facts.has_parse_errors {
        return None;
    }
    Some(match facts.parse_error {
        Some(span) => format!("syntax error at {}:{}", file_path, span),
        None => format!("syntax error in {}", file_path),
    })
}

/// Detected calls minus those silenced by a disable-next-line comment.
pub(crate) fn active_calls(
    parsed: &ParsedFile,
    facts: &FileFacts,
    lang: &LanguageConfig,
) -> Vec<CallSite> {
    let suppressions = parse_suppressions(parsed, &lang.disable_next_line_markers);
    filter_calls(facts.calls.clone(), &suppressions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CallKind, LanguageFamily, LogLevel};
    use crate::detect::ExclusionReason;
    use tempfile::TempDir;

    fn detector(temp: &TempDir) -> Detector {
        Detector::new(temp.path(), Arc::new(Config::default())).unwrap()
    }

    #[test]
    fn test_python_violations_sorted() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.py");
        std::fs::write(
            &file,
            "import sys\n\ndef main():\n    sys.stderr.write('x')\n    print('a'); print('b')\n",
        )
        .unwrap();

        let result = detector(&temp).analyze(&file);
        assert_eq!(result.file_path, "app.py");
        assert_eq!(result.language, Some(LanguageFamily::Python));
        let positions: Vec<_> = result.violations.iter().map(|v| (v.line, v.column)).collect();
        assert_eq!(positions, vec![(4, 5), (5, 5), (5, 17)]);
        assert_eq!(result.violations[0].kind, CallKind::Console);
        assert_eq!(result.violations[0].level, LogLevel::Error);
        assert_eq!(result.violations[0].method.as_deref(), Some("stderr.write"));
    }

    #[test]
    fn test_excluded_file_short_circuits() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("app.test.ts");
        // Not valid TypeScript: proves the parser is never reached.
        std::fs::write(&file, "console.log(((;\n").unwrap();

        let result = detector(&temp).analyze(&file);
        assert!(result.excluded);
        assert_eq!(result.exclusion_reason, Some(ExclusionReason::TestFile));
        assert!(result.violations.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_unsupported_language() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("main.rb");
        std::fs::write(&file, "puts 'hi'\n").unwrap();

        let result = detector(&temp).analyze(&file);
        assert_eq!(result.error_kind, Some(FileErrorKind::UnsupportedLanguage));
        assert!(result.language.is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = detector(&temp).analyze(&temp.path().join("gone.js"));
        assert_eq!(result.error_kind, Some(FileErrorKind::Io));
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_parse_error_has_no_violations() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("broken.js");
        std::fs::write(&file, "function f( {\n  console.log('x');\n").unwrap();

        let result = detector(&temp).analyze(&file);
        assert_eq!(result.error_kind, Some(FileErrorKind::Parse));
        assert!(result.error.unwrap().starts_with("syntax error at broken.js:"));
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_disabled_family_reports_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.py");
        std::fs::write(&file, "print('x')\n").unwrap();

        let config = Config::from_yaml("python:\n  enabled: false\n").unwrap();
        let detector = Detector::new(temp.path(), Arc::new(config)).unwrap();
        let result = detector.analyze(&file);
        assert!(result.violations.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_suppressed_call_dropped() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.js");
        std::fs::write(
            &file,
            "// eslint-disable-next-line no-console\nconsole.log('a');\nconsole.warn('b');\n",
        )
        .unwrap();

        let result = detector(&temp).analyze(&file);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].line, 3);
        assert_eq!(result.violations[0].level, LogLevel::Warn);
    }

    #[test]
    fn test_logger_facts_reported() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("service.ts");
        std::fs::write(
            &file,
            "import pino from 'pino';\nconst appLog = pino();\nconsole.error('x');\n",
        )
        .unwrap();

        let result = detector(&temp).analyze(&file);
        assert!(result.has_logger_import);
        assert!(result.has_logger_instance);
        assert_eq!(result.logger_names, vec!["appLog"]);
        assert_eq!(result.violations.len(), 1);
    }
}
