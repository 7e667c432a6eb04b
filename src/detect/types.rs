//! Core types for detection results.

use serde::{Deserialize, Serialize};

use crate::analysis::{CallKind, CallSite, LanguageFamily, LogLevel};
pub use crate::config::Severity;

/// A single ad-hoc logging call that should go through a structured logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub file_path: String,
    /// 1-based line of the call.
    pub line: usize,
    /// 1-based column of the call.
    pub column: usize,
    pub kind: CallKind,
    /// Call variant, e.g. `warn` for `console.warn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub level: LogLevel,
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub(crate) fn from_call(file_path: &str, call: &CallSite, severity: Severity) -> Self {
        Self {
            file_path: file_path.to_string(),
            line: call.call.start_line,
            column: call.call.start_col,
            kind: call.kind,
            method: call.method.clone(),
            level: call.level,
            severity,
            message: format!(
                "unstructured {} call `{}`; use a structured logger at level {}",
                call.kind, call.callee_text, call.level
            ),
        }
    }
}

/// Why a file is exempt from enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    TestFile,
    CliFile,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::TestFile => write!(f, "test_file"),
            ExclusionReason::CliFile => write!(f, "cli_file"),
        }
    }
}

/// Outcome of the exclusion policy for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ExclusionReason>,
}

impl Classification {
    pub fn included() -> Self {
        Self {
            excluded: false,
            reason: None,
        }
    }

    pub fn excluded(reason: ExclusionReason) -> Self {
        Self {
            excluded: true,
            reason: Some(reason),
        }
    }
}

/// Category of a per-file analysis failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    Parse,
    UnsupportedLanguage,
    Io,
    ExternalInterpreter,
}

/// Everything the detector reports about one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysisResult {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageFamily>,
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_reason: Option<ExclusionReason>,
    pub violations: Vec<Violation>,
    pub has_logger_import: bool,
    pub has_logger_instance: bool,
    pub logger_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FileErrorKind>,
}

impl FileAnalysisResult {
    /// A clean result with nothing found.
    pub fn new(file_path: impl Into<String>, language: Option<LanguageFamily>) -> Self {
        Self {
            file_path: file_path.into(),
            language,
            excluded: false,
            exclusion_reason: None,
            violations: Vec::new(),
            has_logger_import: false,
            has_logger_instance: false,
            logger_names: Vec::new(),
            error: None,
            error_kind: None,
        }
    }

    pub fn excluded(
        file_path: impl Into<String>,
        language: Option<LanguageFamily>,
        reason: ExclusionReason,
    ) -> Self {
        Self {
            excluded: true,
            exclusion_reason: Some(reason),
            ..Self::new(file_path, language)
        }
    }

    pub fn failed(
        file_path: impl Into<String>,
        language: Option<LanguageFamily>,
        kind: FileErrorKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            error_kind: Some(kind),
            ..Self::new(file_path, language)
        }
    }

    /// Replace violations with an error, keeping logger facts.
    pub(crate) fn fail(&mut self, kind: FileErrorKind, error: impl Into<String>) {
        self.violations.clear();
        self.error = Some(error.into());
        self.error_kind = Some(kind);
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
