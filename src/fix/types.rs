//! Types produced by the fixer.

use serde::{Deserialize, Serialize};

/// What a single edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    CallRewrite,
    ImportAdded,
    LoggerInstanceAdded,
}

/// One change applied to a file. Positions refer to the fixed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixChange {
    pub line: usize,
    pub column: usize,
    pub old: String,
    pub new: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
}

/// Category of a fix failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixErrorKind {
    Parse,
    Regeneration,
    UnsupportedLanguage,
    Io,
    ExternalInterpreter,
}

/// Outcome of fixing one file.
///
/// `success` implies `fixed_content` parses cleanly. On failure the file on
/// disk is untouched and `fixed_content` equals `original_content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    pub file_path: String,
    pub success: bool,
    pub changes: Vec<FixChange>,
    pub original_content: String,
    pub fixed_content: String,
    /// The fixed content was written to disk.
    pub written: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FixErrorKind>,
}

impl FixResult {
    /// Nothing to do for this file.
    pub fn unchanged(file_path: impl Into<String>, content: String) -> Self {
        Self {
            file_path: file_path.into(),
            success: true,
            changes: Vec::new(),
            original_content: content.clone(),
            fixed_content: content,
            written: false,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(
        file_path: impl Into<String>,
        content: String,
        kind: FixErrorKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_kind: Some(kind),
            ..Self::unchanged(file_path, content)
        }
    }

    /// Revert to the original content and record an error.
    pub(crate) fn fail(&mut self, kind: FixErrorKind, error: impl Into<String>) {
        self.success = false;
        self.changes.clear();
        self.fixed_content = self.original_content.clone();
        self.written = false;
        self.error = Some(error.into());
        self.error_kind = Some(kind);
    }

    /// Number of call sites rewritten.
    pub fn calls_rewritten(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.change_type == ChangeType::CallRewrite)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Options for a fix run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixOptions {
    /// Compute changes without writing the file.
    pub dry_run: bool,
}
