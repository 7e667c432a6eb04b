//! Glob-based exemption of test files and CLI entry points.

use std::path::{Path, PathBuf};

use globset::GlobSet;

use super::{Classification, ExclusionReason};
use crate::analysis::{Grammar, LanguageFamily};
use crate::config::{build_glob_set, Config};
use crate::error::ConfigError;

struct FamilyPatterns {
    test: GlobSet,
    cli: GlobSet,
}

impl FamilyPatterns {
    fn new(config: &Config, family: LanguageFamily) -> Result<Self, ConfigError> {
        let lang = config.language(family);
        Ok(Self {
            test: build_glob_set(&lang.test_patterns, &format!("{}.test_patterns", family))?,
            cli: build_glob_set(&lang.cli_patterns, &format!("{}.cli_patterns", family))?,
        })
    }
}

/// Decides whether a file is exempt from enforcement.
///
/// Classification depends only on the path and the configured patterns; the
/// file is never opened.
pub struct ExclusionClassifier {
    root: PathBuf,
    javascript: FamilyPatterns,
    python: FamilyPatterns,
}

impl ExclusionClassifier {
    pub fn new<P: AsRef<Path>>(root: P, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            javascript: FamilyPatterns::new(config, LanguageFamily::JavaScript)?,
            python: FamilyPatterns::new(config, LanguageFamily::Python)?,
        })
    }

    /// Test patterns win over CLI patterns. Files without a supported
    /// extension are never excluded here.
    pub fn classify(&self, path: &Path) -> Classification {
        let Some(grammar) = Grammar::from_path(path) else {
            return Classification::included();
        };
        let patterns = match grammar.family() {
            LanguageFamily::JavaScript => &self.javascript,
            LanguageFamily::Python => &self.python,
        };

        let relative = relative_path(&self.root, path);
        if patterns.test.is_match(&relative) {
            Classification::excluded(ExclusionReason::TestFile)
        } else if patterns.cli.is_match(&relative) {
            Classification::excluded(ExclusionReason::CliFile)
        } else {
            Classification::included()
        }
    }
}

/// Project-relative path with `/` separators. Paths outside `root` are kept
/// as given.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let text = relative.to_string_lossy().replace('\\', "/");
    text.trim_start_matches("./").to_string()
}
