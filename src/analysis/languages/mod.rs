//! Language-specific analyzer implementations and extension dispatch.

mod javascript;
mod python;

pub use javascript::JavaScriptAnalyzer;
pub use python::PythonAnalyzer;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::LanguageAnalyzer;

/// Group of languages sharing detection rules, fixer templates and config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFamily {
    JavaScript,
    Python,
}

impl LanguageFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageFamily::JavaScript => "javascript",
            LanguageFamily::Python => "python",
        }
    }

    pub fn all() -> [LanguageFamily; 2] {
        [LanguageFamily::JavaScript, LanguageFamily::Python]
    }
}

impl std::fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concrete tree-sitter grammar used for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
    Python,
}

impl Grammar {
    /// Extension lookup table. Anything not listed is unsupported.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            "ts" | "mts" | "cts" => Some(Grammar::TypeScript),
            "tsx" => Some(Grammar::Tsx),
            "py" => Some(Grammar::Python),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn family(&self) -> LanguageFamily {
        match self {
            Grammar::JavaScript | Grammar::TypeScript | Grammar::Tsx => LanguageFamily::JavaScript,
            Grammar::Python => LanguageFamily::Python,
        }
    }
}

/// Verbs that make a logger-like name a factory (`getLogger`, `create_logger`).
const FACTORY_PREFIXES: &[&str] = &["get", "create", "make", "build", "new", "setup", "init"];

/// Whether a binding name reads like a logger instance: `log`, `logger`, or a
/// lower-case name ending in `Logger`, `Log`, `_logger` or `_log`.
///
/// Capitalised names (`Logger`) are classes and factory-shaped names
/// (`getLogger`, `get_logger`) are functions, not instances.
pub(crate) fn looks_like_logger_name(name: &str) -> bool {
    let bare = name.trim_start_matches('_');
    let Some(first) = bare.chars().next() else {
        return false;
    };
    if !first.is_lowercase() || is_factory_name(bare) {
        return false;
    }
    bare == "log"
        || bare == "logger"
        || name.ends_with("Logger")
        || name.ends_with("Log")
        || name.ends_with("_logger")
        || name.ends_with("_log")
}

fn is_factory_name(name: &str) -> bool {
    FACTORY_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .map(|c| c == '_' || c.is_uppercase())
            .unwrap_or(false)
    })
}

/// Static storage for the JavaScript/TypeScript analyzer.
static JAVASCRIPT_ANALYZER: OnceCell<JavaScriptAnalyzer> = OnceCell::new();

/// Static storage for the Python analyzer.
static PYTHON_ANALYZER: OnceCell<PythonAnalyzer> = OnceCell::new();

/// Get the analyzer for a language family.
///
/// Analyzers are stateless, so they are created lazily and shared.
pub fn analyzer_for(family: LanguageFamily) -> &'static dyn LanguageAnalyzer {
    match family {
        LanguageFamily::JavaScript => {
            JAVASCRIPT_ANALYZER.get_or_init(JavaScriptAnalyzer::new) as &'static dyn LanguageAnalyzer
        }
        LanguageFamily::Python => {
            PYTHON_ANALYZER.get_or_init(PythonAnalyzer::new) as &'static dyn LanguageAnalyzer
        }
    }
}

/// Every file extension with an analyzer.
pub fn registered_extensions() -> Vec<&'static str> {
    LanguageFamily::all()
        .iter()
        .flat_map(|f| analyzer_for(*f).file_extensions().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(Grammar::from_extension("tsx"), Some(Grammar::Tsx));
        assert_eq!(Grammar::from_extension("cjs"), Some(Grammar::JavaScript));
        assert_eq!(Grammar::from_extension("py"), Some(Grammar::Python));
        assert_eq!(Grammar::from_extension("rb"), None);
        assert_eq!(
            Grammar::from_extension("mts").map(|g| g.family()),
            Some(LanguageFamily::JavaScript)
        );
    }

    #[test]
    fn test_analyzers_cover_lookup_table() {
        for ext in registered_extensions() {
            let grammar = Grammar::from_extension(ext).expect("extension should dispatch");
            assert!(analyzer_for(grammar.family()).file_extensions().contains(&ext));
        }
        assert!(Grammar::from_extension("go").is_none());
    }

    #[test]
    fn test_logger_like_names() {
        assert!(looks_like_logger_name("logger"));
        assert!(looks_like_logger_name("log"));
        assert!(looks_like_logger_name("appLog"));
        assert!(looks_like_logger_name("authServiceLogger"));
        assert!(looks_like_logger_name("_logger"));
        assert!(looks_like_logger_name("request_log"));
        assert!(!looks_like_logger_name("Logger"));
        assert!(!looks_like_logger_name("catalog"));
        assert!(!looks_like_logger_name("dialog"));
    }

    #[test]
    fn test_factory_names_are_not_loggers() {
        assert!(!looks_like_logger_name("getLogger"));
        assert!(!looks_like_logger_name("get_logger"));
        assert!(!looks_like_logger_name("createLogger"));
        assert!(!looks_like_logger_name("make_logger"));
        assert!(looks_like_logger_name("builderLog"));
        assert!(looks_like_logger_name("newsletter_log"));
    }
}
