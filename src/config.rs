//! Configuration schema for logsweep.
//!
//! The project file (`logsweep.yaml`) is parsed into a strict raw schema in
//! which every field is optional and unknown keys are rejected. The raw
//! document is then merged over the built-in defaults for each language
//! family and validated once, before any file is touched.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{registered_extensions, LanguageFamily};
use crate::error::ConfigError;

/// Config file names searched for in the project root, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["logsweep.yaml", ".logsweep.yaml", "logsweep.yml"];

/// Default number of files processed concurrently per batch.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default cache entry lifetime.
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

/// Default external syntax check timeout.
pub const DEFAULT_SYNTAX_CHECK_TIMEOUT_MS: u64 = 10_000;

lazy_static::lazy_static! {
    static ref JS_IDENTIFIER: regex::Regex = regex::Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    static ref PY_IDENTIFIER: regex::Regex = regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref JS_IDENTIFIER_TAIL: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9_$]*$").unwrap();
    static ref PY_IDENTIFIER_TAIL: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9_]*$").unwrap();
}

/// Reserved words and strict-mode/module-only keywords.
static JS_RESERVED: phf::Set<&'static str> = phf::phf_set! {
    "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "export", "extends", "false",
    "finally", "for", "function", "if", "implements", "import", "in",
    "instanceof", "interface", "let", "new", "null", "package", "private",
    "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
    "arguments", "eval",
};

static PY_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "False", "None", "True", "and", "as", "assert", "async", "await", "break",
    "class", "continue", "def", "del", "elif", "else", "except", "finally",
    "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
    "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
};

/// Whether `name` can be bound as a variable in sources of `family`.
pub(crate) fn is_identifier(name: &str, family: LanguageFamily) -> bool {
    match family {
        LanguageFamily::JavaScript => JS_IDENTIFIER.is_match(name) && !JS_RESERVED.contains(name),
        LanguageFamily::Python => PY_IDENTIFIER.is_match(name) && !PY_KEYWORDS.contains(name),
    }
}

fn is_identifier_tail(suffix: &str, family: LanguageFamily) -> bool {
    match family {
        LanguageFamily::JavaScript => JS_IDENTIFIER_TAIL.is_match(suffix),
        LanguageFamily::Python => PY_IDENTIFIER_TAIL.is_match(suffix),
    }
}

/// Severity reported for violations of a language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Structured logger library inserted by the fixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggerBackend {
    Pino,
    Winston,
    Logging,
    Structlog,
}

impl LoggerBackend {
    /// The language family this backend can be used with.
    pub fn family(&self) -> LanguageFamily {
        match self {
            LoggerBackend::Pino | LoggerBackend::Winston => LanguageFamily::JavaScript,
            LoggerBackend::Logging | LoggerBackend::Structlog => LanguageFamily::Python,
        }
    }

    /// Module name the backend is imported from.
    pub fn module(&self) -> &'static str {
        match self {
            LoggerBackend::Pino => "pino",
            LoggerBackend::Winston => "winston",
            LoggerBackend::Logging => "logging",
            LoggerBackend::Structlog => "structlog",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.module()
    }
}

/// How the fixer names a logger variable it has to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// Always use `logger_name`.
    Fixed,
    /// Derive the name from the file's project-relative path.
    Module,
}

/// External interpreter used to double-check syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntaxCheckConfig {
    /// Program to run; the source is written to its stdin.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_syntax_check_timeout")]
    pub timeout_ms: u64,
    /// Also check unmodified sources during analysis, not just fixer output.
    #[serde(default)]
    pub on_analyze: bool,
}

fn default_syntax_check_timeout() -> u64 {
    DEFAULT_SYNTAX_CHECK_TIMEOUT_MS
}

/// Settings for one language family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageConfig {
    pub enabled: bool,
    pub severity: Severity,
    pub auto_fix: bool,
    pub test_patterns: Vec<String>,
    pub cli_patterns: Vec<String>,
    pub logger_backend: LoggerBackend,
    pub logger_name: String,
    pub naming: NamingStrategy,
    pub strip_segments: Vec<String>,
    pub logger_suffix: String,
    pub disable_next_line_markers: Vec<String>,
    pub syntax_check: Option<SyntaxCheckConfig>,
}

impl LanguageConfig {
    /// Built-in defaults for the JavaScript/TypeScript family.
    pub fn javascript_defaults() -> Self {
        Self {
            enabled: true,
            severity: Severity::Error,
            auto_fix: true,
            test_patterns: strings(&[
                "**/*.test.*",
                "**/*.spec.*",
                "**/__tests__/**",
                "**/test/**",
                "**/tests/**",
                "**/__mocks__/**",
            ]),
            cli_patterns: strings(&["**/cli.*", "**/cli/**", "**/bin/**", "**/scripts/**"]),
            logger_backend: LoggerBackend::Pino,
            logger_name: "logger".to_string(),
            naming: NamingStrategy::Fixed,
            strip_segments: default_strip_segments(),
            logger_suffix: "Logger".to_string(),
            disable_next_line_markers: strings(&[
                "eslint-disable-next-line",
                "logsweep-disable-next-line",
            ]),
            syntax_check: None,
        }
    }

    /// Built-in defaults for the Python family.
    pub fn python_defaults() -> Self {
        Self {
            enabled: true,
            severity: Severity::Error,
            auto_fix: true,
            test_patterns: strings(&[
                "**/test_*.py",
                "**/*_test.py",
                "**/tests/**",
                "**/conftest.py",
            ]),
            cli_patterns: strings(&["**/cli.py", "**/__main__.py", "**/cli/**", "**/scripts/**"]),
            logger_backend: LoggerBackend::Logging,
            logger_name: "logger".to_string(),
            naming: NamingStrategy::Fixed,
            strip_segments: default_strip_segments(),
            logger_suffix: "Logger".to_string(),
            disable_next_line_markers: strings(&["logsweep: disable-next-line", "noqa: T201"]),
            syntax_check: None,
        }
    }

    fn merge(mut self, raw: RawLanguageConfig) -> Self {
        if let Some(v) = raw.enabled {
            self.enabled = v;
        }
        if let Some(v) = raw.severity {
            self.severity = v;
        }
        if let Some(v) = raw.auto_fix {
            self.auto_fix = v;
        }
        if let Some(v) = raw.test_patterns {
            self.test_patterns = v;
        }
        if let Some(v) = raw.cli_patterns {
            self.cli_patterns = v;
        }
        if let Some(v) = raw.logger_backend {
            self.logger_backend = v;
        }
        if let Some(v) = raw.logger_name {
            self.logger_name = v;
        }
        if let Some(v) = raw.naming {
            self.naming = v;
        }
        if let Some(v) = raw.strip_segments {
            self.strip_segments = v;
        }
        if let Some(v) = raw.logger_suffix {
            self.logger_suffix = v;
        }
        if let Some(v) = raw.disable_next_line_markers {
            self.disable_next_line_markers = v;
        }
        if raw.syntax_check.is_some() {
            self.syntax_check = raw.syntax_check;
        }
        self
    }

    fn validate(&self, family: LanguageFamily) -> Result<(), ConfigError> {
        let section = family.as_str();

        for (field, patterns) in [
            ("test_patterns", &self.test_patterns),
            ("cli_patterns", &self.cli_patterns),
        ] {
            for pattern in patterns {
                compile_glob(pattern, &format!("{}.{}", section, field))?;
            }
        }

        if self.logger_backend.family() != family {
            return Err(ConfigError::invalid(
                format!("{}.logger_backend", section),
                format!(
                    "backend {:?} cannot be used for {} sources",
                    self.logger_backend.as_str(),
                    section
                ),
            ));
        }

        if !is_identifier(&self.logger_name, family) {
            return Err(ConfigError::invalid(
                format!("{}.logger_name", section),
                format!("{:?} is not a valid {} identifier", self.logger_name, section),
            ));
        }

        if !is_identifier_tail(&self.logger_suffix, family) {
            return Err(ConfigError::invalid(
                format!("{}.logger_suffix", section),
                format!("{:?} must only contain identifier characters", self.logger_suffix),
            ));
        }

        if self.disable_next_line_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::invalid(
                format!("{}.disable_next_line_markers", section),
                "markers must not be empty",
            ));
        }

        if let Some(check) = &self.syntax_check {
            if check.command.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("{}.syntax_check.command", section),
                    "command must not be empty",
                ));
            }
            if check.timeout_ms == 0 {
                return Err(ConfigError::invalid(
                    format!("{}.syntax_check.timeout_ms", section),
                    "timeout must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}

/// Location and lifetime of the analysis cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Relative paths are resolved against the project root.
    pub directory: PathBuf,
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from(".logsweep-cache"),
            ttl_hours: DEFAULT_CACHE_TTL_HOURS,
        }
    }
}

/// Fully merged and validated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Globs (relative to the project root) selecting files to enforce.
    pub include: Vec<String>,
    /// Additional globs to skip on top of the built-in directory deny-list.
    pub exclude: Vec<String>,
    pub concurrency: usize,
    pub cache: CacheConfig,
    pub javascript: LanguageConfig,
    pub python: LanguageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: vec![format!("**/*.{{{}}}", registered_extensions().join(","))],
            exclude: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            cache: CacheConfig::default(),
            javascript: LanguageConfig::javascript_defaults(),
            python: LanguageConfig::python_defaults(),
        }
    }
}

impl Config {
    /// Load, merge and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Look for a config file in `root`; fall back to defaults if none exists.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self, ConfigError> {
        for name in DEFAULT_CONFIG_NAMES {
            let candidate = root.as_ref().join(name);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Self::load(candidate);
            }
        }
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document and merge it over the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?
        };

        let config = Self::default().merge(raw);
        config.validate()?;
        Ok(config)
    }

    fn merge(mut self, raw: RawConfig) -> Self {
        if let Some(v) = raw.include {
            self.include = v;
        }
        if let Some(v) = raw.exclude {
            self.exclude = v;
        }
        if let Some(v) = raw.concurrency {
            self.concurrency = v;
        }
        if let Some(cache) = raw.cache {
            if let Some(v) = cache.enabled {
                self.cache.enabled = v;
            }
            if let Some(v) = cache.directory {
                self.cache.directory = v;
            }
            if let Some(v) = cache.ttl_hours {
                self.cache.ttl_hours = v;
            }
        }
        if let Some(js) = raw.javascript {
            self.javascript = self.javascript.merge(js);
        }
        if let Some(py) = raw.python {
            self.python = self.python.merge(py);
        }
        self
    }

    /// Check types and values the schema alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid(
                "concurrency",
                "must be at least 1",
            ));
        }
        if self.cache.ttl_hours == 0 {
            return Err(ConfigError::invalid("cache.ttl_hours", "must be at least 1"));
        }
        for pattern in &self.include {
            compile_glob(pattern, "include")?;
        }
        for pattern in &self.exclude {
            compile_glob(pattern, "exclude")?;
        }
        self.javascript.validate(LanguageFamily::JavaScript)?;
        self.python.validate(LanguageFamily::Python)?;
        Ok(())
    }

    /// Settings for a language family.
    pub fn language(&self, family: LanguageFamily) -> &LanguageConfig {
        match family {
            LanguageFamily::JavaScript => &self.javascript,
            LanguageFamily::Python => &self.python,
        }
    }

    /// Stable digest of the whole configuration, used in cache keys.
    pub fn fingerprint(&self) -> ConfigFingerprint {
        // Field order is fixed by the struct definitions, so the JSON form is canonical.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        ConfigFingerprint(format!("{:x}", hasher.finalize()))
    }
}

/// Digest identifying one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigFingerprint(String);

impl ConfigFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compile a glob the way every matcher in the crate does: `*` and `?`
/// never cross a `/`, `**` spans directories.
pub(crate) fn compile_glob(pattern: &str, field: &str) -> Result<globset::Glob, ConfigError> {
    globset::GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| ConfigError::Glob {
            field: field.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

/// Build a glob set from already validated patterns.
pub(crate) fn build_glob_set(patterns: &[String], field: &str) -> Result<globset::GlobSet, ConfigError> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern, field)?);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        field: field.to_string(),
        pattern: patterns.join(", "),
        source,
    })
}

fn default_strip_segments() -> Vec<String> {
    strings(&["src", "lib", "libs", "utils", "helpers", "common", "shared"])
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    concurrency: Option<usize>,
    cache: Option<RawCacheConfig>,
    javascript: Option<RawLanguageConfig>,
    python: Option<RawLanguageConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCacheConfig {
    enabled: Option<bool>,
    directory: Option<PathBuf>,
    ttl_hours: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLanguageConfig {
    enabled: Option<bool>,
    severity: Option<Severity>,
    auto_fix: Option<bool>,
    test_patterns: Option<Vec<String>>,
    cli_patterns: Option<Vec<String>>,
    logger_backend: Option<LoggerBackend>,
    logger_name: Option<String>,
    naming: Option<NamingStrategy>,
    strip_segments: Option<Vec<String>>,
    logger_suffix: Option<String>,
    disable_next_line_markers: Option<Vec<String>>,
    syntax_check: Option<SyntaxCheckConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.cache.ttl_hours, 24);

        let include = globset::Glob::new(&config.include[0]).unwrap().compile_matcher();
        for ext in registered_extensions() {
            assert!(include.is_match(format!("src/app.{}", ext)), "{}", ext);
        }
        assert!(!include.is_match("src/app.rb"));
    }

    #[test]
    fn test_partial_section_merges_over_family_defaults() {
        let yaml = r#"
python:
  logger_backend: structlog
  auto_fix: false
javascript:
  naming: module
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.python.logger_backend, LoggerBackend::Structlog);
        assert!(!config.python.auto_fix);
        // untouched fields keep the python defaults
        assert!(config.python.test_patterns.contains(&"**/test_*.py".to_string()));
        assert_eq!(config.javascript.naming, NamingStrategy::Module);
        assert_eq!(config.javascript.logger_backend, LoggerBackend::Pino);
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let err = Config::from_yaml("verbose: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_nested_key_rejected() {
        let err = Config::from_yaml("javascript:\n  enabeld: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_wrong_enum_value_rejected() {
        let err = Config::from_yaml("python:\n  naming: clever\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_backend_family_mismatch_rejected() {
        let err = Config::from_yaml("python:\n  logger_backend: pino\n").unwrap_err();
        assert!(err.to_string().contains("python.logger_backend"));
    }

    #[test]
    fn test_invalid_logger_name_rejected() {
        let err = Config::from_yaml("javascript:\n  logger_name: \"my-logger\"\n").unwrap_err();
        assert!(err.to_string().contains("logger_name"));
    }

    #[test]
    fn test_logger_name_checked_per_family() {
        for yaml in [
            "python:\n  logger_name: \"$log\"\n",
            "python:\n  logger_name: class\n",
            "python:\n  logger_name: lambda\n",
            "python:\n  logger_suffix: \"$\"\n",
            "javascript:\n  logger_name: class\n",
            "javascript:\n  logger_name: \"yield\"\n",
        ] {
            let err = Config::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{}: {}", yaml, err);
        }

        let config = Config::from_yaml("javascript:\n  logger_name: $log\npython:\n  logger_name: _log\n").unwrap();
        assert_eq!(config.javascript.logger_name, "$log");
        assert_eq!(config.python.logger_name, "_log");

        assert!(is_identifier("print", LanguageFamily::Python));
        assert!(is_identifier("def_", LanguageFamily::Python));
        assert!(!is_identifier("None", LanguageFamily::Python));
        assert!(!is_identifier("new", LanguageFamily::JavaScript));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(Config::from_yaml("concurrency: 0\n").is_err());
    }

    #[test]
    fn test_bad_glob_rejected() {
        let err = Config::from_yaml("exclude: [\"src/[abc\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Glob { .. }));
    }

    #[test]
    fn test_syntax_check_defaults() {
        let yaml = r#"
python:
  syntax_check:
    command: python3
    args: ["-c", "import ast, sys; ast.parse(sys.stdin.read())"]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let check = config.python.syntax_check.unwrap();
        assert_eq!(check.timeout_ms, DEFAULT_SYNTAX_CHECK_TIMEOUT_MS);
        assert!(!check.on_analyze);
    }

    #[test]
    fn test_fingerprint_changes_with_config() {
        let a = Config::default();
        let mut b = Config::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.javascript.logger_name = "log".to_string();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_pinned_default_heuristics() {
        let config = Config::default();
        assert_eq!(
            config.javascript.strip_segments,
            vec!["src", "lib", "libs", "utils", "helpers", "common", "shared"]
        );
        assert_eq!(
            config.javascript.disable_next_line_markers,
            vec!["eslint-disable-next-line", "logsweep-disable-next-line"]
        );
        assert_eq!(
            config.python.disable_next_line_markers,
            vec!["logsweep: disable-next-line", "noqa: T201"]
        );
    }
}
