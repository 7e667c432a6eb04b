//! Logsweep - structured logging enforcement.
//!
//! Logsweep finds ad-hoc logging calls (`print(...)`, `console.log(...)`,
//! `sys.stderr.write(...)`) in JavaScript, TypeScript and Python sources and
//! can rewrite them to a structured logger, adding the logger import and
//! instance when the file has none.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis:
//!
//! - `analysis`: Language analyzers that extract call sites and logger facts
//! - `detect`: Exclusion policy, suppression markers and the per-file detector
//! - `fix`: Edit planning, regeneration and verified atomic writes
//! - `cache`: Fingerprinted on-disk cache of analysis results
//! - `interpreter`: Optional external syntax check
//! - `enforce`: Batch orchestration over a project
//! - `config`: YAML configuration schema and defaults
//!
//! # Example
//!
//! ```no_run
//! use logsweep::{Config, EnforceOptions, Enforcer, Target};
//!
//! # async fn run() -> Result<(), logsweep::EnforceError> {
//! let enforcer = Enforcer::new(".", Config::discover(".")?)?;
//! let outcome = enforcer
//!     .enforce(Target::Patterns(vec![]), EnforceOptions::default())
//!     .await?;
//! println!("{} violations", outcome.stats.total_violations);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod detect;
pub mod enforce;
pub mod error;
pub mod fix;
pub mod interpreter;
mod fs_util;

pub use analysis::{FileFacts, Grammar, LanguageAnalyzer, LanguageFamily};
pub use cache::{AnalysisCache, CacheEntry};
pub use config::{Config, ConfigFingerprint, LanguageConfig, LoggerBackend};
pub use detect::{Classification, Detector, ExclusionClassifier, FileAnalysisResult, Violation};
pub use enforce::{AbortSignal, EnforceOptions, EnforceOutcome, EnforceStats, Enforcer, Target};
pub use error::{ConfigError, EnforceError, InterpreterError};
pub use fix::{FixOptions, FixResult, Fixer};
pub use interpreter::check_syntax;
