//! Error types shared across the engine.
//!
//! Only [`ConfigError`] aborts a run. Every other failure is captured on the
//! per-file result (see `FileErrorKind` and `FixErrorKind`) so that one bad
//! file never stops a batch.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration could not be loaded or failed validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid glob {pattern:?} in {field}: {source}")]
    Glob {
        field: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of an external syntax-check subprocess.
#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("i/o error talking to {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level failures returned by the orchestrator.
#[derive(Error, Debug)]
pub enum EnforceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("enumerating files under {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
