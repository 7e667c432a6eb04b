//! Enumeration of candidate source files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use walkdir::WalkDir;

use crate::analysis::Grammar;
use crate::config::{build_glob_set, Config};
use crate::detect::relative_path;
use crate::error::{ConfigError, EnforceError};

/// Directories never descended into.
pub const DENIED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "dist",
    "build",
    "coverage",
    ".next",
    "out",
    "target",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
];

/// Include/exclude matcher for one project root.
pub struct FileSelector {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    cache_dir: PathBuf,
}

impl FileSelector {
    /// `patterns` replaces the configured include globs when non-empty.
    pub fn new(root: &Path, config: &Config, patterns: &[String]) -> Result<Self, ConfigError> {
        let include = if patterns.is_empty() {
            build_glob_set(&config.include, "include")?
        } else {
            build_glob_set(patterns, "patterns")?
        };
        Ok(Self {
            root: root.to_path_buf(),
            include,
            exclude: build_glob_set(&config.exclude, "exclude")?,
            cache_dir: root.join(&config.cache.directory),
        })
    }

    fn is_denied_dir(&self, path: &Path, name: &str) -> bool {
        DENIED_DIRS.contains(&name) || path == self.cache_dir
    }

    fn is_selected(&self, path: &Path) -> bool {
        if Grammar::from_path(path).is_none() {
            return false;
        }
        let relative = relative_path(&self.root, path);
        self.include.is_match(&relative) && !self.exclude.is_match(&relative)
    }

    /// Walk the root and return matching files, sorted.
    pub fn collect(&self) -> Result<Vec<PathBuf>, EnforceError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !self.is_denied_dir(e.path(), &name)
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(EnforceError::Walk {
                        root: self.root.clone(),
                        source,
                    })
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_selected(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Resolve explicit paths against `root`, dropping duplicates.
pub fn resolve_explicit(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    let unique: BTreeSet<PathBuf> = paths
        .iter()
        .map(|p| if p.is_absolute() { p.clone() } else { root.join(p) })
        .collect();
    unique.into_iter().collect()
}
