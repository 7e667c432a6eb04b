//! Batch orchestration: enumerate, classify, consult the cache, detect and
//! optionally fix, then aggregate.
//!
//! Files are processed in batches of `concurrency`. Within a batch every file
//! runs as its own tokio task with CPU-bound work on the blocking pool;
//! batches run one after another. An [`AbortSignal`] is checked before each
//! batch, so in-flight files always finish.

mod files;

pub use files::{resolve_explicit, FileSelector, DENIED_DIRS};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use futures::future::join_all;
use serde::Serialize;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, info, warn};

use crate::cache::AnalysisCache;
use crate::config::{Config, ConfigFingerprint};
use crate::detect::{Detector, FileAnalysisResult, FileErrorKind, Violation};
use crate::error::EnforceError;
use crate::fix::{FixOptions, FixResult, Fixer};
use crate::interpreter::check_syntax;

/// Which files to enforce.
#[derive(Debug, Clone)]
pub enum Target {
    /// Globs relative to the root; empty means the configured `include`.
    Patterns(Vec<String>),
    /// Explicit paths, absolute or relative to the root.
    Files(Vec<PathBuf>),
}

/// Cooperative cancellation flag shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnforceOptions {
    /// Rewrite violations after detection.
    pub fix: bool,
    /// With `fix`, compute fixes without writing.
    pub dry_run: bool,
    pub abort: Option<AbortSignal>,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnforceStats {
    pub files_total: usize,
    pub files_analyzed: usize,
    pub files_excluded: usize,
    pub files_with_violations: usize,
    pub files_errored: usize,
    pub files_fixed: usize,
    pub total_violations: usize,
    pub violations_fixed: usize,
    pub cache_hits: usize,
    pub elapsed_ms: u64,
    pub aborted: bool,
}

/// Everything a run produced, sorted by path.
#[derive(Debug, Clone, Serialize)]
pub struct EnforceOutcome {
    /// No violations remain. Per-file errors do not affect this.
    pub success: bool,
    pub results: Vec<FileAnalysisResult>,
    pub violations: Vec<Violation>,
    pub fixes: Vec<FixResult>,
    pub stats: EnforceStats,
}

/// Per-file output of a worker task.
struct FileOutcome {
    analysis: FileAnalysisResult,
    cache_hit: bool,
    fix: Option<FixResult>,
}

/// Shared handles cloned into every task.
#[derive(Clone)]
struct Worker {
    config: Arc<Config>,
    fingerprint: ConfigFingerprint,
    detector: Arc<Detector>,
    fixer: Arc<Fixer>,
    cache: Option<Arc<AnalysisCache>>,
}

impl Worker {
    async fn process(self, path: PathBuf, fix: Option<FixOptions>) -> Result<FileOutcome, JoinError> {
        let (mut analysis, cache_hit, mtime) = {
            let worker = self.clone();
            let path = path.clone();
            spawn_blocking(move || worker.analyze_cached(&path)).await?
        };

        if !cache_hit {
            self.check_on_analyze(&path, &mut analysis).await;
            if let (Some(cache), Some(mtime)) = (self.cache.clone(), mtime) {
                if !analysis.has_error() {
                    let fingerprint = self.fingerprint.clone();
                    let stored = analysis.clone();
                    spawn_blocking(move || cache.set(&stored.file_path, mtime, &fingerprint, &stored))
                        .await?;
                }
            }
        }

        let fix = match fix {
            Some(options)
                if !analysis.excluded && !analysis.has_error() && !analysis.violations.is_empty() =>
            {
                let fixer = self.fixer.clone();
                let target = path.clone();
                let plan = spawn_blocking(move || fixer.plan(&target)).await?;
                Some(self.fixer.apply(plan, options).await)
            }
            _ => None,
        };

        Ok(FileOutcome {
            analysis,
            cache_hit,
            fix,
        })
    }

    fn analyze_cached(&self, path: &Path) -> (FileAnalysisResult, bool, Option<SystemTime>) {
        let file_path = self.detector.display_path(path);
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();

        if let (Some(cache), Some(mtime)) = (&self.cache, mtime) {
            if let Some(entry) = cache.get(&file_path, mtime, &self.fingerprint) {
                debug!(file = %file_path, "cache hit");
                return (entry.payload, true, Some(mtime));
            }
        }
        (self.detector.analyze(path), false, mtime)
    }

    /// Run the family's interpreter over an unmodified, cleanly parsed file.
    async fn check_on_analyze(&self, path: &Path, analysis: &mut FileAnalysisResult) {
        if analysis.excluded || analysis.has_error() {
            return;
        }
        let Some(family) = analysis.language else {
            return;
        };
        let Some(check) = self.config.language(family).syntax_check.as_ref() else {
            return;
        };
        if !check.on_analyze {
            return;
        }

        let source = match tokio::fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) => {
                analysis.fail(FileErrorKind::Io, format!("reading {}: {}", path.display(), e));
                return;
            }
        };
        if let Err(e) = check_syntax(check, &source).await {
            warn!(file = %analysis.file_path, error = %e, "interpreter rejected source");
            analysis.fail(FileErrorKind::ExternalInterpreter, e.to_string());
        }
    }
}

/// Runs detection (and optionally fixing) over a project.
pub struct Enforcer {
    root: PathBuf,
    config: Arc<Config>,
    worker: Worker,
}

impl Enforcer {
    /// Validate `config` and open the cache under `root`.
    pub fn new<P: AsRef<Path>>(root: P, config: Config) -> Result<Self, EnforceError> {
        config.validate()?;
        let root = root.as_ref().to_path_buf();
        let config = Arc::new(config);

        let detector = Arc::new(Detector::new(&root, config.clone())?);
        let fixer = Arc::new(Fixer::with_detector(detector.clone()));
        let cache = config.cache.enabled.then(|| {
            Arc::new(AnalysisCache::open(
                root.join(&config.cache.directory),
                config.cache.ttl_hours,
            ))
        });

        Ok(Self {
            worker: Worker {
                config: config.clone(),
                fingerprint: config.fingerprint(),
                detector,
                fixer,
                cache,
            },
            root,
            config,
        })
    }

    /// Load the config found in `root` (or the defaults).
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self, EnforceError> {
        let config = Config::discover(&root)?;
        Self::new(root, config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&AnalysisCache> {
        self.worker.cache.as_deref()
    }

    pub fn detector(&self) -> &Detector {
        &self.worker.detector
    }

    pub fn fixer(&self) -> &Fixer {
        &self.worker.fixer
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        if let Some(cache) = self.cache() {
            cache.clear();
        }
    }

    /// Enforce the logging policy over `target`.
    pub async fn enforce(
        &self,
        target: Target,
        options: EnforceOptions,
    ) -> Result<EnforceOutcome, EnforceError> {
        let started = Instant::now();
        let files = match &target {
            Target::Patterns(patterns) => {
                FileSelector::new(&self.root, &self.config, patterns)?.collect()?
            }
            Target::Files(paths) => resolve_explicit(&self.root, paths),
        };
        let fix = options.fix.then_some(FixOptions {
            dry_run: options.dry_run,
        });

        let mut stats = EnforceStats {
            files_total: files.len(),
            ..Default::default()
        };
        let mut results = Vec::with_capacity(files.len());
        let mut fixes = Vec::new();

        info!(
            root = %self.root.display(),
            files = files.len(),
            fix = options.fix,
            dry_run = options.dry_run,
            "starting enforcement"
        );

        for (batch_index, batch) in files.chunks(self.config.concurrency).enumerate() {
            if options.abort.as_ref().is_some_and(|a| a.is_aborted()) {
                warn!(processed = results.len(), "aborted");
                stats.aborted = true;
                break;
            }

            let tasks = batch.iter().cloned().map(|path| {
                let worker = self.worker.clone();
                tokio::spawn(worker.process(path, fix))
            });
            for joined in join_all(tasks).await {
                let outcome = joined??;
                record(&mut stats, &outcome);
                results.push(outcome.analysis);
                if let Some(fix) = outcome.fix {
                    fixes.push(fix);
                }
            }
            info!(batch = batch_index + 1, files = batch.len(), "batch complete");
        }

        results.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        fixes.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        let violations: Vec<Violation> = results
            .iter()
            .flat_map(|r| r.violations.iter().cloned())
            .collect();

        let remaining = stats.total_violations - stats.violations_fixed;
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            files = stats.files_total,
            violations = stats.total_violations,
            fixed = stats.violations_fixed,
            errored = stats.files_errored,
            cache_hits = stats.cache_hits,
            elapsed_ms = stats.elapsed_ms,
            "enforcement finished"
        );

        Ok(EnforceOutcome {
            success: remaining == 0,
            results,
            violations,
            fixes,
            stats,
        })
    }
}

fn record(stats: &mut EnforceStats, outcome: &FileOutcome) {
    let analysis = &outcome.analysis;
    if outcome.cache_hit {
        stats.cache_hits += 1;
    }
    if analysis.excluded {
        stats.files_excluded += 1;
    } else if analysis.has_error() {
        stats.files_errored += 1;
    } else {
        stats.files_analyzed += 1;
    }
    if !analysis.violations.is_empty() {
        stats.files_with_violations += 1;
        stats.total_violations += analysis.violations.len();
    }

    if let Some(fix) = &outcome.fix {
        if !fix.success {
            stats.files_errored += 1;
        } else if fix.written {
            stats.files_fixed += 1;
            // Every active violation in a written file was rewritten.
            stats.violations_fixed += analysis.violations.len().min(fix.calls_rewritten());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn enforcer(temp: &TempDir) -> Enforcer {
        Enforcer::new(temp.path(), Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_detect_only_run() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "console.log(1);\n").unwrap();
        fs::write(temp.path().join("b.py"), "x = 1\n").unwrap();
        fs::create_dir_all(temp.path().join("tests")).unwrap();
        fs::write(temp.path().join("tests/test_a.py"), "print(1)\n").unwrap();

        let outcome = enforcer(&temp)
            .enforce(Target::Patterns(vec![]), EnforceOptions::default())
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.stats.files_total, 3);
        assert_eq!(outcome.stats.files_excluded, 1);
        assert_eq!(outcome.stats.files_analyzed, 2);
        assert_eq!(outcome.stats.total_violations, 1);
        let paths: Vec<_> = outcome.results.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(paths, vec!["a.js", "b.py", "tests/test_a.py"]);
        assert!(outcome.fixes.is_empty());
    }

    #[tokio::test]
    async fn test_fix_run_succeeds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.py");
        fs::write(&path, "print('x')\n").unwrap();

        let outcome = enforcer(&temp)
            .enforce(
                Target::Files(vec![PathBuf::from("a.py")]),
                EnforceOptions {
                    fix: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.stats.files_fixed, 1);
        assert_eq!(outcome.stats.violations_fixed, 1);
        assert!(fs::read_to_string(&path).unwrap().contains("logger.info('x')"));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_count_as_fixed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.js");
        fs::write(&path, "console.log(1);\n").unwrap();

        let outcome = enforcer(&temp)
            .enforce(
                Target::Patterns(vec![]),
                EnforceOptions {
                    fix: true,
                    dry_run: true,
                    abort: None,
                },
            )
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.fixes.len(), 1);
        assert!(!outcome.fixes[0].written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "console.log(1);\n");
    }

    #[tokio::test]
    async fn test_errors_do_not_fail_run() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.js"), "function (\n").unwrap();

        let outcome = enforcer(&temp)
            .enforce(Target::Patterns(vec![]), EnforceOptions::default())
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.stats.files_errored, 1);
        assert_eq!(outcome.results[0].error_kind, Some(FileErrorKind::Parse));
    }

    #[tokio::test]
    async fn test_abort_before_first_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "console.log(1);\n").unwrap();
        let abort = AbortSignal::new();
        abort.abort();

        let outcome = enforcer(&temp)
            .enforce(
                Target::Patterns(vec![]),
                EnforceOptions {
                    abort: Some(abort),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(outcome.stats.aborted);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.stats.files_total, 1);
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "console.log(1);\n").unwrap();
        let enforcer = enforcer(&temp);

        let first = enforcer
            .enforce(Target::Patterns(vec![]), EnforceOptions::default())
            .await
            .unwrap();
        assert_eq!(first.stats.cache_hits, 0);

        let second = enforcer
            .enforce(Target::Patterns(vec![]), EnforceOptions::default())
            .await
            .unwrap();
        assert_eq!(second.stats.cache_hits, 1);
        assert_eq!(first.results, second.results);
    }

    #[tokio::test]
    async fn test_on_analyze_interpreter_failure() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "print(1)\n").unwrap();
        let config = Config::from_yaml(
            "cache:\n  enabled: false\npython:\n  syntax_check:\n    command: sh\n    args: ['-c', 'cat > /dev/null; exit 2']\n    on_analyze: true\n",
        )
        .unwrap();

        let outcome = Enforcer::new(temp.path(), config)
            .unwrap()
            .enforce(Target::Patterns(vec![]), EnforceOptions::default())
            .await
            .unwrap();
        let result = &outcome.results[0];
        assert_eq!(result.error_kind, Some(FileErrorKind::ExternalInterpreter));
        assert!(result.violations.is_empty());
        assert!(outcome.success);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            concurrency: 0,
            ..Config::default()
        };
        assert!(matches!(
            Enforcer::new(temp.path(), config),
            Err(EnforceError::Config(_))
        ));
    }
}
