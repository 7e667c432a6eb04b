//! Command-line interface for logsweep.
//!
//! The binary is a thin shell over [`Enforcer`]: flags become
//! [`EnforceOptions`], the outcome is printed as JSON and `success` becomes
//! the exit code.

use clap::{ArgAction, Parser};
use colored::*;
use std::io::Write;
use std::path::PathBuf;

use crate::config::Config;
use crate::enforce::{AbortSignal, EnforceOptions, EnforceOutcome, Enforcer, Target};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Find ad-hoc print/console logging and rewrite it to a structured logger.
///
/// Scans JavaScript, TypeScript and Python sources under the project root.
/// Test files and CLI entry points are exempt.
#[derive(Parser, Debug)]
#[command(name = "logsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Globs (relative to the root) selecting files; defaults to the config's include list
    pub patterns: Vec<String>,

    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Path to config YAML file (default: auto-discover in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rewrite violations in place
    #[arg(long)]
    pub fix: bool,

    /// Compute fixes without writing files (implies --fix)
    #[arg(long)]
    pub dry_run: bool,

    /// Write the JSON outcome here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Drop cached analysis results before running
    #[arg(long)]
    pub clear_cache: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn options(&self) -> EnforceOptions {
        EnforceOptions {
            fix: self.fix || self.dry_run,
            dry_run: self.dry_run,
            abort: None,
        }
    }
}

/// Default tracing filter for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Run the enforcement command.
pub async fn run(cli: &Cli) -> anyhow::Result<i32> {
    let root = match cli.root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access root {:?}: {}", cli.root, e);
            return Ok(EXIT_ERROR);
        }
    };

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::discover(&root),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let enforcer = match Enforcer::new(&root, config) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if cli.clear_cache {
        enforcer.clear_cache();
    }

    let abort = AbortSignal::new();
    {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.abort();
            }
        });
    }
    let options = EnforceOptions {
        abort: Some(abort),
        ..cli.options()
    };

    let outcome = match enforcer
        .enforce(Target::Patterns(cli.patterns.clone()), options)
        .await
    {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let json = serde_json::to_string_pretty(&outcome)?;
    match &cli.output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    write_summary(&outcome);

    if outcome.success {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// One-line human summary on stderr.
fn write_summary(outcome: &EnforceOutcome) {
    eprintln!("{}", summary(outcome));
}

fn summary(outcome: &EnforceOutcome) -> String {
    let stats = &outcome.stats;
    let status = if outcome.success {
        "✓ PASS".green()
    } else {
        "✗ FAIL".red()
    };
    let mut line = format!(
        "{} {} {} {} in {} {}",
        "logsweep".cyan().bold(),
        status,
        stats.total_violations.to_string().bold(),
        plural(stats.total_violations, "violation"),
        stats.files_total,
        plural(stats.files_total, "file"),
    );
    if stats.violations_fixed > 0 {
        line.push_str(&format!(", {} fixed", stats.violations_fixed.to_string().green()));
    }
    if stats.files_errored > 0 {
        line.push_str(&format!(", {} errored", stats.files_errored.to_string().yellow()));
    }
    if stats.aborted {
        line.push_str(&format!(", {}", "aborted".red()));
    }
    line.push_str(&format!(" ({} ms)", stats.elapsed_ms));
    line
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{}s", noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "logsweep", "src/**", "--root", "/tmp", "--dry-run", "-vv", "--clear-cache",
        ]);
        assert_eq!(cli.patterns, vec!["src/**"]);
        assert_eq!(cli.root, PathBuf::from("/tmp"));
        assert!(cli.clear_cache);
        assert_eq!(cli.verbose, 2);

        let options = cli.options();
        assert!(options.fix);
        assert!(options.dry_run);
    }

    #[test]
    fn test_summary_names_counts() {
        colored::control::set_override(false);
        let mut outcome = EnforceOutcome {
            success: false,
            results: Vec::new(),
            violations: Vec::new(),
            fixes: Vec::new(),
            stats: crate::enforce::EnforceStats {
                files_total: 5,
                total_violations: 3,
                files_errored: 1,
                elapsed_ms: 12,
                ..Default::default()
            },
        };
        assert_eq!(
            summary(&outcome),
            "logsweep ✗ FAIL 3 violations in 5 files, 1 errored (12 ms)"
        );

        outcome.success = true;
        outcome.stats = crate::enforce::EnforceStats {
            files_total: 1,
            total_violations: 1,
            violations_fixed: 1,
            ..Default::default()
        };
        assert_eq!(
            summary(&outcome),
            "logsweep ✓ PASS 1 violation in 1 file, 1 fixed (0 ms)"
        );
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["logsweep"]);
        assert!(cli.patterns.is_empty());
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(!cli.options().fix);
        assert_eq!(log_filter(cli.verbose), "warn");
    }
}
