//! Tests for the `logsweep` binary: JSON on stdout and exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn logsweep(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logsweep"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("should run logsweep")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    temp
}

#[test]
fn test_clean_project_exits_zero() {
    let temp = project(&[("src/app.js", "export const x = 1;\n")]);
    let output = logsweep(temp.path(), &[]);

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["success"], true);
    assert_eq!(json["stats"]["files_total"], 1);
    assert_eq!(json["violations"].as_array().unwrap().len(), 0);
}

#[test]
fn test_violations_exit_one() {
    let temp = project(&[
        ("src/app.js", "console.log('hi');\n"),
        ("src/jobs.py", "print('job')\n"),
    ]);
    let output = logsweep(temp.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["success"], false);

    let violations = json["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0]["file_path"], "src/app.js");
    assert_eq!(violations[0]["line"], 1);
    assert_eq!(violations[0]["severity"], "error");
    assert_eq!(violations[1]["file_path"], "src/jobs.py");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("FAIL 2 violations in 2 files"), "stderr: {}", stderr);
}

#[test]
fn test_fix_exits_zero_and_rewrites() {
    let temp = project(&[("src/app.js", "console.log('hi');\n")]);
    let output = logsweep(temp.path(), &["--fix"]);

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["stats"]["violations_fixed"], 1);
    assert_eq!(json["fixes"][0]["written"], true);
    assert_eq!(
        fs::read_to_string(temp.path().join("src/app.js")).unwrap(),
        "import pino from 'pino';\nconst logger = pino();\nlogger.info('hi');\n"
    );
}

#[test]
fn test_dry_run_leaves_files_alone() {
    let temp = project(&[("src/app.js", "console.log('hi');\n")]);
    let output = logsweep(temp.path(), &["--dry-run"]);

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["fixes"][0]["written"], false);
    assert!(json["fixes"][0]["fixed_content"]
        .as_str()
        .unwrap()
        .contains("logger.info('hi')"));
    assert_eq!(
        fs::read_to_string(temp.path().join("src/app.js")).unwrap(),
        "console.log('hi');\n"
    );
}

#[test]
fn test_patterns_narrow_selection() {
    let temp = project(&[
        ("src/app.js", "console.log('hi');\n"),
        ("lib/util.js", "console.log('util');\n"),
    ]);
    let output = logsweep(temp.path(), &["lib/**/*.js"]);

    let json = stdout_json(&output);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["file_path"], "lib/util.js");
}

#[test]
fn test_output_file() {
    let temp = project(&[("src/app.js", "console.log('hi');\n")]);
    let report = temp.path().join("report.json");
    let output = logsweep(temp.path(), &["--output", report.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let json: Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["stats"]["total_violations"], 1);
}

#[test]
fn test_invalid_config_exits_two() {
    let temp = project(&[
        ("src/app.js", "console.log('hi');\n"),
        ("logsweep.yaml", "concurrency: 0\n"),
    ]);
    let output = logsweep(temp.path(), &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());

    let temp = project(&[("logsweep.yaml", "unknown_key: true\n")]);
    assert_eq!(logsweep(temp.path(), &[]).status.code(), Some(2));
}

#[test]
fn test_missing_root_exits_two() {
    let temp = TempDir::new().unwrap();
    let output = logsweep(&temp.path().join("nope"), &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_clear_cache_flag() {
    let temp = project(&[("src/app.js", "console.log('hi');\n")]);
    logsweep(temp.path(), &[]);
    let cached = stdout_json(&logsweep(temp.path(), &[]));
    assert_eq!(cached["stats"]["cache_hits"], 1);

    let cleared = stdout_json(&logsweep(temp.path(), &["--clear-cache"]));
    assert_eq!(cleared["stats"]["cache_hits"], 0);
}
