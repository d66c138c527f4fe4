use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_docshape");

const USER_YAML: &str = r#"
name: User
format: json
fields:
  - name: name
    optional: false
    category:
      scalar:
        type: string
        constraint:
          string: { min_length: 1, max_length: 50 }
  - name: age
    optional: true
    category:
      scalar:
        type: int32
        constraint:
          integer: { min: 0, max: 150 }
"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

fn schema_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "user.yaml", USER_YAML);
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("failed to run docshape")
}

fn reports(output: &Output) -> Vec<serde_json::Value> {
    serde_json::from_slice(&output.stdout).expect("stdout should be a JSON report list")
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_lists_compiled_schemas() {
    let dir = schema_dir();
    let out = run(&["check", dir.path().to_str().unwrap()]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.lines().any(|l| l == "User"), "{stdout}");
}

#[test]
fn check_fails_on_bad_definition() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "broken.yaml",
        "name: Broken\nfields:\n  - name: flag\n    category:\n      scalar:\n        type: boolean\n",
    );
    let out = run(&["check", dir.path().to_str().unwrap()]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Broken"), "{stderr}");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_document() {
    let dir = schema_dir();
    let doc = write(dir.path(), "ok.json", r#"{"name": "Ada", "age": 36}"#);
    let out = run(&[
        "validate",
        "--schema",
        "User",
        "--schemas",
        dir.path().join("user.yaml").to_str().unwrap(),
        doc.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let reports = reports(&out);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[0]["value"]["name"], "Ada");
    assert_eq!(reports[0]["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn validate_reports_every_error_and_exits_non_zero() {
    let dir = schema_dir();
    let schemas = dir.path().join("user.yaml");
    let good = write(dir.path(), "good.json", r#"{"name": "Ada"}"#);
    let bad = write(dir.path(), "bad.json", r#"{"name": "", "age": 200}"#);
    let out = run(&[
        "validate",
        "--schema",
        "User",
        "--schemas",
        schemas.to_str().unwrap(),
        "--jobs",
        "2",
        good.to_str().unwrap(),
        bad.to_str().unwrap(),
    ]);

    assert!(!out.status.success());
    let reports = reports(&out);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[1]["valid"], false);

    let errors = reports[1]["errors"].as_array().unwrap();
    let ids: Vec<&str> = errors.iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["StringTooShort", "NumericTooLarge"]);
    assert_eq!(errors[1]["data"]["path"], "age");
}

#[test]
fn validate_rejects_oversized_documents() {
    let dir = schema_dir();
    let doc = write(dir.path(), "big.json", r#"{"name": "A fairly long name"}"#);
    let out = run(&[
        "validate",
        "--schema",
        "User",
        "--schemas",
        dir.path().to_str().unwrap(),
        "--max-bytes",
        "8",
        doc.to_str().unwrap(),
    ]);

    assert!(!out.status.success());
    let reports = reports(&out);
    assert_eq!(reports[0]["errors"][0]["id"], "InvalidInputData");
    assert!(reports[0].get("value").is_none());
}

#[test]
fn validate_rejects_oversized_stdin() {
    let dir = schema_dir();
    let mut child = Command::new(BIN)
        .args([
            "validate",
            "--schema",
            "User",
            "--schemas",
            dir.path().to_str().unwrap(),
            "--max-bytes",
            "64",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn docshape");
    let doc = format!(r#"{{"name": "{}"}}"#, "x".repeat(4096));
    // The reader stops at the limit, so the write may see a closed pipe.
    let _ = child.stdin.take().unwrap().write_all(doc.as_bytes());
    let out = child.wait_with_output().unwrap();

    assert!(!out.status.success());
    let reports = reports(&out);
    assert_eq!(reports[0]["input"], "-");
    let errors = reports[0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["id"], "InvalidInputData");
    assert!(reports[0].get("value").is_none());
}

#[test]
fn validate_reads_stdin_and_honors_no_value() {
    let dir = schema_dir();
    let mut child = Command::new(BIN)
        .args([
            "validate",
            "--schema",
            "User",
            "--schemas",
            dir.path().to_str().unwrap(),
            "--no-value",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn docshape");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"name": "Grace"}"#)
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert!(out.status.success());
    let reports = reports(&out);
    assert_eq!(reports[0]["input"], "-");
    assert!(reports[0].get("value").is_none());
}

#[test]
fn validate_uses_config_file() {
    let dir = schema_dir();
    let config = write(
        dir.path(),
        "docshape.yml",
        "schemas:\n  - user.yaml\noutput:\n  include_value: false\n  format: yaml\n",
    );
    let doc = write(dir.path(), "ok.json", r#"{"name": "Ada"}"#);
    let out = run(&[
        "validate",
        "--schema",
        "User",
        "--config",
        config.to_str().unwrap(),
        doc.to_str().unwrap(),
    ]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let reports: Vec<serde_yaml::Value> = serde_yaml::from_slice(&out.stdout).unwrap();
    assert_eq!(reports[0]["valid"], serde_yaml::Value::Bool(true));
    assert!(reports[0].get("value").is_none());
}

#[test]
fn validate_unknown_schema() {
    let dir = schema_dir();
    let out = run(&[
        "validate",
        "--schema",
        "Nope",
        "--schemas",
        dir.path().to_str().unwrap(),
    ]);

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown schema 'Nope'"), "{stderr}");
}
