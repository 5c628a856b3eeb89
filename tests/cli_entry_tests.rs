//! CLI entry tests for the `ppk` binary.
//!
//! Covers the JSON entry points (`ppk job` and `ppk dispatch`), top-level
//! argument handling, and end-to-end dispatch against a stub bundler
//! command configured through `pagepack.toml`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

fn ppk() -> Command {
    Command::cargo_bin("ppk").expect("ppk binary should build")
}

/// Directory with a stub bundler config; `true` accepts any payload.
fn stub_project(command: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("pagepack.toml"),
        format!("[bundler]\ncommand = [\"{command}\"]\n"),
    )
    .unwrap();
    std::fs::create_dir_all(temp.path().join("node_modules")).unwrap();
    temp
}

/// Descriptor JSON rooted in a stub project directory.
fn stub_payload(temp: &TempDir, name: &str) -> serde_json::Value {
    serde_json::json!({
        "src path": temp.path().join("pages").join(name).join("index.js"),
        "dest dir": temp.path().join("build").join(name),
        "watch": false,
        "npm root": temp.path().join("node_modules"),
        "src dir": temp.path().join("pages").join(name),
        "html template": temp.path().join("public").join("index.html"),
        "page name": name
    })
}

// ============================================================================
// ppk job
// ============================================================================

#[test]
fn test_job_rejects_empty_object() {
    ppk()
        .args(["job", "{}"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Bad command!"));
}

#[test]
fn test_job_rejects_invalid_json() {
    ppk()
        .args(["job", "this is not json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Bad command!"));
}

#[test]
fn test_job_rejects_missing_required_keys() {
    let payload = r#"{"src path": "pages/home/index.js", "dest dir": "build/home"}"#;
    ppk()
        .args(["job", payload])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Bad command!"));
}

#[test]
fn test_job_reports_empty_field_values() {
    // All keys present but one value empty: decodes, then fails validation
    let temp = stub_project("true");
    let mut payload = stub_payload(&temp, "home");
    payload["src path"] = serde_json::json!("");

    ppk()
        .current_dir(temp.path())
        .args(["job", &payload.to_string()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("must be a non-empty path"));
}

#[test]
fn test_job_with_stub_bundler_succeeds() {
    let temp = stub_project("true");
    let payload = stub_payload(&temp, "home").to_string();

    ppk()
        .current_dir(temp.path())
        .args(["job", &payload])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dispatched 1 jobs"));
}

#[test]
fn test_job_failure_exit_code() {
    // A bundler command that always fails compiles but does not break
    let temp = stub_project("false");
    let payload = stub_payload(&temp, "home").to_string();

    ppk()
        .current_dir(temp.path())
        .args(["job", &payload])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("1 failed"));
}

// ============================================================================
// ppk dispatch
// ============================================================================

#[test]
fn test_dispatch_rejects_bad_payload() {
    ppk()
        .args(["dispatch", "[{"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_dispatch_rejects_object_payload() {
    // The batch entry takes an array; a bare object is a payload error
    let temp = stub_project("true");
    let payload = stub_payload(&temp, "home").to_string();

    ppk()
        .current_dir(temp.path())
        .args(["dispatch", &payload])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_dispatch_batch_with_stub_bundler() {
    let temp = stub_project("true");
    let payload =
        serde_json::json!([stub_payload(&temp, "home"), stub_payload(&temp, "about")]).to_string();

    ppk()
        .current_dir(temp.path())
        .args(["dispatch", &payload])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dispatched 2 jobs"));
}

#[test]
fn test_dispatch_json_events() {
    let temp = stub_project("true");
    let payload = serde_json::json!([stub_payload(&temp, "home")]).to_string();

    ppk()
        .current_dir(temp.path())
        .args(["dispatch", "--json", &payload])
        .assert()
        .success()
        .stderr(predicate::str::contains(r#""event":"batch_started""#))
        .stderr(predicate::str::contains(r#""event":"job_succeeded""#))
        .stderr(predicate::str::contains(r#""event":"batch_finished""#));
}

// ============================================================================
// Top-level arguments
// ============================================================================

#[test]
fn test_help_succeeds() {
    ppk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dispatch page bundle jobs"));
}

#[test]
fn test_version_prints_name() {
    ppk().arg("--version").assert().success().stdout(predicate::str::contains("ppk"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    ppk().arg("frobnicate").assert().failure().code(2);
}

#[test]
fn test_job_requires_payload_argument() {
    ppk().arg("job").assert().failure().code(2);
}
