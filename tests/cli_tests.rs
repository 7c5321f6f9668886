//! CLI integration tests
//!
//! These tests run the built binary against the fixture schemas.

#![cfg(feature = "cli")]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn inventory_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xmlschema-inventory"))
}

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_string_lossy().to_string()
}

fn run(args: &[&str]) -> Output {
    inventory_bin()
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

// ============================================================================
// Analyse Command Tests
// ============================================================================

#[test]
fn test_cli_analyse_tsv() {
    let output = run(&["analyse", &fixture("missing_type.xsd")]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "broken\t---\t---\ntitle\tsimple\tsimple\n");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: element 'broken' references undefined type 'missing:Type'"));
    assert!(stderr.contains("2 elements defined"));
    assert!(!stderr.contains("overrides"));
}

#[test]
fn test_cli_analyse_sorted() {
    let output = run(&["analyse", &fixture("tei_like.xsd"), "--sort"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .map(|line| line.split('\t').next().unwrap())
        .collect();
    let mut expected = names.clone();
    expected.sort();
    assert_eq!(names, expected);
    assert_eq!(names.len(), 12);
}

#[test]
fn test_cli_analyse_json() {
    let output = run(&["analyse", &fixture("tei_like.xsd"), "--format", "json"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["elements"].as_array().unwrap().len(), 12);
    assert_eq!(
        value["elements"][5],
        serde_json::json!({"qualifiedName": "p", "isSimpleType": false, "contentKind": "mixed"})
    );
    assert!(value.get("overlay").is_none());
}

#[test]
fn test_cli_analyse_override() {
    let output = run(&[
        "analyse",
        &fixture("tei_like.xsd"),
        "--override",
        &fixture("tei_customised.xsd"),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("p\tcomplex\telementOnly\n"));
    assert!(stdout.ends_with("seg\tsimple\tsimple\n"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("override p: complex mixed ==> complex elementOnly"));
    assert!(stderr.contains("override hi: complex mixed ==> simple simple"));
    assert!(stderr.contains("13 elements defined"));
    assert!(stderr.contains("1 identical overrides"));
    assert!(stderr.contains("2 changing overrides"));
    assert!(stderr.contains("1 added elements"));
}

#[test]
fn test_cli_analyse_override_json() {
    let output = run(&[
        "analyse",
        &fixture("tei_like.xsd"),
        "--override",
        &fixture("tei_customised.xsd"),
        "--format",
        "json",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let overlay = &value["overlay"];
    let overrides = overlay["overrides"].as_array().unwrap();
    assert_eq!(overrides.len(), 2);
    assert_eq!(overrides[0]["name"], "p");
    assert_eq!(overrides[0]["after"]["contentKind"], "elementOnly");
    assert_eq!(overlay["identical"], 1);
    assert_eq!(overlay["added"], 1);
}

#[test]
fn test_cli_analyse_cycle_fails() {
    let output = run(&["analyse", &fixture("cyclic.xsd")]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cyclic type derivation"));
}

#[test]
fn test_cli_analyse_missing_file() {
    let output = run(&["analyse", "/nonexistent/schema.xsd"]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Publish Command Tests
// ============================================================================

#[test]
fn test_cli_publish_copies_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("data.csv"), "a,b\n").unwrap();

    let result = run(&[
        "publish",
        input.path().to_str().unwrap(),
        output.path().to_str().unwrap(),
    ]);

    assert!(result.status.success());
    assert_eq!(
        fs::read_to_string(output.path().join("data.csv")).unwrap(),
        "a,b\n"
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Published 0 notebook(s), copied 1 file(s)"));
}

#[cfg(unix)]
#[test]
fn test_cli_publish_with_converter() {
    use std::os::unix::fs::PermissionsExt;

    let tools = tempfile::tempdir().unwrap();
    let jupyter = tools.path().join("jupyter");
    // Arguments are: nbconvert --to html --stdout <notebook>
    fs::write(&jupyter, "#!/bin/sh\nprintf '<html>'\ncat \"$5\"\nprintf '</html>'\n").unwrap();
    fs::set_permissions(&jupyter, fs::Permissions::from_mode(0o755)).unwrap();

    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("a.ipynb"), r#"<a href="b.ipynb">b</a>"#).unwrap();
    fs::write(input.path().join("b.ipynb"), "second").unwrap();

    let result = run(&[
        "publish",
        input.path().to_str().unwrap(),
        output.path().to_str().unwrap(),
        "--jupyter",
        jupyter.to_str().unwrap(),
    ]);

    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(
        fs::read_to_string(output.path().join("a.html")).unwrap(),
        r#"<html><a href="b.html">b</a></html>"#
    );
    assert_eq!(
        fs::read_to_string(output.path().join("b.html")).unwrap(),
        "<html>second</html>"
    );
}

#[test]
fn test_cli_publish_missing_input() {
    let output = tempfile::tempdir().unwrap();
    let result = run(&[
        "publish",
        "/nonexistent/notebooks",
        output.path().to_str().unwrap(),
    ]);
    assert_eq!(result.status.code(), Some(1));
}
