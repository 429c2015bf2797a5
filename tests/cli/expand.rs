//! Tests for `vaultmaps expand`.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_expand_nested_yaml() {
    let t = Test::new();

    let output = t.expand("path1.path2=val1,path3=val2");
    assert_success(&output);
    assert_eq!(stdout(&output), "path1:\n  path2: val1\npath3: val2\n");
}

#[test]
fn test_expand_from_stdin() {
    let t = Test::new();

    t.cmd()
        .arg("expand")
        .write_stdin("mysql.ro.password=pw,mysql.rw.password=pw2\n")
        .assert()
        .success()
        .stdout("mysql:\n  ro:\n    password: pw\n  rw:\n    password: pw2\n");
}

#[test]
fn test_expand_from_file() {
    let t = Test::new();
    t.write("blob.txt", "k==weird\n");

    let output = t
        .cmd()
        .args(["expand", "--file", "blob.txt"])
        .output()
        .unwrap();
    assert_success(&output);
    let parsed: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["k"].as_str(), Some("=weird"));
}

#[test]
fn test_expand_json() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["expand", "--format", "json", "x.y.z=val"])
        .output()
        .unwrap();
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["x"]["y"]["z"], "val");
}

#[test]
fn test_expand_empty_input() {
    let t = Test::new();

    t.cmd()
        .args(["expand", ""])
        .assert()
        .success()
        .stdout("{}\n");
}

#[test]
fn test_expand_conflict_fails_with_hint() {
    let t = Test::new();

    let output = t.expand("a=1,a.b=2");
    assert_failure(&output);
    assert_stderr_contains(&output, "already holds a value");
    assert_stderr_contains(&output, "--on-conflict overwrite");
}

#[test]
fn test_expand_conflict_overwrite() {
    let t = Test::new();

    t.cmd()
        .args(["expand", "--on-conflict", "overwrite", "a=1,a.b=2"])
        .assert()
        .success()
        .stdout("a:\n  b: '2'\n");
}

#[test]
fn test_expand_malformed_entry_fails() {
    let t = Test::new();

    t.cmd()
        .args(["expand", "a=1,broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing '='"))
        .stdout(predicate::str::is_empty());
}
