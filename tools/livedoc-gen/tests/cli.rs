// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Exit codes and outputs of the `livedoc-gen` binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const LEDGER: &str = r#"{
    "space": "Ledger",
    "records": [{"name": "Entry", "fields": [
        {"name": "id", "type": {"kind": "scalar", "scalar": "int"}},
        {"name": "amount", "type": {"kind": "scalar", "scalar": "long"}}
    ]}],
    "root": {"name": "LivingDocument", "fields": [
        {"name": "entries", "type": {"kind": "table", "record": "Entry"}}
    ]}
}"#;

const BROKEN: &str = r#"{
    "space": "Broken",
    "root": {"name": "LivingDocument", "fields": [
        {"name": "entries", "type": {"kind": "table", "record": "Missing"}}
    ]}
}"#;

fn space_file(dir: &TempDir, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json).expect("write declarations");
    path
}

fn livedoc_gen(args: &[&str], input: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_livedoc-gen"))
        .args(["--log-level", "warn"])
        .args(args)
        .arg(input)
        .output()
        .expect("run livedoc-gen")
}

#[test]
fn test_check_accepts_a_deployable_space() {
    let dir = TempDir::new().expect("tempdir");
    let input = space_file(&dir, "ledger.json", LEDGER);

    let out = livedoc_gen(&["check"], &input);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[OK] space 'Ledger' is deployable"), "{stdout}");
}

#[test]
fn test_check_exits_with_the_not_deployable_code() {
    let dir = TempDir::new().expect("tempdir");
    let input = space_file(&dir, "broken.json", BROKEN);

    let out = livedoc_gen(&["check"], &input);
    // NOT_DEPLOYABLE is 150007; the process keeps its low byte.
    assert_eq!(out.status.code(), Some(247));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("'Missing' was not found"), "{stdout}");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("NOT_DEPLOYABLE (150007)"), "{stderr}");
}

#[test]
fn test_generate_writes_the_unit_source() {
    let dir = TempDir::new().expect("tempdir");
    let input = space_file(&dir, "ledger.json", LEDGER);
    let output = dir.path().join("ledger.rs");

    let out = livedoc_gen(&["generate", "-o", output.to_str().expect("utf-8 path")], &input);
    assert_eq!(out.status.code(), Some(0));
    let source = std::fs::read_to_string(&output).expect("generated source");
    assert!(source.starts_with("// Generated by livedoc for unit 'livedoc_ledger'."));
    assert!(source.contains("pub struct RTxEntry {"));
}

#[test]
fn test_generate_refuses_a_broken_space() {
    let dir = TempDir::new().expect("tempdir");
    let input = space_file(&dir, "broken.json", BROKEN);
    let output = dir.path().join("broken.rs");

    let out = livedoc_gen(&["generate", "-o", output.to_str().expect("utf-8 path")], &input);
    assert_eq!(out.status.code(), Some(247));
    assert!(!output.exists());
}

#[test]
fn test_unreadable_input_is_a_plain_failure() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.json");

    let out = livedoc_gen(&["check"], &missing);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("reading declarations from"), "{stderr}");
}
