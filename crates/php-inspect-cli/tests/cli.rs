use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{json, Value};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_php-inspect"))
        .args(args)
        .args(["--color", "never"])
        .output()
        .expect("command executes")
}

fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is utf-8")
}

fn fixture(name: &str) -> String {
    fixture_path(name).display().to_string()
}

#[test]
fn raw_mode_prints_file_verbatim() {
    let stdout = run_ok(&[&fixture("order.txt")]);
    assert_eq!(stdout, r#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#);
}

#[test]
fn php_mode_prints_keys_in_declared_order() {
    assert_eq!(run_ok(&[&fixture("order.txt"), "--php"]), "foo: bar\nbaz: 42\n");
}

#[test]
fn php_mode_indents_nested_arrays() {
    let stdout = run_ok(&[&fixture("user.txt"), "-p"]);
    assert_eq!(
        stdout,
        "name: Alice\ntags:\n  0: admin\n  1: active\nactive: true\n"
    );
}

#[test]
fn decode_failure_falls_back_to_raw_bytes() {
    let output = run(&[&fixture("truncated.txt"), "--php"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "s:5:\"ab\"");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
    assert!(stderr.contains("string length mismatch"), "stderr: {stderr}");
}

#[test]
fn json_output_carries_key_order() {
    let stdout = run_ok(&[&fixture("order.txt"), "--php", "--json"]);
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["key_order"], json!(["foo", "baz"]));
    assert_eq!(json["value"], json!({"foo": "bar", "baz": 42}));
}

#[test]
fn flat_keys_records_string_values() {
    let stdout = run_ok(&[&fixture("order.txt"), "--php", "--json", "--flat-keys"]);
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["key_order"], json!(["foo", "bar", "baz"]));
    assert_eq!(json["value"], json!({"foo": "bar", "baz": 42}));

    let text = run_ok(&[&fixture("order.txt"), "--php", "--flat-keys"]);
    assert_eq!(text, "foo: bar\nbaz: 42\n");
}

#[test]
fn max_depth_limits_decoding() {
    let output = run(&[&fixture("user.txt"), "--php", "--max-depth", "1"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("a:3:{"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("maximum nesting depth (1)"));
}

#[test]
fn max_depth_above_the_ceiling_is_rejected() {
    for depth in ["513", "1000000", "0"] {
        let output = run(&[&fixture("user.txt"), "--php", "--max-depth", depth]);
        assert_eq!(output.status.code(), Some(2), "--max-depth {depth}");
        assert!(output.stdout.is_empty());
        assert!(String::from_utf8_lossy(&output.stderr).contains("--max-depth"));
    }
    assert!(run(&[&fixture("user.txt"), "--php", "--max-depth", "512"])
        .status
        .success());
}

#[test]
fn oversized_file_is_rejected() {
    let output = run(&[&fixture("order.txt"), "-m", "8"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("over the limit of 8 bytes"));
}

#[test]
fn missing_file_is_an_error() {
    let output = run(&[&fixture("does-not-exist.txt")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist.txt"));
}

#[test]
fn json_requires_php_flag() {
    let output = run(&[&fixture("order.txt"), "--json"]);
    assert!(!output.status.success());
}

#[test]
fn output_file_gets_uncoloured_report() {
    let path = std::env::temp_dir().join(format!("php-inspect-{}.txt", std::process::id()));
    let path_arg = path.display().to_string();

    let output = Command::new(env!("CARGO_BIN_EXE_php-inspect"))
        .args([&fixture("user.txt"), "--php", "--color", "always", "-o", &path_arg])
        .output()
        .expect("command executes");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("\u{1b}["));

    let written = std::fs::read_to_string(&path).expect("output file exists");
    let _ = std::fs::remove_file(&path);
    assert_eq!(
        written,
        "name: Alice\ntags:\n  0: admin\n  1: active\nactive: true\n"
    );
}
