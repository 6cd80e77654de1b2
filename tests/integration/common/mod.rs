#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

pub fn minijavac() -> Command {
    Command::new(env!("CARGO_BIN_EXE_minijavac"))
}

/// Run the compiler on `source`; the temp dir keeps the output alive.
pub fn compile(source: &str) -> (Output, tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("Test.java");
    let bin_path = dir.path().join("test_bin");

    std::fs::write(&src_path, source).unwrap();

    let output = minijavac()
        .arg(&src_path)
        .arg("-o")
        .arg(&bin_path)
        .output()
        .unwrap();
    (output, dir, bin_path)
}

pub fn compile_should_succeed(source: &str) {
    let (output, _dir, bin_path) = compile(source);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Compilation failed:\n{stdout}");
    assert_eq!(stdout.lines().next(), Some("Success"));
    assert!(bin_path.exists(), "Binary was not created");
}

pub fn compile_and_run(source: &str) -> i32 {
    let (output, _dir, bin_path) = compile(source);
    assert!(
        output.status.success(),
        "Compilation failed:\n{}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(bin_path.exists(), "Binary was not created");

    let run_output = Command::new(&bin_path).output().unwrap();
    run_output.status.code().unwrap_or(-1)
}

pub fn compile_and_run_stdout(source: &str) -> String {
    let (output, _dir, bin_path) = compile(source);
    assert!(
        output.status.success(),
        "Compilation failed:\n{}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(bin_path.exists(), "Binary was not created");

    let run_output = Command::new(&bin_path).output().unwrap();
    assert!(run_output.status.success(), "Binary exited with non-zero status");
    String::from_utf8_lossy(&run_output.stdout).to_string()
}

/// Compilation must fail, print `Error` first, mention `expected_msg`, and
/// leave no executable behind.
pub fn compile_should_fail_with(source: &str, expected_msg: &str) {
    let (output, _dir, bin_path) = compile(source);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(!output.status.success(), "Compilation should have failed");
    assert_eq!(stdout.lines().next(), Some("Error"), "stdout was:\n{stdout}");
    assert!(
        stdout.contains(expected_msg),
        "Expected error containing '{expected_msg}', got:\n{stdout}"
    );
    assert!(!bin_path.exists(), "Binary should not have been created");
}

/// Wrap statements in a `main` method of a single class.
pub fn main_with(body: &str) -> String {
    format!("class Main {{\n    public static void main(String[] args) {{\n{body}\n    }}\n}}\n")
}
