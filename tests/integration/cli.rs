mod common;
use common::{compile, minijavac};

const HELLO: &str = "class Main { public static void main(String[] args) { System.out.println(1); } }";

#[test]
fn no_file_argument_prints_error() {
    let output = minijavac().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Error\n");
}

#[test]
fn success_prints_success() {
    let (output, _dir, bin) = compile(HELLO);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Success\n");
    assert!(bin.exists());
}

#[cfg(unix)]
#[test]
fn output_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let (_output, _dir, bin) = compile(HELLO);
    let mode = std::fs::metadata(&bin).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn default_output_is_a_out() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Hello.java"), HELLO).unwrap();

    let output = minijavac().current_dir(dir.path()).arg("Hello.java").output().unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("a.out").exists());
}

#[test]
fn errors_are_listed_with_positions() {
    let (output, _dir, bin) = compile("class Main {\n  int x;\n  int x;\n}\n");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Error\n*** 3:7: Identification error: x already exists in this scope\n"
    );
    assert!(!bin.exists());
}

#[test]
fn missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = minijavac().arg(dir.path().join("Nope.java")).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.starts_with("Error\n*** I/O error: failed to read"), "{stdout}");
}

#[test]
fn pretty_errors_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("Bad.java");
    std::fs::write(&src, "class Main { public static void main(String[] args) { int x = y; } }").unwrap();

    let output = minijavac()
        .arg(&src)
        .arg("--pretty")
        .arg("-o")
        .arg(dir.path().join("bad"))
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("declaration not found: y"), "{stderr}");
}

#[test]
fn verbose_logs_phases() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("Hello.java");
    std::fs::write(&src, HELLO).unwrap();

    let output = minijavac()
        .arg(&src)
        .arg("-v")
        .arg("-o")
        .arg(dir.path().join("hello"))
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success());
    assert!(stderr.contains("identification complete"), "{stderr}");
    assert!(stderr.contains("wrote executable"), "{stderr}");
}
