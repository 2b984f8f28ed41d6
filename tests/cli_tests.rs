//! Tests for the `brainfly` binary: build artifacts, then run them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use brainfly::{artifact, compile};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("brainfly-cli-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn brainfly(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_brainfly"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("failed to start brainfly: {e}"));
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    child.wait_with_output().unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_build_writes_canonical_text_and_reloadable_artifact() {
    let dir = scratch_dir("echo");
    let source = dir.join("echo.bf");
    fs::write(&source, ",[.,]").unwrap();

    let built = brainfly(&["build", path_str(&source), "--out-dir", path_str(&dir)], b"");
    assert!(built.status.success(), "{}", String::from_utf8_lossy(&built.stderr));

    let canonical = compile(",[.,]").unwrap().to_string();
    assert_eq!(fs::read_to_string(dir.join("echo.bft")).unwrap(), canonical);
    let compressed = fs::read(dir.join("echo.bfo")).unwrap();
    assert_eq!(artifact::decompress(&compressed).unwrap(), canonical.as_bytes());

    let ran = brainfly(&["run", "128", path_str(&dir.join("echo.bfo"))], b"echo me");
    assert_eq!(ran.stdout, b"echo me");
    assert_eq!(ran.status.code(), Some(0));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_long_program_builds_and_reloads() {
    let dir = scratch_dir("long");
    let source = dir.join("long.bf");
    // 80k nodes of output and moves, then one merged run back to cell 0.
    let program = format!("{}{}", ".>".repeat(40_000), "<".repeat(40_000));
    fs::write(&source, &program).unwrap();

    let built = brainfly(&["build", path_str(&source), "--out-dir", path_str(&dir)], b"");
    assert!(built.status.success(), "{}", String::from_utf8_lossy(&built.stderr));

    let ran = brainfly(&["run", "100000", path_str(&dir.join("long.bfo"))], b"");
    assert!(ran.status.success(), "{}", String::from_utf8_lossy(&ran.stderr));
    assert_eq!(ran.stdout, vec![0u8; 40_000]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_corrupt_artifact_is_reported_not_fatal() {
    let dir = scratch_dir("corrupt");
    let path = dir.join("nested.bfo");
    fs::write(&path, artifact::compress("OutputData<".repeat(300_000).as_bytes()).unwrap()).unwrap();

    let ran = brainfly(&["run", "128", path_str(&path)], b"");
    assert_eq!(ran.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&ran.stderr).contains("Malformed artifact"));

    fs::remove_dir_all(&dir).unwrap();
}
