//! Full source-to-executable runs: invoke `wispc -o`, assemble and link the
//! emitted assembly against the runtime shim, then run the result and check
//! what it actually printed (spec.md §8's S1/S6 are exercised end to end
//! here, not just through the in-process pipeline).

use std::path::PathBuf;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("e2e").join("fixtures")
}

fn compile_to_executable(fixture: &str, dir: &std::path::Path) -> PathBuf {
    let input = fixtures_dir().join(fixture);
    let asm_path = dir.join("out.s");
    let exe_path = dir.join("out");

    let output = Command::new(env!("CARGO_BIN_EXE_wispc"))
        .arg("-o")
        .arg(&input)
        .output()
        .expect("wispc runs");
    assert!(output.status.success(), "wispc -o failed: {}", String::from_utf8_lossy(&output.stderr));

    std::fs::write(&asm_path, &output.stdout).expect("write assembly");
    wispc_runtime::assemble_and_link(&asm_path, &exe_path).expect("assemble and link");
    exe_path
}

#[test]
fn hello_world_prints_its_string_literal() {
    let dir = TempDir::new().expect("tempdir");
    let exe = compile_to_executable("hello_world.fax", dir.path());

    let output = StdCommand::new(&exe).output().expect("run executable");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim_end(), "hello, world");
}

#[test]
fn arithmetic_prints_the_computed_result() {
    let dir = TempDir::new().expect("tempdir");
    let exe = compile_to_executable("arithmetic.fax", dir.path());

    let output = StdCommand::new(&exe).output().expect("run executable");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim_end(), "13");
}
