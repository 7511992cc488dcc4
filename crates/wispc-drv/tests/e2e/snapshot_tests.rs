//! Snapshot-style checks: a fixed program's token dump, unparse, and TAC
//! rendering should be stable and contain the landmarks spec.md calls out,
//! rather than being asserted character-for-character against a stored file.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("e2e").join("fixtures")
}

#[test]
fn token_dump_includes_every_keyword_in_the_fixture() {
    let input = fixtures_dir().join("arithmetic.fax");
    Command::new(env!("CARGO_BIN_EXE_wispc"))
        .arg("-t")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ident").and(predicate::str::contains("IntLit")));
}

#[test]
fn unparse_preserves_function_structure() {
    let input = fixtures_dir().join("arithmetic.fax");
    Command::new(env!("CARGO_BIN_EXE_wispc"))
        .arg("-p")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("main").and(predicate::str::contains("return")));
}

#[test]
fn tac_dump_names_the_called_function() {
    let input = fixtures_dir().join("arithmetic.fax");
    Command::new(env!("CARGO_BIN_EXE_wispc"))
        .arg("-a")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("call f").and(predicate::str::contains("proc main")));
}
