//! CLI surface: argument parsing, mutual exclusion of the mode flags, and
//! exit codes for a well-formed versus a diagnostic-producing program.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("e2e").join("fixtures")
}

fn wispc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wispc"))
}

#[test]
fn help_lists_every_mode_flag() {
    wispc().arg("--help").assert().success().stdout(
        predicate::str::contains("-t")
            .and(predicate::str::contains("-p"))
            .and(predicate::str::contains("-n"))
            .and(predicate::str::contains("-c"))
            .and(predicate::str::contains("-a"))
            .and(predicate::str::contains("-o")),
    );
}

#[test]
fn no_mode_flag_is_a_usage_error() {
    let input = fixtures_dir().join("hello_world.fax");
    wispc().arg(&input).assert().failure();
}

#[test]
fn two_mode_flags_at_once_is_a_usage_error() {
    let input = fixtures_dir().join("hello_world.fax");
    wispc().arg("-t").arg(&input).arg("-p").arg(&input).assert().failure();
}

#[test]
fn well_formed_program_exits_zero_under_check_mode() {
    let input = fixtures_dir().join("arithmetic.fax");
    wispc().arg("-c").arg(&input).assert().success();
}

#[test]
fn program_with_a_type_error_exits_one_and_prints_a_fatal_diagnostic() {
    let input = fixtures_dir().join("bad_return.fax");
    wispc().arg("-c").arg(&input).assert().code(1).stderr(predicate::str::contains("FATAL"));
}

#[test]
fn missing_source_file_is_not_a_panic() {
    wispc().arg("-t").arg("/nonexistent/path/nope.fax").assert().failure().code(predicate::ne(101));
}
