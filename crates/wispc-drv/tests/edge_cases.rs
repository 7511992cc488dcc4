//! Boundary behavior the happy-path scenarios in `integration_test.rs` don't
//! exercise: empty programs, cascade suppression, and the exit codes that
//! distinguish a user diagnostic from an internal-invariant failure.

use std::io::Write;

use tempfile::NamedTempFile;

fn source_file(src: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tempfile");
    write!(f, "{src}").expect("write source");
    f
}

#[test]
fn empty_program_is_well_formed() {
    let f = source_file("");
    let code = wispc_drv::run_args(["-c", f.path().to_str().unwrap()]).expect("runs");
    assert_eq!(code, 0);
}

#[test]
fn a_single_undeclared_type_suppresses_the_downstream_undeclared_symbol_error() {
    // spec.md S5: an invalid declared type must not also trigger a second,
    // cascaded "undeclared identifier" diagnostic for the same symbol.
    let f = source_file("main: () void { x: void; give x; }");
    let code = wispc_drv::run_args(["-n", f.path().to_str().unwrap()]).expect("runs");
    assert_eq!(code, 1);
}

#[test]
fn while_loop_and_post_increment_type_check_cleanly() {
    let f = source_file(
        "main: () void { i: int = 0; while (i < 10) { i++; } give i; }",
    );
    let code = wispc_drv::run_args(["-c", f.path().to_str().unwrap()]).expect("runs");
    assert_eq!(code, 0);
}

#[test]
fn take_into_a_declared_variable_type_checks() {
    let f = source_file("main: () void { x: int; take x; give x; }");
    let code = wispc_drv::run_args(["-c", f.path().to_str().unwrap()]).expect("runs");
    assert_eq!(code, 0);
}

#[test]
fn exit_statement_is_accepted_by_every_pass_before_emission() {
    let f = source_file("main: () void { exit; }");
    let code = wispc_drv::run_args(["-a", f.path().to_str().unwrap()]).expect("runs");
    assert_eq!(code, 0);
}

#[test]
fn magic_expression_is_an_internal_error_in_type_analysis() {
    // `magic` is unimplemented: reaching it in type analysis is an
    // internal-invariant failure (exit code 2), not a user diagnostic.
    let f = source_file("main: () void { x: int = magic; give x; }");
    let code = wispc_drv::run_args(["-c", f.path().to_str().unwrap()]).expect("runs");
    assert_eq!(code, 2);
}
