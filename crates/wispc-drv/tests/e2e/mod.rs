//! End-to-end tests for `wispc`: the CLI surface, and full source-to-executable
//! runs through the system assembler/linker via `wispc-runtime`.

mod cli_tests;
mod compilation_tests;
mod snapshot_tests;
