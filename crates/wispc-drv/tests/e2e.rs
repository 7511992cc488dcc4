//! Entry point Cargo actually compiles as a test binary; `tests/e2e/mod.rs`
//! holds the suite itself so it can be split across multiple files.

#[path = "e2e/mod.rs"]
mod e2e;
