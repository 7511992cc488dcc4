//! The external runtime emitted assembly links against (spec.md §1, §4.4):
//! `getInt`, `getBool`, `printInt`, `printBool`, `printString`, `magic`,
//! plus libc's own `exit`. This crate does not link anything itself —
//! spec.md's Non-goals rule out any form of linking beyond documenting this
//! ABI — it only embeds the C source and offers a `cc`-invoking helper that
//! end-to-end tests use to actually assemble and run emitted output.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The runtime's C source, embedded at compile time so a test crate never
/// needs to locate this crate's source directory on disk.
pub const RUNTIME_C_SOURCE: &str = include_str!("runtime.c");

/// Writes [`RUNTIME_C_SOURCE`] into `dir` and returns its path.
pub fn write_runtime_source(dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join("wispc_runtime.c");
    std::fs::write(&path, RUNTIME_C_SOURCE)?;
    Ok(path)
}

/// Assembles `asm_path` and the runtime shim with the system `cc`,
/// producing an executable at `out_path`. Used only by end-to-end tests;
/// the driver binary never shells out to an assembler or linker itself.
pub fn assemble_and_link(asm_path: &Path, out_path: &Path) -> io::Result<()> {
    let dir = out_path.parent().unwrap_or_else(|| Path::new("."));
    let runtime_path = write_runtime_source(dir)?;

    let status = Command::new("cc")
        .arg(asm_path)
        .arg(&runtime_path)
        .arg("-o")
        .arg(out_path)
        .status()?;

    if !status.success() {
        return Err(io::Error::other(format!("cc exited with {status}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_source_declares_every_documented_symbol() {
        for symbol in ["getInt", "getBool", "printInt", "printBool", "printString", "magic"] {
            assert!(RUNTIME_C_SOURCE.contains(symbol), "missing {symbol} in runtime shim");
        }
    }

    #[test]
    fn write_runtime_source_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_runtime_source(dir.path()).expect("write succeeds");
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, RUNTIME_C_SOURCE);
    }
}
