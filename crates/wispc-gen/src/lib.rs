//! x86-64 AT&T-syntax text emission from three-address code (spec.md §4.4).

pub mod asm;
pub mod error;

pub use asm::emit_program;
pub use error::{EmitError, Result};
