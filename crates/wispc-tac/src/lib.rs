//! Three-address code: the architecture-independent IR between the typed
//! AST and x86-64 emission (spec.md §4.3).

pub mod ir;
pub mod lower;
pub mod pretty;

pub use ir::*;
pub use lower::lower;
pub use pretty::render;
