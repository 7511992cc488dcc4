//! Shared infrastructure for the wisp compiler.
//!
//! Every other `wispc-*` crate depends on this one: interned identifiers
//! ([`symbol`]), source locations ([`span`]), typed index vectors
//! ([`index_vec`]), and diagnostic reporting ([`diagnostic`]). None of it is
//! tied to a particular compiler phase; it is the plumbing phases are built
//! from. Phase-specific internal-error kinds (e.g. `wispc-sem`'s
//! `InternalError`) live with the phase that can raise them, not here.

pub mod def_id;
pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
