//! Name and type analysis.
//!
//! [`resolve::analyze`] binds every identifier occurrence to a definition;
//! [`typeck::analyze`] then assigns every reachable expression a [`types::Type`]
//! from the flyweight [`types::TypeCtx`] registry. User-facing errors from
//! both passes flow through the shared [`wispc_util::Handler`]; invariant
//! violations the earlier passes are supposed to rule out (a symbol missing
//! from the node→type map, a `magic` expression that reached type analysis)
//! are reported separately as [`InternalError`], since they mean the
//! compiler itself is broken rather than the input program.

pub mod resolve;
pub mod symtab;
pub mod typeck;
pub mod types;

pub use resolve::{ResolveResult, Resolutions};
pub use symtab::{SemSymbol, SymbolArena, SymbolKind, SymbolTable};
pub use typeck::{NodeTypes, TypeckResult};
pub use types::{BasicKind, Type, TypeCtx, TypeKind};

use wispc_par::ast::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("node {0} has no entry in the node->type map")]
    MissingNodeType(NodeId),
    #[error("magic expression (node {0}) reached type analysis")]
    MagicInTypeAnalysis(NodeId),
}
