//! Internal-invariant failures for x86-64 emission (spec.md §7, kind 4).
//!
//! Everything in here is unreachable on a program that passed name and
//! type analysis; each variant documents which upstream invariant would
//! have to be broken to reach it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("operand referencing undeclared symbol {0:?} reached emission")]
    UnresolvedSymbol(wispc_util::Symbol),

    #[error("address operand reached emission: the surface grammar never produces one")]
    AddressOperand,

    #[error("a magic expression reached emission: type analysis never succeeds with one present")]
    MagicReachedEmission,

    #[error("symbol {0:?} has no stack slot in this procedure's frame: frame layout is built from the same procedure's own locals/formals")]
    MissingLocal(wispc_util::Symbol),

    #[error("auxiliary temporary {0:?} has no stack slot in this procedure's frame")]
    MissingAux(wispc_tac::AuxId),
}

pub type Result<T> = std::result::Result<T, EmitError>;
