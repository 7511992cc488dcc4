//! Activation-record layout: assigns every operand a concrete memory
//! location before x86-64 emission touches it.
//!
//! Grounded on the original implementation's `allocLocals`: one contiguous
//! descending counter starting at `-24(%rbp)` is threaded first through
//! locals (declaration order), then auxiliary temporaries (allocation
//! order), then formals (declaration order). There is no register
//! allocator and no spilling — every operand gets a fixed stack slot, a
//! quadword each regardless of its logical width, matching the type
//! system's "8 bytes each by current convention" (spec.md §3).

use rustc_hash::FxHashMap;

use wispc_tac::{AuxId, Procedure, Width};
use wispc_util::Symbol;

const FIRST_SLOT_OFFSET: i32 = 24;
const SLOT_SIZE: i32 = 8;

/// Where a single operand lives once a procedure's frame has been laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// `offset(%rbp)`, `offset` already negative for locals/temps/formals.
    Stack(i32),
    /// A `.data` label, for globals.
    Global,
}

/// Per-procedure slot assignment plus the frame size to `sub`/`add` in the
/// prologue/epilogue.
pub struct FrameLayout {
    locals: FxHashMap<Symbol, i32>,
    formals: FxHashMap<Symbol, i32>,
    aux: FxHashMap<AuxId, i32>,
    pub frame_size: u32,
}

impl FrameLayout {
    pub fn build(proc: &Procedure) -> Self {
        let mut counter = FIRST_SLOT_OFFSET;
        let mut locals = FxHashMap::default();
        let mut formals = FxHashMap::default();
        let mut aux = FxHashMap::default();

        for local in &proc.locals {
            locals.insert(local.symbol, -counter);
            counter += SLOT_SIZE;
        }
        for temp in &proc.aux {
            aux.insert(temp.id, -counter);
            counter += SLOT_SIZE;
        }
        for formal in &proc.formals {
            formals.insert(formal.symbol, -counter);
            counter += SLOT_SIZE;
        }

        // The last slot assigned sits at `-(counter - SLOT_SIZE)`; round
        // the frame up to a 16-byte multiple so a call from inside this
        // body can rely on the usual alignment invariant without every
        // call site having to special-case its caller's frame size.
        let used = (counter - FIRST_SLOT_OFFSET).max(0) as u32;
        let frame_size = (used + 15) & !15;

        FrameLayout { locals, formals, aux, frame_size }
    }

    pub fn local(&self, sym: Symbol) -> Option<i32> {
        self.locals.get(&sym).or_else(|| self.formals.get(&sym)).copied()
    }

    pub fn aux(&self, id: AuxId) -> Option<i32> {
        self.aux.get(&id).copied()
    }

    /// Resolves a named operand to its location. `is_global` is the
    /// caller's lookup into `IRProgram::globals` — this crate has no
    /// dependency on `wispc-tac`'s program-level types, only its operand
    /// model, so it can't do that lookup itself. `None` means `sym` has no
    /// stack slot in this frame, which the caller maps to an internal error.
    pub fn locate(&self, sym: Symbol, is_global: bool) -> Option<Location> {
        if is_global {
            Some(Location::Global)
        } else {
            self.local(sym).map(Location::Stack)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wispc_tac::{Label, SymOpd};

    fn sym_opd(name: &str, width: Width) -> SymOpd {
        SymOpd { symbol: Symbol::intern(name), width }
    }

    #[test]
    fn locals_then_aux_then_formals_descend_from_24() {
        let proc = Procedure {
            name: Symbol::intern("f"),
            formals: vec![sym_opd("a", Width::W64)],
            locals: vec![sym_opd("x", Width::W64), sym_opd("y", Width::W8)],
            aux: vec![wispc_tac::AuxOpd { id: AuxId(0), width: Width::W64 }],
            body: Vec::new(),
            epilogue_label: Label(0),
        };
        let layout = FrameLayout::build(&proc);
        assert_eq!(layout.local(Symbol::intern("x")), Some(-24));
        assert_eq!(layout.local(Symbol::intern("y")), Some(-32));
        assert_eq!(layout.aux(AuxId(0)), Some(-40));
        assert_eq!(layout.local(Symbol::intern("a")), Some(-48));
        // 4 slots * 8 bytes = 32, already a 16-byte multiple.
        assert_eq!(layout.frame_size, 32);
    }

    #[test]
    fn missing_slot_is_none_not_a_panic() {
        let proc = Procedure {
            name: Symbol::intern("f"),
            formals: vec![],
            locals: vec![sym_opd("x", Width::W64)],
            aux: vec![],
            body: Vec::new(),
            epilogue_label: Label(0),
        };
        let layout = FrameLayout::build(&proc);
        assert_eq!(layout.local(Symbol::intern("nonexistent")), None);
        assert_eq!(layout.aux(AuxId(99)), None);
    }

    #[test]
    fn empty_frame_has_zero_size() {
        let proc = Procedure {
            name: Symbol::intern("f"),
            formals: vec![],
            locals: vec![],
            aux: vec![],
            body: Vec::new(),
            epilogue_label: Label(0),
        };
        assert_eq!(FrameLayout::build(&proc).frame_size, 0);
    }
}
