//! Definition arena and lexical scope stack for name analysis. Named
//! `SemSymbol`/`SymbolTable` rather than `Symbol`/`Table` to avoid clashing
//! with `wispc_util::Symbol`, the interned-string handle these definitions
//! are keyed by.

use rustc_hash::FxHashMap;

use wispc_util::index_vec::IndexVec;
use wispc_util::{DefId, Symbol};

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Var,
    Formal,
    Fn,
}

#[derive(Debug, Clone)]
pub struct SemSymbol {
    pub name: Symbol,
    pub ty: Type,
    pub kind: SymbolKind,
}

/// All definitions produced by name analysis, addressable by [`DefId`].
pub type SymbolArena = IndexVec<DefId, SemSymbol>;

/// A stack of lexical scopes, each mapping a name to the definition it's
/// currently bound to. Mirrors the original compiler's `SymbolTable`, which
/// pushed/popped a scope per block and function body.
pub struct SymbolTable {
    scopes: Vec<FxHashMap<Symbol, DefId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![FxHashMap::default()] }
    }

    pub fn enter(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn leave(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the global scope");
    }

    /// Binds `name` to `def` in the innermost scope. Returns `false` if
    /// `name` is already bound *in that same scope* (a redeclaration), in
    /// which case the caller should report it and skip the insert.
    pub fn insert(&mut self, name: Symbol, def: DefId) -> bool {
        let top = self.scopes.last_mut().expect("at least the global scope");
        if top.contains_key(&name) {
            return false;
        }
        top.insert(name, def);
        true
    }

    pub fn clashes(&self, name: Symbol) -> bool {
        self.scopes
            .last()
            .expect("at least the global scope")
            .contains_key(&name)
    }

    /// Resolves `name` searching from the innermost scope outward.
    pub fn find(&self, name: Symbol) -> Option<DefId> {
        for scope in self.scopes.iter().rev() {
            if let Some(def) = scope.get(&name) {
                return Some(*def);
            }
        }
        None
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut table = SymbolTable::new();
        let outer = DefId(0);
        let inner = DefId(1);
        let name = Symbol::intern("x");

        assert!(table.insert(name, outer));
        table.enter();
        assert!(table.insert(name, inner));
        assert_eq!(table.find(name), Some(inner));
        table.leave();
        assert_eq!(table.find(name), Some(outer));
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        let name = Symbol::intern("y");
        assert!(table.insert(name, DefId(0)));
        assert!(!table.insert(name, DefId(1)));
    }

    #[test]
    fn unbound_name_does_not_resolve() {
        let table = SymbolTable::new();
        assert_eq!(table.find(Symbol::intern("z")), None);
    }
}
