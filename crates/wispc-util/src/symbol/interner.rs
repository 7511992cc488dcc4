//! Backing string table for [`super::Symbol`].
//!
//! The compiler runs as a single synchronous pass over one source file, so
//! the table needs no locking: a thread-local `RefCell` is enough. Keyword
//! and reserved-identifier spellings are inserted first, at the indices the
//! constants in `mod.rs` hard-code, so looking up a keyword is a normal map
//! hit rather than a special case.

use super::{Symbol, KEYWORDS};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

pub struct StringTable {
    index: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl StringTable {
    fn new() -> Self {
        let mut table = Self {
            index: FxHashMap::default(),
            strings: Vec::new(),
        };
        table.initialize_known_symbols();
        table
    }

    fn initialize_known_symbols(&mut self) {
        for (spelling, sym) in KEYWORDS {
            let idx = self.insert_new(spelling);
            debug_assert_eq!(idx, sym.as_u32());
        }
    }

    fn insert_new(&mut self, string: &str) -> u32 {
        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());
        let idx = self.strings.len() as u32;
        self.strings.push(interned);
        self.index.insert(interned, idx);
        idx
    }

    pub fn intern(&mut self, string: &str) -> Symbol {
        if let Some(&idx) = self.index.get(string) {
            return unsafe { Symbol::from_u32_unchecked(idx) };
        }
        let idx = self.insert_new(string);
        unsafe { Symbol::from_u32_unchecked(idx) }
    }

    pub fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.strings.get(symbol.as_u32() as usize).copied()
    }
}

thread_local! {
    pub(super) static STRING_TABLE: RefCell<StringTable> = RefCell::new(StringTable::new());
}
