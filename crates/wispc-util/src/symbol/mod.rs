//! Interned identifiers.
//!
//! A [`Symbol`] is a 4-byte handle into a global string table, so comparing
//! two identifiers for equality is an integer comparison rather than a byte
//! scan. The scanner interns every identifier and string literal it reads;
//! keywords are pre-interned at fixed indices so the parser can match on
//! them without a string comparison.

mod interner;

use interner::STRING_TABLE;
use std::fmt;

/// An interned string.
///
/// `Symbol` is `Copy`, 4 bytes, and compares in O(1). Use [`Symbol::intern`]
/// to get one and [`Symbol::as_str`] to get the underlying string back.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    index: u32,
}

/// Number of keyword/reserved-identifier symbols pre-interned at a fixed
/// index. Anything below this index is a known symbol; everything at or
/// above it came from the source text.
const RESERVED_SYMBOLS_END: u32 = 19;

/// `int`
pub const KW_INT: Symbol = Symbol { index: 0 };
/// `bool`
pub const KW_BOOL: Symbol = Symbol { index: 1 };
/// `void`
pub const KW_VOID: Symbol = Symbol { index: 2 };
/// `string`
pub const KW_STRING: Symbol = Symbol { index: 3 };
/// `immutable`
pub const KW_IMMUTABLE: Symbol = Symbol { index: 4 };
/// `class` — reserved, rejected by every pass that sees it.
pub const KW_CLASS: Symbol = Symbol { index: 5 };
/// `if`
pub const KW_IF: Symbol = Symbol { index: 6 };
/// `else`
pub const KW_ELSE: Symbol = Symbol { index: 7 };
/// `while`
pub const KW_WHILE: Symbol = Symbol { index: 8 };
/// `return`
pub const KW_RETURN: Symbol = Symbol { index: 9 };
/// `take`
pub const KW_TAKE: Symbol = Symbol { index: 10 };
/// `give`
pub const KW_GIVE: Symbol = Symbol { index: 11 };
/// `exit`
pub const KW_EXIT: Symbol = Symbol { index: 12 };
/// `magic`
pub const KW_MAGIC: Symbol = Symbol { index: 13 };
/// `true`
pub const KW_TRUE: Symbol = Symbol { index: 14 };
/// `false`
pub const KW_FALSE: Symbol = Symbol { index: 15 };
/// `and`
pub const KW_AND: Symbol = Symbol { index: 16 };
/// `or`
pub const KW_OR: Symbol = Symbol { index: 17 };
/// `main`, the required entry-point function name.
pub const ID_MAIN: Symbol = Symbol { index: 18 };

/// All keywords, in the order their symbols are pre-interned. Used by the
/// lexer to build its identifier-or-keyword lookup.
pub const KEYWORDS: &[(&str, Symbol)] = &[
    ("int", KW_INT),
    ("bool", KW_BOOL),
    ("void", KW_VOID),
    ("string", KW_STRING),
    ("immutable", KW_IMMUTABLE),
    ("class", KW_CLASS),
    ("if", KW_IF),
    ("else", KW_ELSE),
    ("while", KW_WHILE),
    ("return", KW_RETURN),
    ("take", KW_TAKE),
    ("give", KW_GIVE),
    ("exit", KW_EXIT),
    ("magic", KW_MAGIC),
    ("true", KW_TRUE),
    ("false", KW_FALSE),
    ("and", KW_AND),
    ("or", KW_OR),
];

impl Symbol {
    /// Intern a string, returning its symbol. Interning the same string
    /// twice returns the same symbol.
    #[inline]
    pub fn intern(string: &str) -> Self {
        STRING_TABLE.with(|table| table.borrow_mut().intern(string))
    }

    /// The string this symbol was interned from.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        STRING_TABLE.with(|table| table.borrow().get(*self)).unwrap_or("")
    }

    /// Byte length of the underlying string.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// True if the underlying string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Compare against a `&str` without materializing a temporary `Symbol`.
    #[inline]
    pub fn eq_str(&self, other: &str) -> bool {
        self.as_str() == other
    }

    /// True if this symbol is one of the pre-interned keywords/identifiers
    /// above, rather than something interned from source text.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.index < RESERVED_SYMBOLS_END
    }

    /// Raw table index, for debugging or serialization.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.index
    }

    /// Build a symbol directly from a table index.
    ///
    /// # Safety
    ///
    /// `index` must refer to an entry already present in the string table
    /// (typically one previously returned by [`Symbol::as_u32`]).
    #[inline]
    pub unsafe fn from_u32_unchecked(index: u32) -> Self {
        Self { index }
    }

    /// Look up one of the fixed keyword symbols by its surface spelling,
    /// if `string` names one.
    pub fn lookup_keyword(string: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == string)
            .map(|(_, sym)| *sym)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
