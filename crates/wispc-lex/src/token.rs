//! The token vocabulary produced by the scanner.

use wispc_util::Symbol;

/// One lexeme, already classified. Keyword spellings are distinguished by
/// comparing the interned [`Symbol`] against the fixed `KW_*` constants in
/// `wispc_util::symbol` rather than carrying one variant per keyword here;
/// `Token::Ident` is reused for both keywords and user identifiers and the
/// parser tells them apart with `Symbol::lookup_keyword`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Identifier or keyword; interned spelling.
    Ident(Symbol),
    /// Unsigned decimal integer literal, already parsed.
    IntLit(i64),
    /// Double-quoted string literal with escapes resolved, interned.
    StrLit(Symbol),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semi,

    // Operators
    Assign,     // =
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Bang,       // !
    Less,       // <
    LessEq,     // <=
    Greater,    // >
    GreaterEq,  // >=
    EqEq,       // ==
    NotEq,      // !=
    PlusPlus,   // ++
    MinusMinus, // --

    /// End of input.
    Eof,
}

impl Token {
    /// Short name used in parser diagnostics ("expected `;`, found ...").
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(sym) => format!("`{}`", sym.as_str()),
            Token::IntLit(v) => format!("integer literal `{v}`"),
            Token::StrLit(_) => "string literal".to_string(),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBrace => "`{`".to_string(),
            Token::RBrace => "`}`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Semi => "`;`".to_string(),
            Token::Assign => "`=`".to_string(),
            Token::Plus => "`+`".to_string(),
            Token::Minus => "`-`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::Slash => "`/`".to_string(),
            Token::Bang => "`!`".to_string(),
            Token::Less => "`<`".to_string(),
            Token::LessEq => "`<=`".to_string(),
            Token::Greater => "`>`".to_string(),
            Token::GreaterEq => "`>=`".to_string(),
            Token::EqEq => "`==`".to_string(),
            Token::NotEq => "`!=`".to_string(),
            Token::PlusPlus => "`++`".to_string(),
            Token::MinusMinus => "`--`".to_string(),
            Token::Eof => "end of file".to_string(),
        }
    }
}

/// A token together with the span it was scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: wispc_util::Span,
}
