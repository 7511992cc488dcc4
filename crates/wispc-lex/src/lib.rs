//! Lexical analysis: turns source text into a token stream.
//!
//! [`cursor::Cursor`] is the character-at-a-time traversal primitive;
//! [`lexer::tokenize`] drives it to produce [`token::SpannedToken`]s,
//! reporting malformed lexemes through a [`wispc_util::Handler`] instead of
//! failing the whole scan.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::tokenize;
pub use token::{SpannedToken, Token};
