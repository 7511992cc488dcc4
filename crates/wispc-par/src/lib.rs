//! Parses a token stream into an AST and can print it back out.
//!
//! [`ast`] is the tagged-variant tree; [`parser::parse`] builds one with a
//! straightforward recursive descent; [`unparse::Unparser`] renders it back
//! to source text, optionally annotating identifiers with a resolved type
//! supplied by a later pass.

pub mod ast;
pub mod parser;
pub mod unparse;

pub use ast::{Decl, FnDecl, FormalDecl, Program, VarDecl};
pub use parser::parse;
pub use unparse::Unparser;
