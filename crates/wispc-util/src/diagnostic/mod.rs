//! Diagnostic reporting.
//!
//! Diagnostics collect during a pass and are rendered later through
//! `SourceMap::format_fatal` as a single `FATAL [...]: message` line
//! (spec.md §6) — there's no code/note/help/severity hierarchy to carry,
//! since every diagnostic this compiler reports halts compilation.
//!
//! # Examples
//!
//! ```
//! use wispc_util::diagnostic::{Handler, Span};
//!
//! let handler = Handler::new();
//! handler.build_error(Span::DUMMY, "unexpected token").emit(&handler);
//!
//! if handler.has_errors() {
//!     eprintln!("compilation failed");
//! }
//! ```

mod builder;

pub use builder::DiagnosticBuilder;

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity. Every diagnostic this compiler reports is fatal
/// (spec.md §6), so there is exactly one variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with its source location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self { level, message: message.into(), span }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }
}

/// Collects diagnostics reported over the lifetime of a compilation.
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self { diagnostics: RefCell::new(Vec::new()) }
    }

    fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Emit a pre-built diagnostic.
    pub fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        self.emit(diagnostic);
    }

    /// Start building an error diagnostic at `span`.
    pub fn build_error(&self, span: Span, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::error(message).span(span)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.level == Level::Error)
    }

    /// All diagnostics reported so far, in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
