//! The compiler driver: CLI parsing plus the phase-by-phase pipeline that
//! wires `wispc-lex` through `wispc-gen` together (spec.md §6).
//!
//! Every mode reads exactly one source file and stops at a fixed point in
//! the pipeline: `-t` after lexing, `-p`/`-n` after parsing (optionally
//! preceded by name analysis), `-c` after type analysis, `-a` after TAC
//! lowering, `-o` after x86-64 emission. A pass that reports any diagnostic
//! halts the pipeline before the next one runs (spec.md §5); diagnostics
//! are printed to stderr in source order, and the process exits non-zero.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};

use wispc_sem::{resolve, typeck, TypeCtx};
use wispc_util::{Handler, SourceMap};

/// `wispc`'s command line: exactly one of the six modes, each paired with
/// the source file it runs against.
#[derive(Debug, Parser)]
#[command(
    name = "wispc",
    about = "Compiler for the source language described in spec.md",
    group(ArgGroup::new("mode").required(true).args(["tokens", "unparse", "unparse_named", "check", "tac", "asm"]))
)]
pub struct Cli {
    /// `-t`: emit the token stream.
    #[arg(short = 't', value_name = "PATH")]
    pub tokens: Option<PathBuf>,

    /// `-p`: unparse (pretty-print the program without type annotations).
    #[arg(short = 'p', value_name = "PATH")]
    pub unparse: Option<PathBuf>,

    /// `-n`: run name analysis, then unparse with each bound identifier
    /// annotated with its resolved type.
    #[arg(short = 'n', value_name = "PATH")]
    pub unparse_named: Option<PathBuf>,

    /// `-c`: run name and type analysis; no output beyond diagnostics.
    #[arg(short = 'c', value_name = "PATH")]
    pub check: Option<PathBuf>,

    /// `-a`: emit three-address code.
    #[arg(short = 'a', value_name = "PATH")]
    pub tac: Option<PathBuf>,

    /// `-o`: emit x86-64 assembly.
    #[arg(short = 'o', value_name = "PATH")]
    pub asm: Option<PathBuf>,

    /// Raises the log level (composes with any of the six modes above;
    /// never changes stdout/stderr content, only `tracing` output on top
    /// of it). Repeat for more detail: `-v` is debug, `-vv` is trace.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    fn mode_and_path(&self) -> (Mode, &Path) {
        if let Some(p) = &self.tokens {
            (Mode::Tokens, p)
        } else if let Some(p) = &self.unparse {
            (Mode::Unparse, p)
        } else if let Some(p) = &self.unparse_named {
            (Mode::UnparseNamed, p)
        } else if let Some(p) = &self.check {
            (Mode::Check, p)
        } else if let Some(p) = &self.tac {
            (Mode::Tac, p)
        } else if let Some(p) = &self.asm {
            (Mode::Asm, p)
        } else {
            unreachable!("clap's ArgGroup requires exactly one of the six mode flags")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Tokens,
    Unparse,
    UnparseNamed,
    Check,
    Tac,
    Asm,
}

/// Runs the driver end to end and returns the process exit code: `0` on
/// success, `1` on any reported diagnostic, `2` on an internal-invariant
/// failure (spec.md §7, kind 4).
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let (mode, path) = cli.mode_and_path();
    let source = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;

    let mut sources = SourceMap::new();
    let file_id = sources.add_file(path.display().to_string(), source.clone());
    let handler = Handler::new();

    tracing::debug!(path = %path.display(), mode = ?mode, "starting compilation");

    let tokens = wispc_lex::tokenize(&source, file_id, &handler);
    tracing::trace!(count = tokens.len(), "lexing done");
    if mode == Mode::Tokens {
        print!("{}", render_tokens(&tokens));
        return Ok(report_diagnostics(&handler, &sources));
    }

    let program = match wispc_par::parse(&tokens, &handler) {
        Some(p) => p,
        None => return Ok(report_diagnostics(&handler, &sources)),
    };
    tracing::trace!(decls = program.decls.len(), "parsing done");

    if mode == Mode::Unparse {
        print!("{}", wispc_par::Unparser::plain().unparse_program(&program));
        return Ok(report_diagnostics(&handler, &sources));
    }

    let mut types = TypeCtx::new();
    let names = resolve::analyze(&program, &mut types, &handler);
    tracing::trace!(ok = names.ok, "name analysis done");

    if mode == Mode::UnparseNamed {
        if names.ok && !handler.has_errors() {
            let annotate = |id: wispc_par::ast::NodeId| {
                names.resolutions.get(&id).map(|def| types.display(names.symbols[*def].ty))
            };
            let text = wispc_par::Unparser::annotated(&annotate).unparse_program(&program);
            print!("{text}");
        }
        return Ok(report_diagnostics(&handler, &sources));
    }

    if !names.ok || handler.has_errors() {
        // Name analysis failed: the pipeline halts here (spec.md §5),
        // before type analysis ever runs.
        return Ok(report_diagnostics(&handler, &sources));
    }

    let checked = typeck::analyze(&program, &names.resolutions, &names.symbols, &mut types, &handler);
    tracing::trace!(ok = checked.ok, "type analysis done");

    if let Some(internal) = &checked.internal_error {
        eprintln!("internal error: {internal}");
        return Ok(2);
    }

    if mode == Mode::Check {
        return Ok(report_diagnostics(&handler, &sources));
    }

    if !checked.ok || handler.has_errors() {
        return Ok(report_diagnostics(&handler, &sources));
    }

    let ir = wispc_tac::lower(&program, &names.resolutions, &names.symbols, &checked.node_types, &types);
    tracing::trace!(procedures = ir.procedures.len(), "TAC lowering done");

    if mode == Mode::Tac {
        print!("{}", wispc_tac::render(&ir));
        return Ok(report_diagnostics(&handler, &sources));
    }

    debug_assert_eq!(mode, Mode::Asm);
    match wispc_gen::emit_program(&ir) {
        Ok(asm) => {
            tracing::trace!("x86-64 emission done");
            print!("{asm}");
            Ok(report_diagnostics(&handler, &sources))
        }
        Err(e) => {
            eprintln!("internal error: {e}");
            Ok(2)
        }
    }
}

/// Prints every collected diagnostic to stderr, one per line in the order
/// they were reported (source order, per spec.md §5's ordering guarantee),
/// and returns the process exit code.
fn report_diagnostics(handler: &Handler, sources: &SourceMap) -> i32 {
    let diagnostics = handler.diagnostics();
    for diag in &diagnostics {
        eprintln!("{}", sources.format_fatal(diag.span, &diag.message));
    }
    if handler.has_errors() {
        1
    } else {
        0
    }
}

fn render_tokens(tokens: &[wispc_lex::SpannedToken]) -> String {
    let mut out = String::new();
    for t in tokens {
        let _ = writeln!(out, "[{},{}] {:?}", t.span.line, t.span.column, t.token);
    }
    out
}

/// Convenience for tests: parse an argv-style slice (excluding the program
/// name) instead of reading `std::env::args()`.
pub fn run_args<I, T>(args: I) -> anyhow::Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(std::iter::once("wispc".into()).chain(args.into_iter().map(Into::into)))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    run(&cli)
}

