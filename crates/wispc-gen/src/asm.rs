//! Quad-by-quad AT&T-syntax x86-64 text emitter (spec.md §4.4).
//!
//! No instruction selection, no register allocation: every quad lowers to a
//! fixed load/operate/store sequence through `%rax`/`%rbx`, and every
//! operand's address comes straight out of a [`wispc_lir::FrameLayout`]
//! computed once per procedure. This mirrors the original `x64_codegen.cpp`
//! with three corrections documented in `DESIGN.md`: System V argument
//! register order (`rdi,rsi,rdx,rcx,r8,r9` rather than the original's
//! `rdi,rsi,rbx,rcx,rdx`), a real two-operand `orq %rbx, %rax` in place of
//! the original's self-operand `orq %rax, %rax`, and `cmpb` (rather than a
//! width-mismatched `cmpq`) for 8-bit comparisons.

use std::fmt::Write as _;

use wispc_lir::calling_convention::{arg_reg, needs_alignment_pad, stack_arg_offset, ARG_REGS};
use wispc_lir::{FrameLayout, Location};
use wispc_tac::{
    AuxId, BinOp, IRProgram, LitValue, Operand, Procedure, Quad, QuadKind, RuntimeType, UnOp,
    Width,
};
use wispc_util::Symbol;

use crate::error::{EmitError, Result};

/// Emits a full program as AT&T-syntax assembly text: a `.data` section for
/// globals and string literals, then a `.text` section with one label per
/// procedure.
pub fn emit_program(program: &IRProgram) -> Result<String> {
    let mut out = String::new();
    emit_data_section(program, &mut out);

    let _ = writeln!(out, ".text");
    for proc in &program.procedures {
        let layout = FrameLayout::build(proc);
        let mut emitter = Emitter { out: String::new(), layout, globals: &program.globals };
        emitter.emit_procedure(proc)?;
        out.push_str(&emitter.out);
    }
    Ok(out)
}

fn emit_data_section(program: &IRProgram, out: &mut String) {
    let _ = writeln!(out, ".data");

    let mut globals: Vec<&Symbol> = program.globals.keys().collect();
    globals.sort_by_key(|s| s.as_str());
    for sym in globals {
        let _ = writeln!(out, "gbl_{}: .quad 0", sym.as_str());
    }

    for (label, text) in &program.string_literals {
        let _ = writeln!(out, "lbl_{}: .asciz \"{}\"", label.0, escape_asciz(text.as_str()));
    }

    let _ = writeln!(out, ".align 8");
}

/// Re-escapes a fully-decoded string (the lexer stores real `\n` etc. bytes)
/// back into `.asciz` source form.
fn escape_asciz(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn proc_label(name: Symbol) -> String {
    if name.eq_str("main") {
        "main".to_string()
    } else {
        format!("fun_{}", name.as_str())
    }
}

/// Maps a 64-bit register name to the 8-bit register holding its low byte.
fn low_byte(reg: &str) -> &'static str {
    match reg {
        "rax" => "al",
        "rbx" => "bl",
        "rcx" => "cl",
        "rdx" => "dl",
        "rdi" => "dil",
        "rsi" => "sil",
        "r8" => "r8b",
        "r9" => "r9b",
        _ => unreachable!("no argument or scratch register named {reg}"),
    }
}

struct Emitter<'a> {
    out: String,
    layout: FrameLayout,
    globals: &'a rustc_hash::FxHashMap<Symbol, wispc_tac::SymOpd>,
}

impl<'a> Emitter<'a> {
    fn emit_procedure(&mut self, proc: &Procedure) -> Result<()> {
        let label = proc_label(proc.name);
        let _ = writeln!(self.out, ".globl {label}");
        let _ = writeln!(self.out, "{label}:");

        let mut pending_args: Vec<(usize, Operand)> = Vec::new();
        let mut arg_count = 0usize;

        for quad in &proc.body {
            for l in &quad.labels {
                let _ = writeln!(self.out, "lbl_{}:", l.0);
            }
            self.emit_quad(quad, &mut pending_args, &mut arg_count)?;
        }
        Ok(())
    }

    fn sym_location(&self, sym: Symbol) -> Result<Location> {
        self.layout
            .locate(sym, self.globals.contains_key(&sym))
            .ok_or(EmitError::MissingLocal(sym))
    }

    fn mem_text(&self, loc: Location, sym: Symbol) -> String {
        match loc {
            Location::Global => format!("gbl_{}(%rip)", sym.as_str()),
            Location::Stack(off) => format!("{off}(%rbp)"),
        }
    }

    fn aux_mem(&self, id: AuxId) -> Result<String> {
        let off = self.layout.aux(id).ok_or(EmitError::MissingAux(id))?;
        Ok(format!("{off}(%rbp)"))
    }

    /// Loads `op`'s value into the full 64-bit register `reg`, zero-extending
    /// 8-bit operands.
    fn load(&mut self, op: &Operand, reg: &str) -> Result<()> {
        match op {
            Operand::Sym(s) => {
                let loc = self.sym_location(s.symbol)?;
                let mem = self.mem_text(loc, s.symbol);
                self.load_mem(&mem, s.width, reg);
            }
            Operand::Aux(a) => {
                let mem = self.aux_mem(a.id)?;
                self.load_mem(&mem, a.width, reg);
            }
            Operand::Lit(l) => match &l.value {
                LitValue::Int(n) => {
                    let _ = writeln!(self.out, "    movq ${n}, %{reg}");
                }
                LitValue::Str(_) => {
                    let label = l.label.ok_or_else(|| {
                        EmitError::UnresolvedSymbol(Symbol::intern("<string literal without a .data label>"))
                    })?;
                    let _ = writeln!(self.out, "    leaq lbl_{}(%rip), %{reg}", label.0);
                }
            },
            Operand::Addr(_) => return Err(EmitError::AddressOperand),
        }
        Ok(())
    }

    fn load_mem(&mut self, mem: &str, width: Width, reg: &str) {
        match width {
            Width::W64 => {
                let _ = writeln!(self.out, "    movq {mem}, %{reg}");
            }
            Width::W8 => {
                let _ = writeln!(self.out, "    movzbq {mem}, %{reg}");
            }
        }
    }

    /// Stores the value currently held in `reg` into `dst`'s memory slot,
    /// narrowing to the low byte for 8-bit destinations.
    fn store(&mut self, dst: &Operand, reg: &str) -> Result<()> {
        match dst {
            Operand::Sym(s) => {
                let loc = self.sym_location(s.symbol)?;
                let mem = self.mem_text(loc, s.symbol);
                self.store_mem(&mem, s.width, reg);
                Ok(())
            }
            Operand::Aux(a) => {
                let mem = self.aux_mem(a.id)?;
                self.store_mem(&mem, a.width, reg);
                Ok(())
            }
            Operand::Lit(_) => unreachable!("lowering never assigns into a literal"),
            Operand::Addr(_) => Err(EmitError::AddressOperand),
        }
    }

    fn store_mem(&mut self, mem: &str, width: Width, reg: &str) {
        match width {
            Width::W64 => {
                let _ = writeln!(self.out, "    movq %{reg}, {mem}");
            }
            Width::W8 => {
                let _ = writeln!(self.out, "    movb %{}, {mem}", low_byte(reg));
            }
        }
    }

    fn emit_quad(
        &mut self,
        quad: &Quad,
        pending_args: &mut Vec<(usize, Operand)>,
        arg_count: &mut usize,
    ) -> Result<()> {
        match &quad.kind {
            QuadKind::BinOp { op, src1, src2, dst, width: _ } => {
                self.emit_binop(*op, src1, src2, dst)
            }
            QuadKind::UnaryOp { op, src, dst, width: _ } => self.emit_unaryop(*op, src, dst),
            QuadKind::Assign { src, dst } => {
                self.load(src, "rax")?;
                self.store(dst, "rax")
            }
            QuadKind::Read { dst, ty } => self.emit_read(dst, *ty),
            QuadKind::Write { src, ty } => self.emit_write(src, *ty),
            QuadKind::Goto { target } => {
                let _ = writeln!(self.out, "    jmp lbl_{}", target.0);
                Ok(())
            }
            QuadKind::Ifz { cond, target } => {
                self.load(cond, "rdi")?;
                let _ = writeln!(self.out, "    cmpq $0, %rdi");
                let _ = writeln!(self.out, "    je lbl_{}", target.0);
                Ok(())
            }
            QuadKind::Call { symbol } => self.emit_call(*symbol, pending_args, arg_count),
            QuadKind::SetArg { index, operand } => {
                let idx0 = (*index as usize) - 1;
                *arg_count = idx0 + 1;
                match arg_reg(idx0) {
                    Some(reg) => self.load(operand, reg),
                    None => {
                        pending_args.push((idx0, operand.clone()));
                        Ok(())
                    }
                }
            }
            QuadKind::GetArg { index, operand, procedure: _ } => {
                let idx0 = (*index as usize) - 1;
                match arg_reg(idx0) {
                    Some(reg) => self.store(operand, reg),
                    None => {
                        let mem = format!("{}(%rbp)", stack_arg_offset(idx0));
                        self.load_mem(&mem, Width::W64, "rax");
                        self.store(operand, "rax")
                    }
                }
            }
            QuadKind::SetRet { operand } => self.load(operand, wispc_lir::calling_convention::RET_REG),
            QuadKind::GetRet { operand } => self.store(operand, wispc_lir::calling_convention::RET_REG),
            QuadKind::Enter { procedure: _ } => {
                let _ = writeln!(self.out, "    pushq %rbp");
                let _ = writeln!(self.out, "    movq %rsp, %rbp");
                let _ = writeln!(self.out, "    addq $16, %rbp");
                if self.layout.frame_size > 0 {
                    let _ = writeln!(self.out, "    subq ${}, %rsp", self.layout.frame_size);
                }
                Ok(())
            }
            QuadKind::Leave { procedure: _ } => {
                if self.layout.frame_size > 0 {
                    let _ = writeln!(self.out, "    addq ${}, %rsp", self.layout.frame_size);
                }
                let _ = writeln!(self.out, "    popq %rbp");
                let _ = writeln!(self.out, "    retq");
                Ok(())
            }
            QuadKind::Exit => {
                let _ = writeln!(self.out, "    callq exit");
                Ok(())
            }
            QuadKind::Magic => Err(EmitError::MagicReachedEmission),
            QuadKind::Nop => Ok(()),
        }
    }

    fn emit_binop(
        &mut self,
        op: BinOp,
        src1: &Operand,
        src2: &Operand,
        dst: &Operand,
    ) -> Result<()> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mult | BinOp::Div => {
                self.load(src1, "rax")?;
                self.load(src2, "rbx")?;
                match op {
                    BinOp::Add => {
                        let _ = writeln!(self.out, "    addq %rbx, %rax");
                    }
                    BinOp::Sub => {
                        let _ = writeln!(self.out, "    subq %rbx, %rax");
                    }
                    BinOp::Mult => {
                        let _ = writeln!(self.out, "    imulq %rbx, %rax");
                    }
                    BinOp::Div => {
                        let _ = writeln!(self.out, "    cqto");
                        let _ = writeln!(self.out, "    idivq %rbx");
                    }
                    _ => unreachable!(),
                }
                self.store(dst, "rax")
            }
            BinOp::And | BinOp::Or => {
                let bool_width = src1.width();
                self.load(src1, "rax")?;
                self.load(src2, "rbx")?;
                match (op, bool_width) {
                    (BinOp::And, Width::W64) => {
                        let _ = writeln!(self.out, "    andq %rbx, %rax");
                    }
                    (BinOp::And, Width::W8) => {
                        let _ = writeln!(self.out, "    andb %bl, %al");
                    }
                    (BinOp::Or, Width::W64) => {
                        let _ = writeln!(self.out, "    orq %rbx, %rax");
                    }
                    (BinOp::Or, Width::W8) => {
                        let _ = writeln!(self.out, "    orb %bl, %al");
                    }
                    _ => unreachable!(),
                }
                self.store(dst, "rax")
            }
            BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte => {
                let cmp_width = src1.width();
                self.load(src1, "rax")?;
                self.load(src2, "rbx")?;
                match cmp_width {
                    Width::W64 => {
                        let _ = writeln!(self.out, "    cmpq %rbx, %rax");
                    }
                    Width::W8 => {
                        let _ = writeln!(self.out, "    cmpb %bl, %al");
                    }
                }
                let setcc = match op {
                    BinOp::Eq => "sete",
                    BinOp::Neq => "setne",
                    BinOp::Lt => "setl",
                    BinOp::Lte => "setle",
                    BinOp::Gt => "setg",
                    BinOp::Gte => "setge",
                    _ => unreachable!(),
                };
                let _ = writeln!(self.out, "    {setcc} %al");
                self.store(dst, "rax")
            }
        }
    }

    fn emit_unaryop(&mut self, op: UnOp, src: &Operand, dst: &Operand) -> Result<()> {
        match op {
            UnOp::Neg => {
                self.load(src, "rax")?;
                let _ = writeln!(self.out, "    negq %rax");
                self.store(dst, "rax")
            }
            UnOp::Not => {
                self.load(src, "rax")?;
                let _ = writeln!(self.out, "    cmpq $0, %rax");
                let _ = writeln!(self.out, "    setz %al");
                self.store(dst, "rax")
            }
        }
    }

    fn emit_read(&mut self, dst: &Operand, ty: RuntimeType) -> Result<()> {
        let callee = match ty {
            RuntimeType::Int => "getInt",
            RuntimeType::Bool => "getBool",
            RuntimeType::String => {
                unreachable!("take into a string-typed destination never survives type analysis")
            }
        };
        let _ = writeln!(self.out, "    callq {callee}");
        self.store(dst, "rax")
    }

    fn emit_write(&mut self, src: &Operand, ty: RuntimeType) -> Result<()> {
        self.load(src, "rdi")?;
        let callee = match ty {
            RuntimeType::Int => "printInt",
            RuntimeType::Bool => "printBool",
            RuntimeType::String => "printString",
        };
        let _ = writeln!(self.out, "    callq {callee}");
        Ok(())
    }

    fn emit_call(
        &mut self,
        symbol: Symbol,
        pending_args: &mut Vec<(usize, Operand)>,
        arg_count: &mut usize,
    ) -> Result<()> {
        let pad = needs_alignment_pad(*arg_count);
        if pad {
            let _ = writeln!(self.out, "    subq $8, %rsp");
        }

        let mut to_push = std::mem::take(pending_args);
        to_push.sort_by_key(|(idx, _)| *idx);
        for (_, operand) in to_push.into_iter().rev() {
            self.load(&operand, "rax")?;
            let _ = writeln!(self.out, "    pushq %rax");
        }

        let spilled = arg_count.saturating_sub(ARG_REGS.len());
        let label = proc_label(symbol);
        let _ = writeln!(self.out, "    callq {label}");

        let pushed_bytes = 8 * (spilled + usize::from(pad));
        if pushed_bytes > 0 {
            let _ = writeln!(self.out, "    addq ${pushed_bytes}, %rsp");
        }

        *arg_count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;
    use wispc_tac::{AuxOpd, Label, LitOpd, SymOpd};

    fn proc(name: &str, body: Vec<Quad>) -> Procedure {
        Procedure {
            name: Symbol::intern(name),
            formals: Vec::new(),
            locals: Vec::new(),
            aux: Vec::new(),
            body,
            epilogue_label: Label(0),
        }
    }

    fn q(kind: QuadKind) -> Quad {
        Quad { labels: Vec::new(), kind }
    }

    #[test]
    fn main_procedure_gets_bare_label() {
        let program = IRProgram {
            procedures: vec![proc(
                "main",
                vec![
                    q(QuadKind::Enter { procedure: Symbol::intern("main") }),
                    q(QuadKind::Leave { procedure: Symbol::intern("main") }),
                ],
            )],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let asm = emit_program(&program).expect("emission succeeds");
        assert!(asm.contains(".globl main\nmain:\n"));
        assert!(!asm.contains("fun_main"));
    }

    #[test]
    fn non_main_procedure_gets_fun_prefix() {
        let program = IRProgram {
            procedures: vec![proc(
                "helper",
                vec![
                    q(QuadKind::Enter { procedure: Symbol::intern("helper") }),
                    q(QuadKind::Leave { procedure: Symbol::intern("helper") }),
                ],
            )],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let asm = emit_program(&program).expect("emission succeeds");
        assert!(asm.contains(".globl fun_helper\nfun_helper:\n"));
    }

    #[test]
    fn prologue_adjusts_rbp_by_sixteen() {
        let program = IRProgram {
            procedures: vec![proc(
                "f",
                vec![
                    q(QuadKind::Enter { procedure: Symbol::intern("f") }),
                    q(QuadKind::Leave { procedure: Symbol::intern("f") }),
                ],
            )],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let asm = emit_program(&program).expect("emission succeeds");
        assert!(asm.contains("addq $16, %rbp"));
    }

    #[test]
    fn eight_bit_comparison_uses_cmpb_not_cmpq() {
        let dst = Operand::Aux(AuxOpd { id: AuxId(0), width: Width::W8 });
        let src1 = Operand::Sym(SymOpd { symbol: Symbol::intern("a"), width: Width::W8 });
        let src2 = Operand::Sym(SymOpd { symbol: Symbol::intern("b"), width: Width::W8 });
        let program = IRProgram {
            procedures: vec![proc(
                "f",
                vec![
                    q(QuadKind::Enter { procedure: Symbol::intern("f") }),
                    q(QuadKind::BinOp { op: BinOp::Eq, src1, src2, dst, width: Width::W8 }),
                    q(QuadKind::Leave { procedure: Symbol::intern("f") }),
                ],
            )],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let asm = emit_program(&program).expect("emission succeeds");
        assert!(asm.contains("cmpb %bl, %al"));
        assert!(!asm.contains("cmpq"));
    }

    #[test]
    fn or_uses_two_distinct_operands() {
        let dst = Operand::Aux(AuxOpd { id: AuxId(0), width: Width::W8 });
        let src1 = Operand::Sym(SymOpd { symbol: Symbol::intern("a"), width: Width::W8 });
        let src2 = Operand::Sym(SymOpd { symbol: Symbol::intern("b"), width: Width::W8 });
        let program = IRProgram {
            procedures: vec![proc(
                "f",
                vec![
                    q(QuadKind::Enter { procedure: Symbol::intern("f") }),
                    q(QuadKind::BinOp { op: BinOp::Or, src1, src2, dst, width: Width::W8 }),
                    q(QuadKind::Leave { procedure: Symbol::intern("f") }),
                ],
            )],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let asm = emit_program(&program).expect("emission succeeds");
        assert!(asm.contains("orb %bl, %al"));
        assert!(!asm.contains("orq"));
    }

    #[test]
    fn and_is_width_eight_for_bool_operands() {
        let dst = Operand::Aux(AuxOpd { id: AuxId(0), width: Width::W8 });
        let src1 = Operand::Sym(SymOpd { symbol: Symbol::intern("a"), width: Width::W8 });
        let src2 = Operand::Sym(SymOpd { symbol: Symbol::intern("b"), width: Width::W8 });
        let program = IRProgram {
            procedures: vec![proc(
                "f",
                vec![
                    q(QuadKind::Enter { procedure: Symbol::intern("f") }),
                    q(QuadKind::BinOp { op: BinOp::And, src1, src2, dst, width: Width::W8 }),
                    q(QuadKind::Leave { procedure: Symbol::intern("f") }),
                ],
            )],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let asm = emit_program(&program).expect("emission succeeds");
        assert!(asm.contains("andb %bl, %al"));
        assert!(!asm.contains("andq"));
    }

    #[test]
    fn seventh_argument_triggers_alignment_pad_and_cleanup() {
        let program = IRProgram {
            procedures: vec![proc("f", Vec::new())],
            globals: FxHashMap::default(),
            string_literals: Vec::new(),
        };
        let mut emitter = Emitter {
            out: String::new(),
            layout: FrameLayout::build(&program.procedures[0]),
            globals: &program.globals,
        };
        let mut pending = vec![(6usize, Operand::Lit(LitOpd {
            value: LitValue::Int(1),
            width: Width::W64,
            label: None,
        }))];
        let mut count = 7usize;
        emitter.emit_call(Symbol::intern("g"), &mut pending, &mut count).expect("emits");
        assert!(emitter.out.contains("subq $8, %rsp"));
        assert!(emitter.out.contains("pushq %rax"));
        assert!(emitter.out.contains("callq fun_g"));
        assert!(emitter.out.contains("addq $16, %rsp"));
        assert_eq!(count, 0);
    }

    #[test]
    fn string_literal_escapes_round_trip() {
        assert_eq!(escape_asciz("hi\n\t\"\\"), "hi\\n\\t\\\"\\\\");
    }
}
