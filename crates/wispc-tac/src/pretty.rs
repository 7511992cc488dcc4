//! Textual rendering of [`IRProgram`] for the driver's `-a` (emit TAC) mode.
//!
//! Not consumed by any later pass — x86-64 emission walks the quad structs
//! directly (spec.md §4.4) — this is purely a human-readable dump, one quad
//! per line, with each operand rendered close to the three-address-code
//! notation spec.md's examples use (`t0 := a + b`, `ifz t0 goto L3`).

use std::fmt::Write;

use wispc_util::Symbol;

use crate::ir::*;

pub fn render(program: &IRProgram) -> String {
    let mut out = String::new();

    let mut globals: Vec<&Symbol> = program.globals.keys().collect();
    globals.sort_by_key(|s| s.as_str());
    for sym in globals {
        let _ = writeln!(out, "global {}", sym.as_str());
    }
    for (label, text) in &program.string_literals {
        let _ = writeln!(out, "string L{} = {:?}", label.0, text.as_str());
    }
    if !program.globals.is_empty() || !program.string_literals.is_empty() {
        out.push('\n');
    }

    for proc in &program.procedures {
        render_procedure(proc, &mut out);
        out.push('\n');
    }

    out
}

fn render_procedure(proc: &Procedure, out: &mut String) {
    let formals: Vec<String> = proc.formals.iter().map(render_sym).collect();
    let _ = writeln!(out, "proc {}({}):", proc.name.as_str(), formals.join(", "));
    for quad in &proc.body {
        for label in &quad.labels {
            let _ = writeln!(out, "L{}:", label.0);
        }
        if let Some(line) = render_quad(quad) {
            let _ = writeln!(out, "    {line}");
        }
    }
}

fn render_sym(opd: &SymOpd) -> String {
    opd.symbol.as_str().to_string()
}

fn render_operand(opd: &Operand) -> String {
    match opd {
        Operand::Sym(s) => s.symbol.as_str().to_string(),
        Operand::Aux(a) => format!("t{}", a.id.0),
        Operand::Lit(l) => match &l.value {
            LitValue::Int(n) => n.to_string(),
            LitValue::Str(s) => format!("{:?}", s.as_str()),
        },
        Operand::Addr(a) => format!("&{}", render_operand(&a.base)),
    }
}

fn render_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mult => "*",
        BinOp::Div => "/",
        BinOp::Eq => "==",
        BinOp::Neq => "!=",
        BinOp::Lt => "<",
        BinOp::Lte => "<=",
        BinOp::Gt => ">",
        BinOp::Gte => ">=",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn render_runtime_type(ty: RuntimeType) -> &'static str {
    match ty {
        RuntimeType::Int => "int",
        RuntimeType::Bool => "bool",
        RuntimeType::String => "string",
    }
}

/// Renders one quad's body. `None` for quads that only exist to anchor a
/// label with no effect of their own ([`QuadKind::Nop`]).
fn render_quad(quad: &Quad) -> Option<String> {
    let text = match &quad.kind {
        QuadKind::BinOp { op, src1, src2, dst, .. } => {
            format!("{} := {} {} {}", render_operand(dst), render_operand(src1), render_binop(*op), render_operand(src2))
        }
        QuadKind::UnaryOp { op: UnOp::Neg, src, dst, .. } => {
            format!("{} := -{}", render_operand(dst), render_operand(src))
        }
        QuadKind::UnaryOp { op: UnOp::Not, src, dst, .. } => {
            format!("{} := not {}", render_operand(dst), render_operand(src))
        }
        QuadKind::Assign { src, dst } => format!("{} := {}", render_operand(dst), render_operand(src)),
        QuadKind::Read { dst, ty } => format!("{} := take({})", render_operand(dst), render_runtime_type(*ty)),
        QuadKind::Write { src, ty } => format!("give({}: {})", render_operand(src), render_runtime_type(*ty)),
        QuadKind::Goto { target } => format!("goto L{}", target.0),
        QuadKind::Ifz { cond, target } => format!("ifz {} goto L{}", render_operand(cond), target.0),
        QuadKind::Call { symbol } => format!("call {}", symbol.as_str()),
        QuadKind::SetArg { index, operand } => format!("setarg {index}, {}", render_operand(operand)),
        QuadKind::GetArg { index, operand, .. } => format!("{} := getarg {index}", render_operand(operand)),
        QuadKind::SetRet { operand } => format!("setret {}", render_operand(operand)),
        QuadKind::GetRet { operand } => format!("{} := getret", render_operand(operand)),
        QuadKind::Enter { procedure } => format!("enter {}", procedure.as_str()),
        QuadKind::Leave { procedure } => format!("leave {}", procedure.as_str()),
        QuadKind::Exit => "exit".to_string(),
        QuadKind::Magic => "magic".to_string(),
        QuadKind::Nop => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wispc_lex::tokenize;
    use wispc_par::parser::parse;
    use wispc_sem::{resolve, typeck, TypeCtx};
    use wispc_util::{FileId, Handler};

    fn render_src(src: &str) -> String {
        let handler = Handler::new();
        let tokens = tokenize(src, FileId::DUMMY, &handler);
        let program = parse(&tokens, &handler).expect("parses");
        let mut types = TypeCtx::new();
        let names = resolve::analyze(&program, &mut types, &handler);
        assert!(names.ok && !handler.has_errors());
        let checked = typeck::analyze(&program, &names.resolutions, &names.symbols, &mut types, &handler);
        assert!(checked.ok && !handler.has_errors());
        let ir = crate::lower(&program, &names.resolutions, &names.symbols, &checked.node_types, &types);
        render(&ir)
    }

    #[test]
    fn renders_global_assignment_and_write() {
        let text = render_src("x: int; main: () void { x = 3; give x; }");
        assert!(text.contains("global x"));
        assert!(text.contains("proc main():"));
        assert!(text.contains("x := 3"));
        assert!(text.contains("give(x: int)"));
    }

    #[test]
    fn renders_call_and_getret() {
        let text = render_src("f: () int { return 1; } main: () void { give f(); }");
        assert!(text.contains("call f"));
        assert!(text.contains(":= getret"));
    }

    #[test]
    fn renders_string_literal_table() {
        let text = render_src(r#"main: () void { give "hi"; }"#);
        assert!(text.contains("string L0 = \"hi\""));
    }
}
