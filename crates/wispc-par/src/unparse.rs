//! Pretty-printer. Used in two modes: plain (`-p`, no analysis has run) and
//! annotated (`-n`, after a successful name analysis each bound identifier
//! is suffixed with its resolved type). The annotation source is injected as
//! a closure so this crate never needs to depend on `wispc-sem`.

use std::fmt::Write;

use crate::ast::*;

/// Looks up the annotation text for a bound identifier occurrence, given its
/// [`NodeId`]. Returns `None` for unresolved or not-yet-analyzed nodes.
pub type Annotate<'a> = dyn Fn(NodeId) -> Option<String> + 'a;

pub struct Unparser<'a> {
    annotate: Option<&'a Annotate<'a>>,
    out: String,
    indent: usize,
}

impl<'a> Unparser<'a> {
    pub fn plain() -> Self {
        Self { annotate: None, out: String::new(), indent: 0 }
    }

    pub fn annotated(annotate: &'a Annotate<'a>) -> Self {
        Self { annotate: Some(annotate), out: String::new(), indent: 0 }
    }

    pub fn unparse_program(mut self, program: &Program) -> String {
        for decl in &program.decls {
            self.decl(decl);
            self.out.push('\n');
        }
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(v) => {
                let text = self.var_decl_text(v);
                self.line(&format!("{text};"));
            }
            Decl::Fn(f) => self.fn_decl(f),
        }
    }

    fn var_decl_text(&mut self, v: &VarDecl) -> String {
        let name = self.ident(&v.name);
        let ty = self.type_text(&v.ty);
        match &v.init {
            Some(init) => format!("{name} : {ty} = {}", self.expr(init)),
            None => format!("{name} : {ty}"),
        }
    }

    fn fn_decl(&mut self, f: &FnDecl) {
        let name = self.ident(&f.name);
        let formals: Vec<String> = f
            .formals
            .iter()
            .map(|formal| format!("{} : {}", self.ident(&formal.name), self.type_text(&formal.ty)))
            .collect();
        let ret = self.type_text(&f.ret_ty);
        self.line(&format!("{name} : ({}) {ret} {{", formals.join(", ")));
        self.indent += 1;
        for stmt in &f.body {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn type_text(&self, ty: &TypeNode) -> String {
        match &ty.kind {
            TypeKind::Int => "int".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::Immutable(inner) => format!("immutable {}", self.type_text(inner)),
        }
    }

    fn ident(&mut self, loc: &Loc) -> String {
        match self.annotate.and_then(|f| f(loc.id)) {
            Some(ty) => format!("{}{{{ty}}}", loc.name.as_str()),
            None => loc.name.as_str().to_string(),
        }
    }

    fn stmt(&mut self, stmt: &StmtNode) {
        match &stmt.kind {
            StmtKind::VarDecl(v) => {
                let text = self.var_decl_text(v);
                self.line(&format!("{text};"));
            }
            StmtKind::Assign { dst, src } => {
                let dst = self.ident(dst);
                let src = self.expr(src);
                self.line(&format!("{dst} = {src};"));
            }
            StmtKind::Take { dst } => {
                let dst = self.ident(dst);
                self.line(&format!("take {dst};"));
            }
            StmtKind::Give { src } => {
                let src = self.expr(src);
                self.line(&format!("give {src};"));
            }
            StmtKind::Exit => self.line("exit;"),
            StmtKind::PostInc(loc) => {
                let name = self.ident(loc);
                self.line(&format!("{name}++;"));
            }
            StmtKind::PostDec(loc) => {
                let name = self.ident(loc);
                self.line(&format!("{name}--;"));
            }
            StmtKind::If { cond, body } => {
                let cond = self.expr(cond);
                self.line(&format!("if ({cond}) {{"));
                self.indent += 1;
                for s in body {
                    self.stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            StmtKind::IfElse { cond, then_body, else_body } => {
                let cond = self.expr(cond);
                self.line(&format!("if ({cond}) {{"));
                self.indent += 1;
                for s in then_body {
                    self.stmt(s);
                }
                self.indent -= 1;
                self.line("} else {");
                self.indent += 1;
                for s in else_body {
                    self.stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            StmtKind::While { cond, body } => {
                let cond = self.expr(cond);
                self.line(&format!("while ({cond}) {{"));
                self.indent += 1;
                for s in body {
                    self.stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            StmtKind::Return { value } => match value {
                Some(e) => {
                    let e = self.expr(e);
                    self.line(&format!("return {e};"));
                }
                None => self.line("return;"),
            },
            StmtKind::Call(call) => {
                let text = self.call_text(call);
                self.line(&format!("{text};"));
            }
        }
    }

    fn call_text(&mut self, call: &CallExpr) -> String {
        let callee = self.ident(&call.callee);
        let args: Vec<String> = call.args.iter().map(|a| self.expr(a)).collect();
        format!("{callee}({})", args.join(", "))
    }

    fn expr(&mut self, expr: &ExprNode) -> String {
        match &expr.kind {
            ExprKind::IntLit(v) => v.to_string(),
            ExprKind::StrLit(sym) => format!("{:?}", sym.as_str()),
            ExprKind::True => "true".to_string(),
            ExprKind::False => "false".to_string(),
            ExprKind::Magic => "magic".to_string(),
            ExprKind::Id(loc) => self.ident(loc),
            ExprKind::Call(call) => self.call_text(call),
            ExprKind::Unary(op, operand) => {
                let sym = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                format!("{sym}{}", self.expr(operand))
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let lhs_text = self.expr(lhs);
                let rhs_text = self.expr(rhs);
                let mut out = String::new();
                let _ = write!(out, "({lhs_text} {} {rhs_text})", binop_text(*op));
                out
            }
        }
    }
}

fn binop_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Times => "*",
        BinaryOp::Divide => "/",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Equals => "==",
        BinaryOp::NotEquals => "!=",
        BinaryOp::Less => "<",
        BinaryOp::LessEq => "<=",
        BinaryOp::Greater => ">",
        BinaryOp::GreaterEq => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use wispc_lex::tokenize;
    use wispc_util::{FileId, Handler};

    fn program_for(src: &str) -> Program {
        let handler = Handler::new();
        let tokens = tokenize(src, FileId::DUMMY, &handler);
        parse(&tokens, &handler).expect("parses")
    }

    #[test]
    fn unparses_var_decl_plain() {
        let program = program_for("x: int = 1 + 2;");
        let text = Unparser::plain().unparse_program(&program);
        assert_eq!(text.trim(), "x : int = (1 + 2);");
    }

    #[test]
    fn unparses_fn_with_body() {
        let program = program_for("f: (a: int) void { give a; }");
        let text = Unparser::plain().unparse_program(&program);
        assert!(text.contains("f : (a : int) void {"));
        assert!(text.contains("    give a;"));
    }

    #[test]
    fn annotated_mode_suffixes_resolved_ids() {
        let program = program_for("x: int;");
        let annotate: &Annotate = &|_id| Some("int".to_string());
        let text = Unparser::annotated(annotate).unparse_program(&program);
        assert!(text.contains("x{int} : int"));
    }
}
