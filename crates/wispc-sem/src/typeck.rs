//! Type analysis: assigns every reachable expression and statement a
//! [`Type`], reporting one diagnostic per genuine type error and silently
//! propagating `Error` so one mistake doesn't cascade into a wall of
//! follow-ons. Grounded on the original `type_analysis.cpp` per-node rules.

use rustc_hash::FxHashMap;

use wispc_par::ast::*;
use wispc_util::Handler;

use crate::resolve::Resolutions;
use crate::symtab::SymbolArena;
use crate::types::{Type, TypeCtx};
use crate::InternalError;

pub type NodeTypes = FxHashMap<NodeId, Type>;

pub struct TypeckResult {
    pub ok: bool,
    pub node_types: NodeTypes,
    /// Set if a `magic` expression reached type analysis, or another
    /// invariant the earlier passes are supposed to guarantee was
    /// violated. This is distinct from `ok`: user-facing type errors
    /// leave this `None` even when `ok` is false.
    pub internal_error: Option<InternalError>,
}

pub fn analyze(
    program: &Program,
    resolutions: &Resolutions,
    symbols: &SymbolArena,
    types: &mut TypeCtx,
    handler: &Handler,
) -> TypeckResult {
    let mut checker = TypeChecker {
        resolutions,
        symbols,
        types,
        handler,
        node_types: FxHashMap::default(),
        current_fn_ret: None,
        ok: true,
        internal_error: None,
    };
    for decl in &program.decls {
        checker.decl(decl);
    }
    TypeckResult { ok: checker.ok, node_types: checker.node_types, internal_error: checker.internal_error }
}

struct TypeChecker<'a> {
    resolutions: &'a Resolutions,
    symbols: &'a SymbolArena,
    types: &'a mut TypeCtx,
    handler: &'a Handler,
    node_types: NodeTypes,
    current_fn_ret: Option<Type>,
    ok: bool,
    internal_error: Option<InternalError>,
}

impl<'a> TypeChecker<'a> {
    fn error(&mut self, span: wispc_util::Span, message: impl Into<String>) {
        self.handler.build_error(span, message).emit(self.handler);
        self.ok = false;
    }

    fn set(&mut self, id: NodeId, ty: Type) {
        self.node_types.insert(id, ty);
    }

    /// Looks up a node's type. Every node visited by this checker is given
    /// one before it's consulted here; a miss is an internal invariant
    /// violation, not a user-facing error.
    pub fn get(&self, id: NodeId) -> Result<Type, InternalError> {
        self.node_types.get(&id).copied().ok_or(InternalError::MissingNodeType(id))
    }

    fn loc_type(&self, loc: &Loc) -> Type {
        let def = self
            .resolutions
            .get(&loc.id)
            .expect("type analysis only runs after a successful name analysis");
        self.symbols[*def].ty
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(v) => self.var_decl(v),
            Decl::Fn(f) => self.fn_decl(f),
        }
    }

    fn var_decl(&mut self, v: &VarDecl) {
        let dst_ty = self.loc_type(&v.name);
        if let Some(init) = &v.init {
            let src_ty = self.expr(init);
            self.assign_like(v.span, dst_ty, src_ty);
        }
    }

    fn fn_decl(&mut self, f: &FnDecl) {
        let ret_ty = self.loc_type(&f.name);
        let ret_ty = match self.types.kind(ret_ty) {
            crate::types::TypeKind::Fn { ret, .. } => *ret,
            _ => ret_ty,
        };
        let prev = self.current_fn_ret.replace(ret_ty);
        for stmt in &f.body {
            self.stmt(stmt);
        }
        self.current_fn_ret = prev;
    }

    fn stmt(&mut self, stmt: &StmtNode) {
        match &stmt.kind {
            StmtKind::VarDecl(v) => self.var_decl(v),
            StmtKind::Assign { dst, src } => {
                let dst_ty = self.loc_type(dst);
                let src_ty = self.expr(src);
                self.assign_like(stmt.span, dst_ty, src_ty);
            }
            StmtKind::Take { dst } => {
                let ty = self.loc_type(dst);
                if self.types.is_fn(self.types.strip_immutable(ty)) {
                    self.error(stmt.span, "Attempt to assign user input to function");
                }
            }
            StmtKind::Give { src } => {
                let ty = self.expr(src);
                let stripped = self.types.strip_immutable(ty);
                if self.types.is_void(stripped) {
                    self.error(stmt.span, "Attempt to output void");
                } else if self.types.is_fn(stripped) {
                    self.error(stmt.span, "Attempt to output a function");
                }
            }
            StmtKind::Exit => {}
            StmtKind::PostInc(loc) | StmtKind::PostDec(loc) => {
                let ty = self.loc_type(loc);
                if !self.types.is_int(ty) && !self.types.is_error(ty) {
                    self.error(stmt.span, "Arithmetic operator applied to invalid operand");
                }
            }
            StmtKind::If { cond, body } => {
                self.check_condition(cond);
                for s in body {
                    self.stmt(s);
                }
            }
            StmtKind::IfElse { cond, then_body, else_body } => {
                self.check_condition(cond);
                for s in then_body {
                    self.stmt(s);
                }
                for s in else_body {
                    self.stmt(s);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond);
                for s in body {
                    self.stmt(s);
                }
            }
            StmtKind::Return { value } => self.return_stmt(stmt.span, value.as_ref()),
            StmtKind::Call(call) => {
                self.call(call);
            }
        }
    }

    fn check_condition(&mut self, cond: &ExprNode) {
        let ty = self.expr(cond);
        if !self.types.is_bool(ty) && !self.types.is_error(ty) {
            self.error(cond.span, "Non-bool expression used as a condition");
        }
    }

    fn return_stmt(&mut self, span: wispc_util::Span, value: Option<&ExprNode>) {
        let fn_ret = self.current_fn_ret.expect("return only appears inside a function body");
        let is_void_fn = self.types.is_void(fn_ret);

        match (is_void_fn, value) {
            (true, Some(e)) => {
                self.expr(e);
                self.error(e.span, "Return with a value in void function");
            }
            (true, None) => {}
            (false, None) => self.error(span, "Missing return value"),
            (false, Some(e)) => {
                let value_ty = self.expr(e);
                if !self.types.is_error(value_ty) && !self.types.compatible(value_ty, fn_ret) {
                    self.error(e.span, "Bad return value");
                }
            }
        }
    }

    fn call(&mut self, call: &CallExpr) -> Type {
        let callee_ty = self.loc_type(&call.callee);
        if self.types.is_error(callee_ty) {
            for arg in &call.args {
                self.expr(arg);
            }
            return self.types.error();
        }
        let (formals, ret) = match self.types.kind(callee_ty) {
            crate::types::TypeKind::Fn { formals, ret } => (*formals, *ret),
            _ => {
                self.error(call.span, "Attempt to call a non-function");
                for arg in &call.args {
                    self.expr(arg);
                }
                return self.types.error();
            }
        };
        let formal_tys: Vec<Type> = match self.types.kind(formals) {
            crate::types::TypeKind::TypeList(elems) => elems.clone(),
            _ => Vec::new(),
        };

        let arg_tys: Vec<Type> = call.args.iter().map(|a| self.expr(a)).collect();

        if arg_tys.len() != formal_tys.len() {
            self.error(call.span, "Function call with wrong number of args");
        } else {
            for (arg_ty, formal_ty) in arg_tys.iter().zip(formal_tys.iter()) {
                if !self.types.is_error(*arg_ty) && *arg_ty != *formal_ty {
                    self.error(call.span, "Type of actual does not match type of formal");
                }
            }
        }

        ret
    }

    fn assign_like(&mut self, span: wispc_util::Span, dst_ty: Type, src_ty: Type) -> Type {
        let dst_ok = self.assignable(dst_ty);
        let src_ok = self.assignable(src_ty);

        if !dst_ok {
            self.error(span, "Invalid assignment operand");
        }
        if !src_ok {
            self.error(span, "Invalid assignment operand");
        }

        if dst_ok && src_ok {
            if self.types.compatible(dst_ty, src_ty) {
                self.types.void()
            } else {
                self.error(span, "Invalid assignment operation");
                self.types.error()
            }
        } else {
            self.types.error()
        }
    }

    /// Only `Int` and `Bool` (stripped of any `immutable` wrapper) may
    /// appear on either side of an assignment; `Error` is always accepted
    /// so a prior mistake doesn't cascade into a second diagnostic here.
    fn assignable(&self, ty: Type) -> bool {
        if self.types.is_error(ty) {
            return true;
        }
        self.types.is_int(ty) || self.types.is_bool(ty)
    }

    fn expr(&mut self, expr: &ExprNode) -> Type {
        let ty = self.expr_kind(expr);
        self.set(expr.id, ty);
        ty
    }

    fn expr_kind(&mut self, expr: &ExprNode) -> Type {
        match &expr.kind {
            ExprKind::IntLit(_) => self.types.int(),
            ExprKind::StrLit(_) => self.types.string(),
            ExprKind::True | ExprKind::False => self.types.bool_(),
            ExprKind::Magic => {
                // `magic` name-analyzes trivially but is unsupported from
                // here on; a well-formed pipeline never type-checks one.
                self.internal_error.get_or_insert(InternalError::MagicInTypeAnalysis(expr.id));
                self.ok = false;
                self.types.error()
            }
            ExprKind::Id(loc) => self.loc_type(loc),
            ExprKind::Call(call) => self.call(call),
            ExprKind::Unary(op, operand) => self.unary(*op, operand, expr.span),
            ExprKind::Binary(op, lhs, rhs) => self.binary(*op, lhs, rhs, expr.span),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &ExprNode, span: wispc_util::Span) -> Type {
        let ty = self.expr(operand);
        match op {
            UnaryOp::Neg => {
                if self.types.is_int(ty) {
                    self.types.int()
                } else if self.types.is_error(ty) {
                    self.types.error()
                } else {
                    self.error(span, "Arithmetic operator applied to invalid operand");
                    self.types.error()
                }
            }
            UnaryOp::Not => {
                if self.types.is_bool(ty) {
                    self.types.bool_()
                } else if self.types.is_error(ty) {
                    self.types.error()
                } else {
                    self.error(span, "Logical operator applied to non-bool operand");
                    self.types.error()
                }
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &ExprNode, rhs: &ExprNode, span: wispc_util::Span) -> Type {
        let lty = self.expr(lhs);
        let rty = self.expr(rhs);

        match op {
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times | BinaryOp::Divide => {
                self.arith_or_logical(lty, rty, span, true)
            }
            BinaryOp::And | BinaryOp::Or => self.arith_or_logical(lty, rty, span, false),
            BinaryOp::Equals | BinaryOp::NotEquals => self.equality(lty, rty, span),
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
                self.relational(lty, rty, span)
            }
        }
    }

    fn arith_or_logical(&mut self, lty: Type, rty: Type, span: wispc_util::Span, arithmetic: bool) -> Type {
        let (predicate_ok, message, result): (fn(&TypeCtx, Type) -> bool, &str, fn(&TypeCtx) -> Type) = if arithmetic
        {
            (TypeCtx::is_int, "Arithmetic operator applied to invalid operand", TypeCtx::int)
        } else {
            (TypeCtx::is_bool, "Logical operator applied to non-bool operand", TypeCtx::bool_)
        };

        let l_ok = predicate_ok(self.types, lty) || self.types.is_error(lty);
        let r_ok = predicate_ok(self.types, rty) || self.types.is_error(rty);

        if !l_ok {
            self.error(span, message);
        }
        if !r_ok {
            self.error(span, message);
        }

        if l_ok && r_ok && !self.types.is_error(lty) && !self.types.is_error(rty) {
            result(self.types)
        } else {
            self.types.error()
        }
    }

    fn equality(&mut self, lty: Type, rty: Type, span: wispc_util::Span) -> Type {
        let valid = |types: &TypeCtx, t: Type| types.is_int(t) || types.is_bool(t) || types.is_error(t);

        let l_ok = valid(self.types, lty);
        let r_ok = valid(self.types, rty);

        if !l_ok {
            self.error(span, "Invalid equality operand");
        }
        if !r_ok {
            self.error(span, "Invalid equality operand");
        }

        if !l_ok || !r_ok {
            return self.types.error();
        }
        if self.types.is_error(lty) || self.types.is_error(rty) {
            return self.types.error();
        }
        if self.types.compatible(lty, rty) {
            self.types.bool_()
        } else {
            self.error(span, "Invalid equality operation");
            self.types.error()
        }
    }

    fn relational(&mut self, lty: Type, rty: Type, span: wispc_util::Span) -> Type {
        let l_ok = self.types.is_int(lty) || self.types.is_error(lty);
        let r_ok = self.types.is_int(rty) || self.types.is_error(rty);

        if !l_ok {
            self.error(span, "Relational operator applied to non-numeric operand");
        }
        if !r_ok {
            self.error(span, "Relational operator applied to non-numeric operand");
        }

        if l_ok && r_ok && !self.types.is_error(lty) && !self.types.is_error(rty) {
            self.types.bool_()
        } else {
            self.types.error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve;
    use wispc_lex::tokenize;
    use wispc_par::parser::parse;
    use wispc_util::FileId;

    fn check_src(src: &str) -> bool {
        let handler = Handler::new();
        let tokens = tokenize(src, FileId::DUMMY, &handler);
        let program = parse(&tokens, &handler).expect("parses");
        let mut types = TypeCtx::new();
        let names = resolve::analyze(&program, &mut types, &handler);
        assert!(names.ok && !handler.has_errors(), "name analysis should succeed for this fixture");
        let result = analyze(&program, &names.resolutions, &names.symbols, &mut types, &handler);
        result.ok && !handler.has_errors()
    }

    #[test]
    fn accepts_well_typed_program() {
        assert!(check_src("x: int = 1 + 2; f: () void { give x; }"));
    }

    #[test]
    fn rejects_arithmetic_on_bool() {
        assert!(!check_src("x: bool = true; y: int = x + 1;"));
    }

    #[test]
    fn rejects_non_bool_condition() {
        assert!(!check_src("f: () void { if (1) { exit; } }"));
    }

    #[test]
    fn rejects_wrong_arity_call() {
        assert!(!check_src("f: (a: int) void { give a; } g: () void { f(); }"));
    }

    #[test]
    fn rejects_bad_return_value() {
        assert!(!check_src("f: () int { return true; }"));
    }

    #[test]
    fn rejects_void_var_declaration() {
        // Caught by name analysis ("Invalid type in declaration"), so type
        // analysis is never reached for this one — covered here as a
        // documented cross-reference, not a repeat of the same assertion.
        let handler = Handler::new();
        let tokens = tokenize("x: void;", FileId::DUMMY, &handler);
        let program = parse(&tokens, &handler).expect("parses");
        let mut types = TypeCtx::new();
        let names = resolve::analyze(&program, &mut types, &handler);
        assert!(!names.ok);
    }

    #[test]
    fn accepts_recursive_function_call() {
        assert!(check_src("f: (n: int) int { return f(n); }"));
    }
}
