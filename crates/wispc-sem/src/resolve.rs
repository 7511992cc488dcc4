//! Name analysis: binds every identifier occurrence to a definition,
//! rejecting multiply-declared names, forward references within a scope,
//! and uses of undeclared names. Grounded on the original `name_analysis.cpp`
//! traversal, keyed here by [`NodeId`] instead of mutating `ASTNode*`s.

use rustc_hash::FxHashMap;

use wispc_par::ast::*;
use wispc_util::{DefId, DefIdGenerator, Handler, Symbol};

use crate::symtab::{SemSymbol, SymbolArena, SymbolKind, SymbolTable};
use crate::types::{Type, TypeCtx};

/// Maps every identifier occurrence (`Loc::id`) that successfully resolved
/// to the definition it's bound to.
pub type Resolutions = FxHashMap<NodeId, DefId>;

pub struct ResolveResult {
    pub ok: bool,
    pub resolutions: Resolutions,
    pub symbols: SymbolArena,
}

pub fn analyze(program: &Program, types: &mut TypeCtx, handler: &Handler) -> ResolveResult {
    let mut resolver = Resolver {
        scopes: SymbolTable::new(),
        gen: DefIdGenerator::new(),
        symbols: SymbolArena::new(),
        resolutions: FxHashMap::default(),
        types,
        handler,
        ok: true,
    };
    resolver.program(program);
    ResolveResult { ok: resolver.ok, resolutions: resolver.resolutions, symbols: resolver.symbols }
}

struct Resolver<'a> {
    scopes: SymbolTable,
    gen: DefIdGenerator,
    symbols: SymbolArena,
    resolutions: Resolutions,
    types: &'a mut TypeCtx,
    handler: &'a Handler,
    ok: bool,
}

impl<'a> Resolver<'a> {
    fn error(&mut self, span: wispc_util::Span, message: impl Into<String>) {
        self.handler.build_error(span, message).emit(self.handler);
        self.ok = false;
    }

    fn declare(&mut self, name: Symbol, ty: Type, kind: SymbolKind, loc: &Loc) -> Option<DefId> {
        if self.scopes.clashes(name) {
            self.error(loc.span, "Multiply declared identifier");
            return None;
        }
        let def = self.gen.next();
        // `IndexVec::push` hands back its own freshly minted index; `def`
        // from `DefIdGenerator` is kept in lockstep with it since both
        // start at zero and advance one-for-one per definition.
        let pushed = self.symbols.push(SemSymbol { name, ty, kind });
        debug_assert_eq!(pushed, def);
        self.scopes.insert(name, def);
        self.resolutions.insert(loc.id, def);
        Some(def)
    }

    fn type_node_to_type(&mut self, node: &TypeNode) -> Type {
        match &node.kind {
            TypeKind::Int => self.types.int(),
            TypeKind::Bool => self.types.bool_(),
            TypeKind::Void => self.types.void(),
            TypeKind::String => self.types.string(),
            TypeKind::Immutable(inner) => {
                let inner_ty = self.type_node_to_type(inner);
                self.types.immutable(inner_ty)
            }
        }
    }

    fn program(&mut self, program: &Program) {
        self.scopes.enter();
        for decl in &program.decls {
            self.decl(decl);
        }
        self.scopes.leave();
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(v) => self.var_decl(v),
            Decl::Fn(f) => self.fn_decl(f),
        }
    }

    fn var_decl(&mut self, v: &VarDecl) {
        let declared_ty = self.type_node_to_type(&v.ty);
        if !self.types.valid_var_type(declared_ty) {
            self.error(v.ty.span, "Invalid type in declaration");
        }
        if let Some(init) = &v.init {
            // Name-analyzed even when the declared type is bad, so nested
            // errors in the initializer still surface.
            self.expr(init);
        }
        self.declare(v.name.name, declared_ty, SymbolKind::Var, &v.name);
    }

    fn formal_decl(&mut self, f: &FormalDecl) {
        let declared_ty = self.type_node_to_type(&f.ty);
        if !self.types.valid_var_type(declared_ty) {
            self.error(f.ty.span, "Invalid type in declaration");
        }
        self.declare(f.name.name, declared_ty, SymbolKind::Formal, &f.name);
    }

    fn fn_decl(&mut self, f: &FnDecl) {
        let ret_ty = self.type_node_to_type(&f.ret_ty);
        let formal_tys: Vec<Type> = f.formals.iter().map(|formal| self.type_node_to_type(&formal.ty)).collect();
        let formal_list = self.types.type_list(formal_tys);
        let fn_ty = self.types.function(formal_list, ret_ty);

        // The function's own name is bound in the *enclosing* scope before
        // its body is analyzed, so recursive calls resolve.
        self.declare(f.name.name, fn_ty, SymbolKind::Fn, &f.name);

        self.scopes.enter();
        for formal in &f.formals {
            self.formal_decl(formal);
        }
        for stmt in &f.body {
            self.stmt(stmt);
        }
        self.scopes.leave();
    }

    fn loc_use(&mut self, loc: &Loc) {
        match self.scopes.find(loc.name) {
            Some(def) => {
                self.resolutions.insert(loc.id, def);
            }
            None => self.error(loc.span, "Undeclared identifier"),
        }
    }

    fn stmt(&mut self, stmt: &StmtNode) {
        match &stmt.kind {
            StmtKind::VarDecl(v) => self.var_decl(v),
            StmtKind::Assign { dst, src } => {
                self.loc_use(dst);
                self.expr(src);
            }
            StmtKind::Take { dst } => self.loc_use(dst),
            StmtKind::Give { src } => self.expr(src),
            StmtKind::Exit => {}
            StmtKind::PostInc(loc) | StmtKind::PostDec(loc) => self.loc_use(loc),
            StmtKind::If { cond, body } => {
                self.expr(cond);
                self.scopes.enter();
                for s in body {
                    self.stmt(s);
                }
                self.scopes.leave();
            }
            StmtKind::IfElse { cond, then_body, else_body } => {
                self.expr(cond);
                self.scopes.enter();
                for s in then_body {
                    self.stmt(s);
                }
                self.scopes.leave();
                self.scopes.enter();
                for s in else_body {
                    self.stmt(s);
                }
                self.scopes.leave();
            }
            StmtKind::While { cond, body } => {
                self.expr(cond);
                self.scopes.enter();
                for s in body {
                    self.stmt(s);
                }
                self.scopes.leave();
            }
            StmtKind::Return { value } => {
                if let Some(e) = value {
                    self.expr(e);
                }
            }
            StmtKind::Call(call) => self.call(call),
        }
    }

    fn call(&mut self, call: &CallExpr) {
        self.loc_use(&call.callee);
        for arg in &call.args {
            self.expr(arg);
        }
    }

    fn expr(&mut self, expr: &ExprNode) {
        match &expr.kind {
            ExprKind::IntLit(_) | ExprKind::StrLit(_) | ExprKind::True | ExprKind::False | ExprKind::Magic => {}
            ExprKind::Id(loc) => self.loc_use(loc),
            ExprKind::Call(call) => self.call(call),
            ExprKind::Unary(_, operand) => self.expr(operand),
            ExprKind::Binary(_, lhs, rhs) => {
                self.expr(lhs);
                self.expr(rhs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wispc_lex::tokenize;
    use wispc_par::parser::parse;
    use wispc_util::FileId;

    fn analyze_src(src: &str) -> (bool, TypeCtx) {
        let handler = Handler::new();
        let tokens = tokenize(src, FileId::DUMMY, &handler);
        let program = parse(&tokens, &handler).expect("parses");
        let mut types = TypeCtx::new();
        let result = analyze(&program, &mut types, &handler);
        (result.ok && !handler.has_errors(), types)
    }

    #[test]
    fn resolves_simple_global() {
        let (ok, _) = analyze_src("x: int = 1; f: () void { give x; }");
        assert!(ok);
    }

    #[test]
    fn rejects_undeclared_identifier() {
        let (ok, _) = analyze_src("f: () void { give y; }");
        assert!(!ok);
    }

    #[test]
    fn rejects_multiply_declared_in_same_scope() {
        let (ok, _) = analyze_src("x: int; x: bool;");
        assert!(!ok);
    }

    #[test]
    fn allows_recursive_call() {
        let (ok, _) = analyze_src("f: (n: int) int { return f(n); }");
        assert!(ok);
    }

    #[test]
    fn allows_shadowing_in_nested_scope() {
        let (ok, _) = analyze_src("x: int = 1; f: () void { x: bool = true; give x; }");
        assert!(ok);
    }

    #[test]
    fn rejects_invalid_var_type() {
        let (ok, _) = analyze_src("x: void;");
        assert!(!ok);
    }
}
