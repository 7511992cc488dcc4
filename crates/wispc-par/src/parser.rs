//! Recursive-descent parser. One token of lookahead is enough for every
//! production in this grammar; statement-initial identifiers are
//! disambiguated by peeking the token right after the identifier.

use wispc_lex::{SpannedToken, Token};
use wispc_util::{Handler, Span, Symbol};
use wispc_util::symbol::{KW_AND, KW_BOOL, KW_ELSE, KW_EXIT, KW_FALSE, KW_GIVE, KW_IF, KW_IMMUTABLE,
    KW_INT, KW_MAGIC, KW_OR, KW_RETURN, KW_STRING, KW_TAKE, KW_TRUE, KW_VOID, KW_WHILE};

use crate::ast::*;

/// Parses a full token stream (including its trailing [`Token::Eof`]) into a
/// [`Program`]. Returns `None` on the first unrecoverable syntax error,
/// which has already been reported to `handler`.
pub fn parse(tokens: &[SpannedToken], handler: &Handler) -> Option<Program> {
    let mut parser = Parser { tokens, pos: 0, ids: NodeIdGen::default(), handler, failed: false };
    let program = parser.parse_program();
    if parser.failed {
        None
    } else {
        Some(program)
    }
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    ids: NodeIdGen,
    handler: &'a Handler,
    failed: bool,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) -> SpannedToken {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn error(&mut self, message: impl Into<String>) {
        if !self.failed {
            self.handler.build_error(self.span(), message).emit(self.handler);
            self.failed = true;
        }
    }

    fn expect(&mut self, expected: &Token) -> Option<Span> {
        if self.peek() == expected {
            Some(self.advance().span)
        } else {
            let found = self.peek().describe();
            self.error(format!("expected {}, found {found}", expected.describe()));
            None
        }
    }

    fn expect_ident(&mut self) -> Option<(Symbol, Span)> {
        match *self.peek() {
            Token::Ident(sym) => {
                let span = self.advance().span;
                Some((sym, span))
            }
            _ => {
                let found = self.peek().describe();
                self.error(format!("expected identifier, found {found}"));
                None
            }
        }
    }

    fn is_keyword(tok: &Token, kw: Symbol) -> bool {
        matches!(tok, Token::Ident(sym) if *sym == kw)
    }

    fn eat_keyword(&mut self, kw: Symbol) -> bool {
        if Self::is_keyword(self.peek(), kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn loc(&mut self, name: Symbol, span: Span) -> Loc {
        Loc { id: self.ids.next(), span, name }
    }

    // ---- top level ----------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let id = self.ids.next();
        let mut decls = Vec::new();
        while *self.peek() != Token::Eof && !self.failed {
            match self.parse_decl() {
                Some(d) => decls.push(d),
                None => break,
            }
        }
        Program { id, decls }
    }

    fn parse_decl(&mut self) -> Option<Decl> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(&Token::Colon)?;
        if *self.peek() == Token::LParen {
            self.parse_fn_decl_rest(name, name_span).map(Decl::Fn)
        } else {
            self.parse_var_decl_rest(name, name_span).map(Decl::Var)
        }
    }

    fn parse_var_decl_rest(&mut self, name: Symbol, name_span: Span) -> Option<VarDecl> {
        let id = self.ids.next();
        let name_loc = self.loc(name, name_span);
        let ty = self.parse_type()?;
        let init = if *self.peek() == Token::Assign {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.expect(&Token::Semi)?;
        Some(VarDecl { id, span: name_span.merge(end), name: name_loc, ty, init })
    }

    fn parse_fn_decl_rest(&mut self, name: Symbol, name_span: Span) -> Option<FnDecl> {
        let id = self.ids.next();
        let name_loc = self.loc(name, name_span);
        self.expect(&Token::LParen)?;
        let mut formals = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                formals.push(self.parse_formal()?);
                if *self.peek() == Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        let ret_ty = self.parse_type()?;
        self.expect(&Token::LBrace)?;
        let body = self.parse_stmts_until_rbrace()?;
        let end = self.expect(&Token::RBrace)?;
        Some(FnDecl { id, span: name_span.merge(end), name: name_loc, formals, ret_ty, body })
    }

    fn parse_formal(&mut self) -> Option<FormalDecl> {
        let id = self.ids.next();
        let (name, name_span) = self.expect_ident()?;
        let name_loc = self.loc(name, name_span);
        self.expect(&Token::Colon)?;
        let ty = self.parse_type()?;
        let span = name_span.merge(ty.span);
        Some(FormalDecl { id, span, name: name_loc, ty })
    }

    fn parse_type(&mut self) -> Option<TypeNode> {
        let id = self.ids.next();
        let start = self.span();
        if self.eat_keyword(KW_IMMUTABLE) {
            let inner = self.parse_type()?;
            let span = start.merge(inner.span);
            return Some(TypeNode { id, span, kind: TypeKind::Immutable(Box::new(inner)) });
        }
        let kind = if self.eat_keyword(KW_INT) {
            TypeKind::Int
        } else if self.eat_keyword(KW_BOOL) {
            TypeKind::Bool
        } else if self.eat_keyword(KW_VOID) {
            TypeKind::Void
        } else if self.eat_keyword(KW_STRING) {
            TypeKind::String
        } else {
            let found = self.peek().describe();
            self.error(format!("expected a type, found {found}"));
            return None;
        };
        Some(TypeNode { id, span: start, kind })
    }

    // ---- statements -----------------------------------------------------

    fn parse_stmts_until_rbrace(&mut self) -> Option<Vec<StmtNode>> {
        let mut stmts = Vec::new();
        while *self.peek() != Token::RBrace && *self.peek() != Token::Eof && !self.failed {
            stmts.push(self.parse_stmt()?);
        }
        Some(stmts)
    }

    fn parse_block(&mut self) -> Option<Vec<StmtNode>> {
        self.expect(&Token::LBrace)?;
        let body = self.parse_stmts_until_rbrace()?;
        self.expect(&Token::RBrace)?;
        Some(body)
    }

    fn parse_stmt(&mut self) -> Option<StmtNode> {
        let id = self.ids.next();
        let start = self.span();

        if self.eat_keyword(KW_TAKE) {
            let dst = self.parse_loc()?;
            let end = self.expect(&Token::Semi)?;
            return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::Take { dst } });
        }
        if self.eat_keyword(KW_GIVE) {
            let src = self.parse_expr()?;
            let end = self.expect(&Token::Semi)?;
            return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::Give { src } });
        }
        if self.eat_keyword(KW_EXIT) {
            let end = self.expect(&Token::Semi)?;
            return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::Exit });
        }
        if self.eat_keyword(KW_IF) {
            self.expect(&Token::LParen)?;
            let cond = self.parse_expr()?;
            self.expect(&Token::RParen)?;
            let then_body = self.parse_block()?;
            if self.eat_keyword(KW_ELSE) {
                let else_body = self.parse_block()?;
                let end = else_body.last().map(|s| s.span).unwrap_or(start);
                return Some(StmtNode {
                    id,
                    span: start.merge(end),
                    kind: StmtKind::IfElse { cond, then_body, else_body },
                });
            }
            let end = then_body.last().map(|s| s.span).unwrap_or(start);
            return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::If { cond, body: then_body } });
        }
        if self.eat_keyword(KW_WHILE) {
            self.expect(&Token::LParen)?;
            let cond = self.parse_expr()?;
            self.expect(&Token::RParen)?;
            let body = self.parse_block()?;
            let end = body.last().map(|s| s.span).unwrap_or(start);
            return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::While { cond, body } });
        }
        if self.eat_keyword(KW_RETURN) {
            let value = if *self.peek() == Token::Semi { None } else { Some(self.parse_expr()?) };
            let end = self.expect(&Token::Semi)?;
            return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::Return { value } });
        }

        // Identifier-led statements: VarDecl, Assign, PostInc/Dec, CallStmt.
        if let Token::Ident(name) = *self.peek() {
            match *self.peek_at(1) {
                Token::Colon => {
                    self.advance();
                    self.advance();
                    let decl = self.parse_var_decl_rest(name, start)?;
                    let span = decl.span;
                    return Some(StmtNode { id, span, kind: StmtKind::VarDecl(decl) });
                }
                Token::Assign => {
                    self.advance();
                    let dst = self.loc(name, start);
                    self.advance();
                    let src = self.parse_expr()?;
                    let end = self.expect(&Token::Semi)?;
                    return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::Assign { dst, src } });
                }
                Token::PlusPlus => {
                    self.advance();
                    let dst = self.loc(name, start);
                    self.advance();
                    let end = self.expect(&Token::Semi)?;
                    return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::PostInc(dst) });
                }
                Token::MinusMinus => {
                    self.advance();
                    let dst = self.loc(name, start);
                    self.advance();
                    let end = self.expect(&Token::Semi)?;
                    return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::PostDec(dst) });
                }
                Token::LParen => {
                    let call = self.parse_call(name, start)?;
                    let end = self.expect(&Token::Semi)?;
                    return Some(StmtNode { id, span: start.merge(end), kind: StmtKind::Call(call) });
                }
                _ => {
                    let found = self.peek_at(1).describe();
                    self.error(format!("expected `:`, `=`, `++`, `--`, or `(` after identifier, found {found}"));
                    return None;
                }
            }
        }

        let found = self.peek().describe();
        self.error(format!("expected a statement, found {found}"));
        None
    }

    fn parse_loc(&mut self) -> Option<Loc> {
        let (name, span) = self.expect_ident()?;
        Some(self.loc(name, span))
    }

    fn parse_call(&mut self, name: Symbol, start: Span) -> Option<CallExpr> {
        let id = self.ids.next();
        let callee = self.loc(name, start);
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                args.push(self.parse_expr()?);
                if *self.peek() == Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(&Token::RParen)?;
        Some(CallExpr { id, span: start.merge(end), callee, args })
    }

    // ---- expressions ----------------------------------------------------
    // or -> and -> equality -> relational -> additive -> multiplicative -> unary -> primary

    fn parse_expr(&mut self) -> Option<ExprNode> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<ExprNode> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword(KW_OR) {
            let rhs = self.parse_and()?;
            lhs = self.bin(BinaryOp::Or, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_and(&mut self) -> Option<ExprNode> {
        let mut lhs = self.parse_equality()?;
        while self.eat_keyword(KW_AND) {
            let rhs = self.parse_equality()?;
            lhs = self.bin(BinaryOp::And, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_equality(&mut self) -> Option<ExprNode> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match *self.peek() {
                Token::EqEq => BinaryOp::Equals,
                Token::NotEq => BinaryOp::NotEquals,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = self.bin(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_relational(&mut self) -> Option<ExprNode> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match *self.peek() {
                Token::Less => BinaryOp::Less,
                Token::LessEq => BinaryOp::LessEq,
                Token::Greater => BinaryOp::Greater,
                Token::GreaterEq => BinaryOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.bin(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_additive(&mut self) -> Option<ExprNode> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match *self.peek() {
                Token::Plus => BinaryOp::Plus,
                Token::Minus => BinaryOp::Minus,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.bin(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_multiplicative(&mut self) -> Option<ExprNode> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match *self.peek() {
                Token::Star => BinaryOp::Times,
                Token::Slash => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.bin(op, lhs, rhs);
        }
        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<ExprNode> {
        let start = self.span();
        if *self.peek() == Token::Minus {
            self.advance();
            let id = self.ids.next();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Some(ExprNode { id, span, kind: ExprKind::Unary(UnaryOp::Neg, Box::new(operand)) });
        }
        if *self.peek() == Token::Bang {
            self.advance();
            let id = self.ids.next();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Some(ExprNode { id, span, kind: ExprKind::Unary(UnaryOp::Not, Box::new(operand)) });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<ExprNode> {
        let id = self.ids.next();
        let start = self.span();
        match *self.peek() {
            Token::IntLit(v) => {
                self.advance();
                Some(ExprNode { id, span: start, kind: ExprKind::IntLit(v) })
            }
            Token::StrLit(sym) => {
                self.advance();
                Some(ExprNode { id, span: start, kind: ExprKind::StrLit(sym) })
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Some(inner)
            }
            Token::Ident(name) if name == KW_TRUE => {
                self.advance();
                Some(ExprNode { id, span: start, kind: ExprKind::True })
            }
            Token::Ident(name) if name == KW_FALSE => {
                self.advance();
                Some(ExprNode { id, span: start, kind: ExprKind::False })
            }
            Token::Ident(name) if name == KW_MAGIC => {
                self.advance();
                Some(ExprNode { id, span: start, kind: ExprKind::Magic })
            }
            Token::Ident(name) => {
                self.advance();
                if *self.peek() == Token::LParen {
                    let call = self.parse_call(name, start)?;
                    let span = call.span;
                    Some(ExprNode { id, span, kind: ExprKind::Call(call) })
                } else {
                    let loc = self.loc(name, start);
                    Some(ExprNode { id, span: start, kind: ExprKind::Id(loc) })
                }
            }
            _ => {
                let found = self.peek().describe();
                self.error(format!("expected an expression, found {found}"));
                None
            }
        }
    }

    fn bin(&mut self, op: BinaryOp, lhs: ExprNode, rhs: ExprNode) -> ExprNode {
        let span = lhs.span.merge(rhs.span);
        let id = self.ids.next();
        ExprNode { id, span, kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)) }
    }
}
