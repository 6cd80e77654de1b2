pub mod ast;

use tracing::debug;

use crate::diagnostics::CompileError;
use crate::lexer::{Scanner, Token, TokenKind};
use crate::span::{Span, Spanned};
use ast::*;

type PResult<T> = Result<T, CompileError>;

/// Recursive-descent parser with one token of lookahead. The first
/// unexpected token aborts the parse; there is no recovery.
pub struct Parser<'src> {
    scanner: Scanner<'src>,
    current: Token,
    prev_end: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.scan();
        Self { scanner, current, prev_end: 0 }
    }

    fn peek(&self) -> TokenKind {
        self.current.kind
    }

    fn advance(&mut self) -> Token {
        let next = self.scanner.scan();
        let tok = std::mem::replace(&mut self.current, next);
        self.prev_end = tok.span.end;
        tok
    }

    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: TokenKind) -> PResult<Token> {
        if self.peek() == expected {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_ident(&mut self) -> PResult<Spanned<String>> {
        if self.peek() == TokenKind::Ident {
            let tok = self.advance();
            Ok(Spanned::new(tok.text, tok.span))
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match self.current.kind {
            TokenKind::Ident | TokenKind::Num => format!("{} '{}'", self.current.kind, self.current.text),
            kind => kind.to_string(),
        };
        CompileError::syntax(format!("expected {expected}, found {found}"), self.current.span)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.prev_end.max(start.end))
    }

    /// Scan errors recorded while parsing. Reported ahead of the syntax error they cause.
    pub fn take_scan_errors(&mut self) -> Vec<CompileError> {
        self.scanner.take_errors()
    }

    pub fn parse_program(&mut self) -> PResult<Program> {
        let mut classes = Vec::new();
        while self.peek() != TokenKind::Eot {
            classes.push(self.parse_class()?);
        }
        debug!(classes = classes.len(), "parsed program");
        Ok(Program { classes })
    }

    // ── declarations ──────────────────────────────────────────────

    fn parse_class(&mut self) -> PResult<Spanned<ClassDecl>> {
        let start = self.expect(TokenKind::Class)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.accept(TokenKind::RBrace) {
            self.parse_member(&name.node, &mut fields, &mut methods)?;
        }

        Ok(Spanned::new(ClassDecl { name, fields, methods }, self.span_from(start)))
    }

    fn parse_member(
        &mut self,
        owner: &str,
        fields: &mut Vec<Spanned<FieldDecl>>,
        methods: &mut Vec<Spanned<MethodDecl>>,
    ) -> PResult<()> {
        let start = self.current.span;
        let is_private = match self.peek() {
            TokenKind::Private => {
                self.advance();
                true
            }
            TokenKind::Public => {
                self.advance();
                false
            }
            _ => false,
        };
        let is_static = self.accept(TokenKind::Static);

        let ty = if self.peek() == TokenKind::Void {
            let tok = self.advance();
            Spanned::new(TypeDenoter::Void, tok.span)
        } else {
            self.parse_type()?
        };
        let name = self.expect_ident()?;

        if self.peek() == TokenKind::Semi {
            if ty.node == TypeDenoter::Void {
                return Err(CompileError::syntax(
                    format!("field '{}' cannot have type void", name.node),
                    ty.span,
                ));
            }
            self.advance();
            fields.push(Spanned::new(
                FieldDecl { is_private, is_static, ty, name, owner: owner.to_string() },
                self.span_from(start),
            ));
            return Ok(());
        }

        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.accept(TokenKind::RBrace) {
            body.push(self.parse_stmt()?);
        }

        methods.push(Spanned::new(
            MethodDecl {
                is_private,
                is_static,
                return_type: ty,
                name,
                owner: owner.to_string(),
                params,
                body,
            },
            self.span_from(start),
        ));
        Ok(())
    }

    fn parse_params(&mut self) -> PResult<Vec<Spanned<ParamDecl>>> {
        let mut params = Vec::new();
        if self.peek() == TokenKind::RParen {
            return Ok(params);
        }
        loop {
            let ty = self.parse_type()?;
            let name = self.expect_ident()?;
            let span = ty.span.to(name.span);
            params.push(Spanned::new(ParamDecl { ty, name }, span));
            if !self.accept(TokenKind::Comma) {
                return Ok(params);
            }
        }
    }

    fn parse_type(&mut self) -> PResult<Spanned<TypeDenoter>> {
        let start = self.current.span;
        let base = match self.peek() {
            TokenKind::Int => {
                self.advance();
                TypeDenoter::Int
            }
            TokenKind::Boolean => {
                self.advance();
                return Ok(Spanned::new(TypeDenoter::Boolean, start));
            }
            TokenKind::Ident => TypeDenoter::Class(self.advance().text),
            _ => return Err(self.unexpected("type")),
        };
        if self.accept(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket)?;
            return Ok(Spanned::new(TypeDenoter::array_of(base), self.span_from(start)));
        }
        Ok(Spanned::new(base, start))
    }

    // ── statements ────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> PResult<Spanned<Stmt>> {
        let start = self.current.span;
        match self.peek() {
            TokenKind::LBrace => {
                self.advance();
                let mut stmts = Vec::new();
                while !self.accept(TokenKind::RBrace) {
                    stmts.push(self.parse_stmt()?);
                }
                Ok(Spanned::new(Stmt::Block(stmts), self.span_from(start)))
            }
            TokenKind::Int | TokenKind::Boolean => {
                let ty = self.parse_type()?;
                self.parse_var_decl_rest(ty, start)
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.peek() == TokenKind::Semi { None } else { Some(self.parse_expr()?) };
                self.expect(TokenKind::Semi)?;
                Ok(Spanned::new(Stmt::Return(value), self.span_from(start)))
            }
            TokenKind::If => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let then_branch = Box::new(self.parse_stmt()?);
                let else_branch = if self.accept(TokenKind::Else) {
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                Ok(Spanned::new(Stmt::If { cond, then_branch, else_branch }, self.span_from(start)))
            }
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Spanned::new(Stmt::While { cond, body }, self.span_from(start)))
            }
            TokenKind::This => {
                let tok = self.advance();
                let base = self.parse_reference_rest(Spanned::new(Reference::This, tok.span))?;
                self.parse_reference_stmt(base, start)
            }
            TokenKind::Ident => self.parse_ident_stmt(start),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Statement starting with an identifier: a declaration of class or
    /// class-array type, or a statement rooted at a reference.
    fn parse_ident_stmt(&mut self, start: Span) -> PResult<Spanned<Stmt>> {
        let id = self.advance();
        match self.peek() {
            TokenKind::Ident => {
                let ty = Spanned::new(TypeDenoter::Class(id.text), id.span);
                self.parse_var_decl_rest(ty, start)
            }
            TokenKind::LBracket => {
                self.advance();
                if self.accept(TokenKind::RBracket) {
                    let ty = Spanned::new(
                        TypeDenoter::array_of(TypeDenoter::Class(id.text)),
                        self.span_from(start),
                    );
                    return self.parse_var_decl_rest(ty, start);
                }
                let target = Spanned::new(Reference::Id(id.text), id.span);
                self.parse_index_assign_rest(target, start)
            }
            _ => {
                let base = self.parse_reference_rest(Spanned::new(Reference::Id(id.text), id.span))?;
                self.parse_reference_stmt(base, start)
            }
        }
    }

    fn parse_var_decl_rest(&mut self, ty: Spanned<TypeDenoter>, start: Span) -> PResult<Spanned<Stmt>> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        Ok(Spanned::new(Stmt::VarDecl { decl: VarDecl { ty, name }, init }, self.span_from(start)))
    }

    fn parse_reference_stmt(&mut self, target: Spanned<Reference>, start: Span) -> PResult<Spanned<Stmt>> {
        match self.peek() {
            TokenKind::Eq => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Spanned::new(Stmt::Assign { target, value }, self.span_from(start)))
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_index_assign_rest(target, start)
            }
            TokenKind::LParen => {
                self.advance();
                let args = self.parse_args()?;
                self.expect(TokenKind::RParen)?;
                self.expect(TokenKind::Semi)?;
                Ok(Spanned::new(Stmt::Call { method: target, args }, self.span_from(start)))
            }
            _ => Err(self.unexpected("'=', '[' or '('")),
        }
    }

    /// Rest of `target [ index ] = value ;` after the opening bracket.
    fn parse_index_assign_rest(&mut self, target: Spanned<Reference>, start: Span) -> PResult<Spanned<Stmt>> {
        let index = self.parse_expr()?;
        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        Ok(Spanned::new(Stmt::IndexAssign { target, index, value }, self.span_from(start)))
    }

    fn parse_reference_rest(&mut self, mut reference: Spanned<Reference>) -> PResult<Spanned<Reference>> {
        while self.accept(TokenKind::Dot) {
            let member = self.expect_ident()?;
            let span = reference.span.to(member.span);
            reference = Spanned::new(Reference::Qual { base: Box::new(reference), member }, span);
        }
        Ok(reference)
    }

    fn parse_args(&mut self) -> PResult<Vec<Spanned<Expr>>> {
        let mut args = Vec::new();
        if self.peek() == TokenKind::RParen {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.accept(TokenKind::Comma) {
                return Ok(args);
            }
        }
    }

    // ── expressions ───────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_or()
    }

    /// One precedence level: operands from `next`, folded left over `ops`.
    fn parse_left_assoc(
        &mut self,
        ops: &[(TokenKind, BinOp)],
        next: fn(&mut Self) -> PResult<Spanned<Expr>>,
    ) -> PResult<Spanned<Expr>> {
        let mut lhs = next(self)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| *kind == self.peek()) {
            self.advance();
            let rhs = next(self)?;
            let span = lhs.span.to(rhs.span);
            lhs = Spanned::new(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_left_assoc(&[(TokenKind::PipePipe, BinOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_left_assoc(&[(TokenKind::AmpAmp, BinOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_left_assoc(
            &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::BangEq, BinOp::Neq)],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_left_assoc(
            &[
                (TokenKind::Lt, BinOp::Lt),
                (TokenKind::LtEq, BinOp::LtEq),
                (TokenKind::Gt, BinOp::Gt),
                (TokenKind::GtEq, BinOp::GtEq),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_left_assoc(
            &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_left_assoc(
            &[(TokenKind::Star, BinOp::Mul), (TokenKind::Slash, BinOp::Div)],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> PResult<Spanned<Expr>> {
        let op = match self.peek() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?;
        let span = start.to(operand.span);
        Ok(Spanned::new(Expr::Unary { op, operand: Box::new(operand) }, span))
    }

    fn parse_primary(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.current.span;
        match self.peek() {
            TokenKind::Num => {
                let tok = self.advance();
                let value = tok.text.parse::<i32>().map_err(|_| {
                    CompileError::syntax(format!("integer literal {} is out of range", tok.text), tok.span)
                })?;
                Ok(Spanned::new(Expr::Literal(Literal::Int(value)), tok.span))
            }
            TokenKind::True | TokenKind::False => {
                let tok = self.advance();
                Ok(Spanned::new(Expr::Literal(Literal::Bool(tok.kind == TokenKind::True)), tok.span))
            }
            TokenKind::Null => {
                let tok = self.advance();
                Ok(Spanned::new(Expr::Literal(Literal::Null), tok.span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Spanned::new(inner.node, self.span_from(start)))
            }
            TokenKind::New => {
                self.advance();
                self.parse_new_rest(start)
            }
            TokenKind::This | TokenKind::Ident => {
                let tok = self.advance();
                let root = if tok.kind == TokenKind::This { Reference::This } else { Reference::Id(tok.text) };
                let target = self.parse_reference_rest(Spanned::new(root, tok.span))?;
                if self.accept(TokenKind::LBracket) {
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    return Ok(Spanned::new(
                        Expr::Index { target, index: Box::new(index) },
                        self.span_from(start),
                    ));
                }
                if self.accept(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    self.expect(TokenKind::RParen)?;
                    return Ok(Spanned::new(Expr::Call { method: target, args }, self.span_from(start)));
                }
                let span = target.span;
                Ok(Spanned::new(Expr::Ref(target.node), span))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Rest of a `new` expression: `C()`, `C[n]` or `int[n]`.
    fn parse_new_rest(&mut self, start: Span) -> PResult<Spanned<Expr>> {
        match self.peek() {
            TokenKind::Ident => {
                let class = self.expect_ident()?;
                if self.accept(TokenKind::LParen) {
                    self.expect(TokenKind::RParen)?;
                    return Ok(Spanned::new(Expr::NewObject(class), self.span_from(start)));
                }
                if self.accept(TokenKind::LBracket) {
                    let size = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    let elem = Spanned::new(TypeDenoter::Class(class.node), class.span);
                    return Ok(Spanned::new(
                        Expr::NewArray { elem, size: Box::new(size) },
                        self.span_from(start),
                    ));
                }
                Err(self.unexpected("'(' or '['"))
            }
            TokenKind::Int => {
                let elem = Spanned::new(TypeDenoter::Int, self.advance().span);
                self.expect(TokenKind::LBracket)?;
                let size = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                Ok(Spanned::new(Expr::NewArray { elem, size: Box::new(size) }, self.span_from(start)))
            }
            _ => Err(self.unexpected("class name or 'int'")),
        }
    }
}

/// Parse a whole source text. On failure the scan errors come first,
/// followed by the single syntax error (if the failure was not a scan error alone).
pub fn parse(source: &str) -> Result<Program, Vec<CompileError>> {
    let mut parser = Parser::new(source);
    let result = parser.parse_program();
    let mut errors = parser.take_scan_errors();
    match result {
        Ok(program) if errors.is_empty() => Ok(program),
        Ok(_) => Err(errors),
        Err(err) => {
            errors.push(err);
            Err(errors)
        }
    }
}
