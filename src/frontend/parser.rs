//! Parser for rlc
//!
//! Recursive descent parser with Pratt parsing for expressions.

use rustc_hash::FxHashMap;

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind, PREFIX_BINDING_POWER};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Set while parsing `if`/`while` conditions, where `Name {` opens the body
    no_struct_literal: bool,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Result<Self> {
        Ok(Self::from_tokens(lexer.tokenize()?))
    }

    /// Create a parser from pre-tokenized input
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(Span::dummy(), |t| t.span);
            tokens.push(Token::eof(end));
        }
        Self {
            tokens,
            pos: 0,
            no_struct_literal: false,
        }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("{:?}", expected)))
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: format!("{:?}", self.current_kind()),
            span: self.current().span,
        }
    }

    /// Span from `start` to the last consumed token
    fn span_from(&self, start: Span) -> Span {
        start.merge(&self.tokens[self.pos.saturating_sub(1)].span)
    }

    /// Run `f` with the struct-literal restriction set to `restricted`
    fn with_struct_literals<T>(
        &mut self,
        restricted: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.no_struct_literal, restricted);
        let result = f(self);
        self.no_struct_literal = saved;
        result
    }

    // ==================== Items ====================

    /// Parse a complete crate
    pub fn parse_crate(&mut self) -> Result<Crate> {
        let mut items = Vec::new();

        while !self.is_at_end() {
            items.push(self.parse_item()?);
        }

        Ok(Crate { items })
    }

    fn starts_item(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Fn
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Impl
                | TokenKind::Trait
                | TokenKind::Const
        )
    }

    fn parse_item(&mut self) -> Result<Item> {
        match self.current_kind() {
            TokenKind::Fn => Ok(Item::Function(self.parse_function(false)?)),
            TokenKind::Struct => Ok(Item::Struct(self.parse_struct()?)),
            TokenKind::Enum => Ok(Item::Enum(self.parse_enum()?)),
            TokenKind::Impl => Ok(Item::Impl(self.parse_impl()?)),
            TokenKind::Trait => Ok(Item::Trait(self.parse_trait()?)),
            TokenKind::Const => Ok(Item::Const(self.parse_const()?)),
            _ => Err(self.unexpected("item (fn, struct, enum, impl, trait, const)")),
        }
    }

    /// Parse a function; bodiless declarations are accepted inside traits
    fn parse_function(&mut self, in_trait: bool) -> Result<Function> {
        let start = self.current().span;
        self.expect(TokenKind::Fn)?;

        let name = self.parse_ident()?;

        self.expect(TokenKind::LParen)?;
        let self_param = self.parse_self_param()?;
        if self_param.is_some() && !self.check(&TokenKind::RParen) {
            self.expect(TokenKind::Comma)?;
        }
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        let ret_type = if self.consume(&TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if in_trait && self.consume(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            return Err(self.unexpected("function body"));
        };

        Ok(Function {
            name,
            self_param,
            params,
            ret_type,
            body,
            span: self.span_from(start),
            signature: None,
            locals: FxHashMap::default(),
        })
    }

    fn parse_self_param(&mut self) -> Result<Option<SelfParam>> {
        let start = self.current().span;
        match (self.current_kind().clone(), self.peek_kind().clone()) {
            (TokenKind::And, TokenKind::SelfValue) => {
                self.advance();
                self.advance();
                Ok(Some(SelfParam::Shorthand {
                    reference: true,
                    mutable: false,
                    span: self.span_from(start),
                }))
            }
            (TokenKind::And, TokenKind::Mut) => {
                let save = self.pos;
                self.advance();
                self.advance();
                if self.consume(&TokenKind::SelfValue) {
                    Ok(Some(SelfParam::Shorthand {
                        reference: true,
                        mutable: true,
                        span: self.span_from(start),
                    }))
                } else {
                    // `&mut pat: T` is an ordinary parameter
                    self.pos = save;
                    Ok(None)
                }
            }
            (TokenKind::Mut, TokenKind::SelfValue) | (TokenKind::SelfValue, _) => {
                let mutable = self.consume(&TokenKind::Mut);
                self.expect(TokenKind::SelfValue)?;
                if self.consume(&TokenKind::Colon) {
                    let ty = self.parse_type()?;
                    Ok(Some(SelfParam::Typed {
                        mutable,
                        ty,
                        span: self.span_from(start),
                    }))
                } else {
                    Ok(Some(SelfParam::Shorthand {
                        reference: false,
                        mutable,
                        span: self.span_from(start),
                    }))
                }
            }
            _ => Ok(None),
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.parse_param()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param> {
        let start = self.current().span;
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;

        Ok(Param {
            pattern,
            ty,
            span: self.span_from(start),
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident::new(name.clone(), token.span))
            }
            _ => Err(Error::ExpectedIdent { span: token.span }),
        }
    }

    fn parse_struct(&mut self) -> Result<StructDef> {
        let start = self.current().span;
        self.expect(TokenKind::Struct)?;

        let name = self.parse_ident()?;
        let mut fields = Vec::new();

        if !self.consume(&TokenKind::Semicolon) {
            self.expect(TokenKind::LBrace)?;
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                let field_name = self.parse_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;

                fields.push(Field {
                    span: field_name.span.merge(&ty.span),
                    name: field_name,
                    ty,
                });

                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace)?;
        }

        Ok(StructDef {
            name,
            fields,
            span: self.span_from(start),
        })
    }

    fn parse_enum(&mut self) -> Result<EnumDef> {
        let start = self.current().span;
        self.expect(TokenKind::Enum)?;

        let name = self.parse_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut variants = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            variants.push(self.parse_ident()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBrace)?;

        Ok(EnumDef {
            name,
            variants,
            span: self.span_from(start),
        })
    }

    fn parse_impl(&mut self) -> Result<ImplBlock> {
        let start = self.current().span;
        self.expect(TokenKind::Impl)?;

        let first = self.parse_type()?;
        let (trait_name, target) = if self.consume(&TokenKind::For) {
            let trait_name = match first.kind {
                TypeKind::Path(PathSegment::Ident(ident)) => ident,
                _ => return Err(Error::ExpectedIdent { span: first.span }),
            };
            (Some(trait_name), self.parse_type()?)
        } else {
            (None, first)
        };

        let methods = self.parse_assoc_fns(false)?;

        Ok(ImplBlock {
            target,
            trait_name,
            methods,
            span: self.span_from(start),
        })
    }

    fn parse_trait(&mut self) -> Result<TraitDef> {
        let start = self.current().span;
        self.expect(TokenKind::Trait)?;

        let name = self.parse_ident()?;
        let methods = self.parse_assoc_fns(true)?;

        Ok(TraitDef {
            name,
            methods,
            span: self.span_from(start),
        })
    }

    /// `{ fn* }` of an impl or trait
    fn parse_assoc_fns(&mut self, in_trait: bool) -> Result<Vec<Function>> {
        self.expect(TokenKind::LBrace)?;

        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.check(&TokenKind::Const) {
                return Err(Error::Unsupported {
                    what: "associated constants".to_string(),
                    span: self.current().span,
                });
            }
            methods.push(self.parse_function(in_trait)?);
        }

        self.expect(TokenKind::RBrace)?;
        Ok(methods)
    }

    fn parse_const(&mut self) -> Result<ConstDef> {
        let start = self.current().span;
        self.expect(TokenKind::Const)?;

        let name = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(ConstDef {
            name,
            ty,
            value,
            span: self.span_from(start),
        })
    }

    // ==================== Types and Patterns ====================

    fn parse_type(&mut self) -> Result<Type> {
        let token = self.current().clone();

        let kind = match &token.kind {
            TokenKind::And | TokenKind::AndAnd => {
                self.advance();
                let mutable = self.consume(&TokenKind::Mut);
                let inner = self.parse_type()?;
                let reference = TypeKind::Reference {
                    mutable,
                    inner: Box::new(inner),
                };
                if token.kind == TokenKind::AndAnd {
                    // `&&T` is `& &T`
                    let span = self.span_from(token.span);
                    TypeKind::Reference {
                        mutable: false,
                        inner: Box::new(Type::new(reference, span)),
                    }
                } else {
                    reference
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let elem = self.parse_type()?;
                self.expect(TokenKind::Semicolon)?;
                let len = self.with_struct_literals(false, |p| p.parse_expr())?;
                self.expect(TokenKind::RBracket)?;
                TypeKind::Array {
                    elem: Box::new(elem),
                    len: Box::new(len),
                }
            }
            TokenKind::LParen => {
                self.advance();
                self.expect(TokenKind::RParen)?;
                TypeKind::Unit
            }
            TokenKind::Ident(name) => {
                self.advance();
                TypeKind::Path(PathSegment::Ident(Ident::new(name.clone(), token.span)))
            }
            TokenKind::SelfType => {
                self.advance();
                TypeKind::Path(PathSegment::SelfType(token.span))
            }
            _ => return Err(Error::ExpectedType { span: token.span }),
        };

        Ok(Type::new(kind, self.span_from(token.span)))
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let token = self.current().clone();

        match &token.kind {
            TokenKind::And | TokenKind::AndAnd => {
                self.advance();
                let mutable = self.consume(&TokenKind::Mut);
                let inner = self.parse_pattern()?;
                let span = self.span_from(token.span);
                let pattern = Pattern::Reference {
                    mutable,
                    inner: Box::new(inner),
                    span,
                };
                if token.kind == TokenKind::AndAnd {
                    Ok(Pattern::Reference {
                        mutable: false,
                        inner: Box::new(pattern),
                        span,
                    })
                } else {
                    Ok(pattern)
                }
            }
            TokenKind::Ref | TokenKind::Mut | TokenKind::Ident(_) => {
                let by_ref = self.consume(&TokenKind::Ref);
                let mutable = self.consume(&TokenKind::Mut);
                let name = self.parse_ident()?;
                Ok(Pattern::Identifier {
                    name,
                    by_ref,
                    mutable,
                })
            }
            _ => Err(Error::ExpectedPattern { span: token.span }),
        }
    }

    // ==================== Blocks and Statements ====================

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.current().span;
        self.expect(TokenKind::LBrace)?;

        self.with_struct_literals(false, |p| {
            let mut stmts = Vec::new();
            let mut tail = None;

            while !p.check(&TokenKind::RBrace) && !p.is_at_end() {
                match p.parse_stmt()? {
                    StmtOrTail::Stmt(stmt) => stmts.push(stmt),
                    StmtOrTail::Tail(expr) => {
                        tail = Some(Box::new(expr));
                        break;
                    }
                }
            }

            p.expect(TokenKind::RBrace)?;
            Ok(Block::new(stmts, tail, p.span_from(start)))
        })
    }

    fn parse_stmt(&mut self) -> Result<StmtOrTail> {
        let start = self.current().span;

        if self.consume(&TokenKind::Semicolon) {
            return Ok(StmtOrTail::Stmt(Stmt::new(StmtKind::Empty, start)));
        }
        if self.check(&TokenKind::Let) {
            return Ok(StmtOrTail::Stmt(self.parse_let_stmt()?));
        }
        if self.starts_item() {
            let item = self.parse_item()?;
            return Ok(StmtOrTail::Stmt(Stmt::new(
                StmtKind::Item(Box::new(item)),
                self.span_from(start),
            )));
        }

        let block_like = matches!(
            self.current_kind(),
            TokenKind::LBrace | TokenKind::If | TokenKind::Loop | TokenKind::While
        );
        let expr = if block_like {
            self.parse_block_like()?
        } else {
            self.parse_expr()?
        };

        if self.consume(&TokenKind::Semicolon) {
            let span = self.span_from(start);
            return Ok(StmtOrTail::Stmt(Stmt::new(
                StmtKind::Expr { expr, has_semi: true },
                span,
            )));
        }
        if self.check(&TokenKind::RBrace) {
            return Ok(StmtOrTail::Tail(expr));
        }
        if block_like {
            let span = expr.span;
            return Ok(StmtOrTail::Stmt(Stmt::new(
                StmtKind::Expr { expr, has_semi: false },
                span,
            )));
        }
        Err(self.unexpected("`;` or `}`"))
    }

    fn parse_let_stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Let)?;

        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq)?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::new(
            StmtKind::Let(LetStmt { pattern, ty, init }),
            self.span_from(start),
        ))
    }

    // ==================== Expression Parsing (Pratt) ====================

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse expression with binding power (Pratt parsing)
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let op_kind = self.current_kind().clone();
            let Some((l_bp, r_bp)) = op_kind.infix_binding_power() else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();

            if op_kind == TokenKind::As {
                let ty = self.parse_type()?;
                let span = left.span.merge(&ty.span);
                left = Expr::new(
                    ExprKind::Cast {
                        expr: Box::new(left),
                        ty,
                    },
                    span,
                );
                continue;
            }

            let op = Self::token_to_binop(&op_kind, self.current().span)?;
            let right = self.parse_expr_bp(r_bp)?;
            let span = left.span.merge(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );

            if op_kind.is_comparison() && self.current_kind().is_comparison() {
                return Err(self.unexpected("end of comparison (comparisons do not chain)"));
            }
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        let op = match token.kind {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not => UnOp::Not,
            TokenKind::Star => UnOp::Deref,
            TokenKind::And | TokenKind::AndAnd => UnOp::Borrow,
            _ => return self.parse_primary(),
        };
        self.advance();

        let op = if op == UnOp::Borrow && self.consume(&TokenKind::Mut) {
            UnOp::BorrowMut
        } else {
            op
        };
        let operand = self.parse_expr_bp(PREFIX_BINDING_POWER)?;
        let span = token.span.merge(&operand.span);
        let expr = Expr::new(
            ExprKind::Unary {
                op,
                expr: Box::new(operand),
            },
            span,
        );

        if token.kind == TokenKind::AndAnd {
            // `&&x` is `& &x`
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnOp::Borrow,
                    expr: Box::new(expr),
                },
                span,
            ));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        let expr = match &token.kind {
            TokenKind::IntLit { value, suffix } => {
                self.advance();
                Expr::new(
                    ExprKind::Literal(Literal::Int {
                        value: *value,
                        suffix: suffix.clone(),
                    }),
                    token.span,
                )
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Expr::new(ExprKind::Literal(Literal::Str(s.clone())), token.span)
            }
            TokenKind::CharLit(c) => {
                self.advance();
                Expr::new(ExprKind::Literal(Literal::Char(*c)), token.span)
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Expr::new(
                    ExprKind::Literal(Literal::Bool(token.kind == TokenKind::True)),
                    token.span,
                )
            }

            TokenKind::Ident(_) | TokenKind::SelfValue | TokenKind::SelfType => {
                let path = self.parse_path()?;
                if self.check(&TokenKind::LBrace) && !self.no_struct_literal {
                    self.parse_struct_lit(path, token.span)?
                } else {
                    Expr::new(ExprKind::Path(path), self.span_from(token.span))
                }
            }

            TokenKind::LParen => {
                self.advance();
                if self.consume(&TokenKind::RParen) {
                    Expr::new(ExprKind::Unit, self.span_from(token.span))
                } else {
                    let inner = self.with_struct_literals(false, |p| p.parse_expr())?;
                    self.expect(TokenKind::RParen)?;
                    Expr::new(ExprKind::Grouped(Box::new(inner)), self.span_from(token.span))
                }
            }

            TokenKind::LBracket => {
                self.advance();
                self.with_struct_literals(false, |p| p.parse_array(token.span))?
            }

            TokenKind::LBrace | TokenKind::If | TokenKind::Loop | TokenKind::While => {
                self.parse_block_like()?
            }

            TokenKind::Break => {
                self.advance();
                let value = if self.starts_expr() {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                Expr::new(ExprKind::Break(value), self.span_from(token.span))
            }
            TokenKind::Continue => {
                self.advance();
                Expr::new(ExprKind::Continue, token.span)
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.starts_expr() {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                Expr::new(ExprKind::Return(value), self.span_from(token.span))
            }

            _ => return Err(Error::ExpectedExpr { span: token.span }),
        };

        self.parse_postfix(expr)
    }

    /// Whether the current token can begin an operand of `break`/`return`
    fn starts_expr(&self) -> bool {
        !matches!(
            self.current_kind(),
            TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Comma
                | TokenKind::Eof
        )
    }

    /// `{..}`, `if`, `loop`, `while`
    fn parse_block_like(&mut self) -> Result<Expr> {
        let start = self.current().span;
        match self.current_kind() {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Ok(Expr::new(ExprKind::Block(block), self.span_from(start)))
            }
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Loop => {
                self.advance();
                let body = self.parse_block()?;
                Ok(Expr::new(ExprKind::Loop(body), self.span_from(start)))
            }
            TokenKind::While => {
                self.advance();
                let cond = self.with_struct_literals(true, |p| p.parse_expr())?;
                let body = self.parse_block()?;
                Ok(Expr::new(
                    ExprKind::While {
                        cond: Box::new(cond),
                        body,
                    },
                    self.span_from(start),
                ))
            }
            _ => Err(Error::ExpectedExpr { span: start }),
        }
    }

    fn parse_if_expr(&mut self) -> Result<Expr> {
        let start = self.current().span;
        self.expect(TokenKind::If)?;

        let cond = self.with_struct_literals(true, |p| p.parse_expr())?;
        let then_block = self.parse_block()?;

        let else_branch = if self.consume(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(Box::new(self.parse_if_expr()?))
            } else {
                let block_start = self.current().span;
                let block = self.parse_block()?;
                Some(Box::new(Expr::new(
                    ExprKind::Block(block),
                    self.span_from(block_start),
                )))
            }
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_block,
                else_branch,
            },
            self.span_from(start),
        ))
    }

    /// `a`, `Self`, `A::b`
    fn parse_path(&mut self) -> Result<PathExpr> {
        let first = self.parse_path_segment()?;
        let second = if self.consume(&TokenKind::ColonColon) {
            Some(self.parse_path_segment()?)
        } else {
            None
        };
        Ok(PathExpr {
            first,
            second,
            variant: None,
        })
    }

    fn parse_path_segment(&mut self) -> Result<PathSegment> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Ok(PathSegment::Ident(Ident::new(name, token.span))),
            TokenKind::SelfValue => Ok(PathSegment::SelfValue(token.span)),
            TokenKind::SelfType => Ok(PathSegment::SelfType(token.span)),
            _ => Err(Error::ExpectedIdent { span: token.span }),
        }
    }

    fn parse_struct_lit(&mut self, path: PathExpr, start: Span) -> Result<Expr> {
        self.expect(TokenKind::LBrace)?;

        let fields = self.with_struct_literals(false, |p| {
            let mut fields = Vec::new();
            while !p.check(&TokenKind::RBrace) && !p.is_at_end() {
                let name = p.parse_ident()?;
                let value = if p.consume(&TokenKind::Colon) {
                    p.parse_expr()?
                } else {
                    // Shorthand `P { x }`
                    Expr::new(
                        ExprKind::Path(PathExpr {
                            first: PathSegment::Ident(name.clone()),
                            second: None,
                            variant: None,
                        }),
                        name.span,
                    )
                };
                fields.push(FieldInit { name, value });
                if !p.consume(&TokenKind::Comma) {
                    break;
                }
            }
            p.expect(TokenKind::RBrace)?;
            Ok(fields)
        })?;

        Ok(Expr::new(
            ExprKind::StructLit { path, fields },
            self.span_from(start),
        ))
    }

    /// After `[`: `[]`, `[a, b]` or `[v; n]`
    fn parse_array(&mut self, start: Span) -> Result<Expr> {
        if self.consume(&TokenKind::RBracket) {
            return Ok(Expr::new(ExprKind::ArrayList(Vec::new()), self.span_from(start)));
        }

        let first = self.parse_expr()?;
        if self.consume(&TokenKind::Semicolon) {
            let len = self.parse_expr()?;
            self.expect(TokenKind::RBracket)?;
            return Ok(Expr::new(
                ExprKind::ArrayRepeat {
                    value: Box::new(first),
                    len: Box::new(len),
                },
                self.span_from(start),
            ));
        }

        let mut elements = vec![first];
        while self.consume(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::ArrayList(elements), self.span_from(start)))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        self.with_struct_literals(false, |p| {
            let mut args = Vec::new();
            while !p.check(&TokenKind::RParen) && !p.is_at_end() {
                args.push(p.parse_expr()?);
                if !p.consume(&TokenKind::Comma) {
                    break;
                }
            }
            p.expect(TokenKind::RParen)?;
            Ok(args)
        })
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.consume(&TokenKind::LParen) {
                let args = self.parse_args()?;
                let span = self.span_from(expr.span);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.consume(&TokenKind::Dot) {
                let name = self.parse_ident()?;
                if self.consume(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    let span = self.span_from(expr.span);
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                        },
                        span,
                    );
                } else {
                    let span = expr.span.merge(&name.span);
                    expr = Expr::new(
                        ExprKind::Field {
                            expr: Box::new(expr),
                            field: name,
                        },
                        span,
                    );
                }
            } else if self.consume(&TokenKind::LBracket) {
                let index = self.with_struct_literals(false, |p| p.parse_expr())?;
                self.expect(TokenKind::RBracket)?;
                let span = self.span_from(expr.span);
                expr = Expr::new(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn token_to_binop(kind: &TokenKind, span: Span) -> Result<BinOp> {
        let op = match kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::Ne => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            TokenKind::AndAnd => BinOp::And,
            TokenKind::OrOr => BinOp::Or,
            TokenKind::And => BinOp::BitAnd,
            TokenKind::Or => BinOp::BitOr,
            TokenKind::Caret => BinOp::BitXor,
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            TokenKind::Eq => BinOp::Assign,
            TokenKind::PlusEq => BinOp::AddAssign,
            TokenKind::MinusEq => BinOp::SubAssign,
            TokenKind::StarEq => BinOp::MulAssign,
            TokenKind::SlashEq => BinOp::DivAssign,
            TokenKind::PercentEq => BinOp::ModAssign,
            TokenKind::AndEq => BinOp::BitAndAssign,
            TokenKind::OrEq => BinOp::BitOrAssign,
            TokenKind::CaretEq => BinOp::BitXorAssign,
            TokenKind::ShlEq => BinOp::ShlAssign,
            TokenKind::ShrEq => BinOp::ShrAssign,
            _ => {
                return Err(Error::UnexpectedToken {
                    expected: "binary operator".to_string(),
                    got: format!("{:?}", kind),
                    span,
                })
            }
        };
        Ok(op)
    }
}

/// A parsed block entry: a statement, or the block's tail expression
enum StmtOrTail {
    Stmt(Stmt),
    Tail(Expr),
}

/// Tokenize and parse `source`
pub fn parse_source(source: &str) -> Result<Crate> {
    let mut parser = Parser::new(Lexer::new(source, 0))?;
    parser.parse_crate()
}
