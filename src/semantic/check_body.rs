//! Function body checking
//!
//! Walks statements and expressions depth first, annotating every
//! expression with its type, whether it denotes a mutable place and whether
//! it diverges. Local bindings are renamed through the local scope as they
//! are declared and as they are used.

use rustc_hash::FxHashMap;

use crate::frontend::ast::*;
use crate::semantic::block_ctx::BlockKind;
use crate::semantic::checker::{Checker, FnCtx, Receiver};
use crate::semantic::const_solver::ConstSolver;
use crate::types::{PrimitiveType, ResolvedType, TypeId};
use crate::utils::{Error, Result, Span};

/// What checking one expression yields
#[derive(Debug, Clone, Copy)]
struct Outcome {
    ty: TypeId,
    mutable: bool,
    diverges: bool,
}

impl Outcome {
    fn value(ty: TypeId) -> Self {
        Self { ty, mutable: false, diverges: false }
    }

    fn place(ty: TypeId, mutable: bool) -> Self {
        Self { ty, mutable, diverges: false }
    }

    fn diverging(mut self, diverges: bool) -> Self {
        self.diverges |= diverges;
        self
    }
}

impl Checker {
    // ==================== Functions ====================

    pub(super) fn check_function(&mut self, f: &mut Function) -> Result<()> {
        let Some(sig) = f.signature else {
            return Ok(());
        };
        let Some((params, ret)) = self.types.as_function(sig).map(|(p, r)| (p.to_vec(), r)) else {
            return Ok(());
        };
        let Some(body) = f.body.as_mut() else {
            return Ok(());
        };

        log::trace!("checking body of `{}`", f.name.name);
        self.cur_fn = Some(FnCtx {
            locals: FxHashMap::default(),
            ret,
        });
        self.block_ctx.enter(BlockKind::Function);
        self.scopes.enter_scope();

        let result = self.check_function_body(f.self_param.as_ref(), &mut f.params, &params, ret, body);

        self.scopes.exit_scope();
        self.block_ctx.exit();
        let ctx = self.cur_fn.take();
        result?;
        if let Some(ctx) = ctx {
            f.locals = ctx.locals;
        }
        Ok(())
    }

    fn check_function_body(
        &mut self,
        self_param: Option<&SelfParam>,
        params: &mut [Param],
        sig_params: &[TypeId],
        ret: TypeId,
        body: &mut Block,
    ) -> Result<()> {
        let mut sig_params = sig_params.iter().copied();
        if let Some(self_param) = self_param {
            let ty = sig_params.next().unwrap_or(TypeId::VOID);
            let mutable = matches!(
                self_param,
                SelfParam::Shorthand { reference: false, mutable: true, .. }
            );
            self.declare_local("self".to_string(), ty, mutable);
        }

        for (param, ty) in params.iter_mut().zip(sig_params) {
            match &mut param.pattern {
                Pattern::Identifier { name, by_ref: false, mutable } => {
                    let mangled = self.scopes.create_local(&name.name);
                    name.name = mangled.clone();
                    self.declare_local(mangled, ty, *mutable);
                }
                other => {
                    return Err(Error::Unsupported {
                        what: "parameter pattern other than a plain identifier".to_string(),
                        span: other.span(),
                    })
                }
            }
        }

        let body_ty = self.check_block(body)?;
        if !body.diverges && !self.types.equals(ret, body_ty) {
            let span = body.tail.as_ref().map_or(body.span, |tail| tail.span);
            return Err(self.mismatch(ret, body_ty, span));
        }
        Ok(())
    }

    fn declare_local(&mut self, name: String, ty: TypeId, mutable: bool) {
        if let Some(ctx) = &mut self.cur_fn {
            ctx.locals.insert(name.clone(), VarDecl { name, ty, mutable });
        }
    }

    fn mismatch(&self, expected: TypeId, got: TypeId, span: Span) -> Error {
        Error::TypeMismatch {
            expected: self.types.display(expected),
            got: self.types.display(got),
            span,
        }
    }

    fn invalid_operand(&self, op: &str, ty: TypeId, span: Span) -> Error {
        Error::InvalidOperand {
            op: op.to_string(),
            ty: self.types.display(ty),
            span,
        }
    }

    // ==================== Blocks & Statements ====================

    pub(super) fn check_block(&mut self, block: &mut Block) -> Result<TypeId> {
        self.scopes.enter_scope();
        let result = self.check_block_contents(block);
        self.scopes.exit_scope();
        let ty = result?;
        block.ty = Some(ty);
        Ok(ty)
    }

    fn check_block_contents(&mut self, block: &mut Block) -> Result<TypeId> {
        let mut diverges = false;
        for stmt in &mut block.stmts {
            self.check_stmt(stmt)?;
            diverges |= stmt.diverges;
        }
        let ty = match &mut block.tail {
            Some(tail) => {
                let ty = self.check_expr(tail)?;
                diverges |= tail.diverges;
                ty
            }
            None => TypeId::VOID,
        };
        block.diverges = diverges;
        Ok(ty)
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<()> {
        let diverges = match &mut stmt.kind {
            StmtKind::Empty => false,
            StmtKind::Item(item) => match item.as_mut() {
                Item::Const(c) => {
                    self.check_local_const(c)?;
                    false
                }
                other => {
                    return Err(Error::Unsupported {
                        what: "nested item after hoisting".to_string(),
                        span: other.span(),
                    })
                }
            },
            StmtKind::Let(let_stmt) => self.check_let(let_stmt)?,
            StmtKind::Expr { expr, .. } => {
                self.check_expr(expr)?;
                expr.diverges
            }
        };
        stmt.diverges = diverges;
        Ok(())
    }

    fn check_let(&mut self, let_stmt: &mut LetStmt) -> Result<bool> {
        let ty = self.resolve_type(&mut let_stmt.ty)?;
        self.check_expr(&mut let_stmt.init)?;
        self.fold_to_string(&mut let_stmt.init)?;
        let init_ty = let_stmt.init.ty.unwrap_or(TypeId::VOID);
        if !let_stmt.init.diverges && !self.types.equals(ty, init_ty) {
            return Err(self.mismatch(ty, init_ty, let_stmt.init.span));
        }
        // The initializer is checked before the binding exists.
        self.bind_pattern(&mut let_stmt.pattern, ty)?;
        Ok(let_stmt.init.diverges)
    }

    fn bind_pattern(&mut self, pattern: &mut Pattern, ty: TypeId) -> Result<()> {
        match pattern {
            Pattern::Identifier { name, by_ref, mutable } => {
                let (ty, mutable) = if *by_ref {
                    (self.types.pointer(*mutable, ty), false)
                } else {
                    (ty, *mutable)
                };
                let mangled = self.scopes.create_local(&name.name);
                name.name = mangled.clone();
                self.declare_local(mangled, ty, mutable);
                Ok(())
            }
            Pattern::Reference { mutable, inner, span } => match self.types.pointee(ty) {
                Some((is_mut, elem)) if is_mut || !*mutable => self.bind_pattern(inner, elem),
                _ => Err(Error::TypeMismatch {
                    expected: if *mutable { "&mut _" } else { "&_" }.to_string(),
                    got: self.types.display(ty),
                    span: *span,
                }),
            },
        }
    }

    /// Rename, evaluate against the global constants and register under the
    /// mangled name.
    fn check_local_const(&mut self, c: &mut ConstDef) -> Result<()> {
        let ty = self.resolve_const_type(&mut c.ty)?;
        c.name.name = self.scopes.create_local(&c.name.name);
        self.check_expr(&mut c.value)?;

        let value = {
            let mut solver = ConstSolver::with_knowledge(&self.symbols.consts);
            solver.ask_item(&c.name.name, ty, &c.value);
            solver.solve(&mut self.types)?;
            solver
                .solution()
                .value_of(&c.name.name)
                .map_or(0, |ev| ev.value)
        };

        if !self.symbols.consts.create(&c.name.name, ty) {
            return Err(Error::DuplicateDefinition {
                kind: "const",
                name: c.name.name.clone(),
                span: c.name.span,
            });
        }
        self.symbols.consts.set_value(&c.name.name, value);
        Ok(())
    }

    /// Replace a `.to_string()` call whose text is known by a string literal
    pub(super) fn fold_to_string(&mut self, expr: &mut Expr) -> Result<()> {
        if !matches!(expr.kind, ExprKind::MethodCall { .. }) {
            return Ok(());
        }
        let Some(ty) = expr.ty else {
            return Ok(());
        };
        let text = match self.types.pointee(ty).map(|(_, elem)| self.types.get(elem)) {
            Some(ResolvedType::Str(s)) if !s.is_empty() => s.clone(),
            _ => return Ok(()),
        };
        log::trace!("folded `.to_string()` into {:?}", text);
        expr.kind = ExprKind::Literal(Literal::Str(text));
        self.check_expr(expr)?;
        Ok(())
    }

    // ==================== Expressions ====================

    /// Check an expression and record its type, mutability and divergence.
    pub(super) fn check_expr(&mut self, expr: &mut Expr) -> Result<TypeId> {
        let span = expr.span;
        let out = match &mut expr.kind {
            ExprKind::Literal(lit) => Outcome::value(self.check_literal(lit, span)?),
            ExprKind::Path(path) => self.check_path(path)?,
            ExprKind::Unit => Outcome::value(TypeId::VOID),
            ExprKind::Grouped(inner) => {
                let ty = self.check_expr(inner)?;
                Outcome {
                    ty,
                    mutable: inner.mutable,
                    diverges: inner.diverges,
                }
            }
            ExprKind::Block(block) => {
                let ty = self.check_block(block)?;
                Outcome::value(ty).diverging(block.diverges)
            }
            ExprKind::Unary { op, expr: inner } => self.check_unary(*op, inner, span)?,
            ExprKind::Binary { op, left, right } => self.check_binary(*op, left, right, span)?,
            ExprKind::Cast { expr: inner, ty } => {
                let from = self.check_expr(inner)?;
                let to = self.resolve_type(ty)?;
                let source_ok = self.types.is_int_like(from)
                    || from == TypeId::BOOL
                    || from == TypeId::CHAR
                    || self.types.enum_type(from).is_some();
                let target_ok = self.types.is_integer(to) || to == TypeId::BOOL;
                if !(source_ok && target_ok) {
                    return Err(Error::InvalidCast {
                        from: self.types.display(from),
                        to: self.types.display(to),
                        span,
                    });
                }
                Outcome::value(to).diverging(inner.diverges)
            }
            ExprKind::ArrayList(elems) => self.check_array_list(elems, span)?,
            ExprKind::ArrayRepeat { value, len } => {
                let elem = self.check_expr(value)?;
                let len = self.eval_array_len(len)?;
                Outcome::value(self.types.array(elem, len)).diverging(value.diverges)
            }
            ExprKind::Index { base, index } => self.check_index(base, index)?,
            ExprKind::StructLit { path, fields } => self.check_struct_lit(path, fields, span)?,
            ExprKind::Call { callee, args } => {
                let callee_ty = self.check_expr(callee)?;
                let Some((params, ret)) = self
                    .types
                    .as_function(callee_ty)
                    .map(|(p, r)| (p.to_vec(), r))
                else {
                    return Err(Error::NotCallable {
                        ty: self.types.display(callee_ty),
                        span: callee.span,
                    });
                };
                let diverges = self.check_args(&params, args, span)?;
                Outcome::value(ret).diverging(diverges || callee.diverges)
            }
            ExprKind::MethodCall { receiver, method, args } => {
                self.check_method_call(receiver, method, args, span)?
            }
            ExprKind::Field { expr: inner, field } => {
                let ty = self.check_expr(inner)?;
                let (target, mutable) = match self.types.pointee(ty) {
                    Some((is_mut, elem)) => (elem, is_mut),
                    None => (ty, inner.mutable),
                };
                let Some(st) = self.types.struct_type(target) else {
                    return Err(Error::NotAStruct {
                        ty: self.types.display(ty),
                        span: inner.span,
                    });
                };
                let Some((_, field_ty)) = st.field(&field.name) else {
                    return Err(Error::UnknownField {
                        ty: st.name.clone(),
                        field: field.name.clone(),
                        span: field.span,
                    });
                };
                Outcome::place(field_ty, mutable).diverging(inner.diverges)
            }
            ExprKind::Loop(body) => {
                self.block_ctx.enter(BlockKind::Loop);
                let result = self.check_block(body);
                let frame = self.block_ctx.exit();
                result?;
                match frame.and_then(|f| f.ret) {
                    Some(ty) => Outcome::value(ty),
                    // Only a `break` leaves a `loop`.
                    None => Outcome::value(TypeId::VOID).diverging(true),
                }
            }
            ExprKind::While { cond, body } => {
                let cond_ty = self.check_expr(cond)?;
                if !self.types.equals(TypeId::BOOL, cond_ty) {
                    return Err(self.mismatch(TypeId::BOOL, cond_ty, cond.span));
                }
                self.block_ctx.enter(BlockKind::Loop);
                let result = self.check_block(body);
                let frame = self.block_ctx.exit();
                result?;
                if let Some(ty) = frame.and_then(|f| f.ret) {
                    if ty != TypeId::VOID {
                        return Err(self.mismatch(TypeId::VOID, ty, span));
                    }
                }
                Outcome::value(TypeId::VOID).diverging(cond.diverges)
            }
            ExprKind::If { cond, then_block, else_branch } => {
                self.check_if(cond, then_block, else_branch.as_deref_mut())?
            }
            ExprKind::Break(value) => self.check_break(value.as_deref_mut(), span)?,
            ExprKind::Continue => {
                if self.block_ctx.innermost_loop().is_none() {
                    return Err(Error::ContinueOutsideLoop { span });
                }
                Outcome::value(TypeId::VOID).diverging(true)
            }
            ExprKind::Return(value) => self.check_return(value.as_deref_mut(), span)?,
        };

        expr.ty = Some(out.ty);
        expr.mutable = out.mutable;
        expr.diverges = out.diverges;
        Ok(out.ty)
    }

    fn check_literal(&mut self, lit: &Literal, span: Span) -> Result<TypeId> {
        Ok(match lit {
            Literal::Int { value, suffix: Some(suffix) } => {
                let prim = PrimitiveType::from_name(suffix).filter(|p| p.is_integer());
                match prim.and_then(|p| p.int_range().map(|range| (p, range))) {
                    Some((p, (lo, hi))) if lo <= *value && *value <= hi => p.id(),
                    _ => {
                        return Err(Error::InvalidLiteral {
                            text: format!("{}{}", value, suffix),
                            span,
                        })
                    }
                }
            }
            Literal::Int { value, suffix: None } => self.types.int_literal(*value),
            Literal::Bool(_) => TypeId::BOOL,
            Literal::Char(_) => TypeId::CHAR,
            Literal::Str(_) => {
                let s = self.types.string();
                self.types.pointer(false, s)
            }
        })
    }

    // ==================== Paths ====================

    fn check_path(&mut self, path: &mut PathExpr) -> Result<Outcome> {
        let Some(second) = &path.second else {
            return self.check_single_segment(&mut path.first);
        };
        let owner = match &path.first {
            PathSegment::SelfType(span) => self.cur_impl.ok_or_else(|| Error::UndefinedType {
                name: "Self".to_string(),
                span: *span,
            })?,
            PathSegment::Ident(ident) => self
                .symbols
                .structs
                .get(&ident.name)
                .or_else(|| self.symbols.enums.get(&ident.name))
                .ok_or_else(|| Error::UndefinedType {
                    name: ident.name.clone(),
                    span: ident.span,
                })?,
            PathSegment::SelfValue(span) => {
                return Err(Error::UndefinedType {
                    name: "self".to_string(),
                    span: *span,
                })
            }
        };
        let PathSegment::Ident(member) = second else {
            return Err(Error::Unsupported {
                what: format!("`{}` as a path member", second.as_str()),
                span: second.span(),
            });
        };

        if let Some(st) = self.types.struct_type(owner) {
            return match st.method(&member.name) {
                Some(sig) => Ok(Outcome::value(sig)),
                None => Err(Error::UnknownMethod {
                    ty: st.name.clone(),
                    method: member.name.clone(),
                    span: member.span,
                }),
            };
        }
        let Some(en) = self.types.enum_type(owner) else {
            return Err(Error::NotAStruct {
                ty: self.types.display(owner),
                span: path.first.span(),
            });
        };
        match en.index_of(&member.name) {
            Some(index) => {
                path.variant = Some(index);
                Ok(Outcome::value(owner))
            }
            None => Err(Error::UnknownVariant {
                ty: en.name.clone(),
                variant: member.name.clone(),
                span: member.span,
            }),
        }
    }

    fn check_single_segment(&mut self, segment: &mut PathSegment) -> Result<Outcome> {
        match segment {
            PathSegment::SelfValue(span) => self.lookup_value("self", *span),
            PathSegment::SelfType(span) => match self.cur_impl {
                Some(ty) => Ok(Outcome::value(ty)),
                None => Err(Error::UndefinedType {
                    name: "Self".to_string(),
                    span: *span,
                }),
            },
            PathSegment::Ident(ident) => {
                if let Some(renamed) = self.scopes.get_new_name(&ident.name) {
                    ident.name = renamed.to_string();
                }
                self.lookup_value(&ident.name, ident.span)
            }
        }
    }

    /// locals, then functions, then structs, then constants
    fn lookup_value(&self, name: &str, span: Span) -> Result<Outcome> {
        if let Some(var) = self.cur_fn.as_ref().and_then(|f| f.locals.get(name)) {
            return Ok(Outcome::place(var.ty, var.mutable));
        }
        if let Some(sig) = self.symbols.functions.get(name) {
            return Ok(Outcome::value(sig));
        }
        if let Some(ty) = self.symbols.structs.get(name) {
            return Ok(Outcome::value(ty));
        }
        if let Some(entry) = self.symbols.consts.get(name) {
            return Ok(Outcome::value(entry.ty));
        }
        Err(Error::UndefinedVariable {
            name: name.to_string(),
            span,
        })
    }

    // ==================== Operators ====================

    fn check_unary(&mut self, op: UnOp, inner: &mut Expr, span: Span) -> Result<Outcome> {
        let ty = self.check_expr(inner)?;
        let out = match op {
            UnOp::Neg => {
                if let Some(v) = self.types.literal_value(ty) {
                    let negated = v.checked_neg().ok_or_else(|| Error::InvalidLiteral {
                        text: format!("-{}", v),
                        span,
                    })?;
                    Outcome::value(self.types.int_literal(negated))
                } else if self.types.primitive(ty).is_some_and(|p| p.is_signed()) {
                    Outcome::value(ty)
                } else {
                    return Err(self.invalid_operand(op.as_str(), ty, span));
                }
            }
            UnOp::Not => {
                if ty != TypeId::BOOL && !self.types.is_int_like(ty) {
                    return Err(self.invalid_operand(op.as_str(), ty, span));
                }
                Outcome::value(ty)
            }
            UnOp::Borrow | UnOp::BorrowMut => {
                let mutable = op == UnOp::BorrowMut;
                if mutable && inner.is_place() && !inner.mutable {
                    return Err(Error::BorrowImmutableAsMutable { span });
                }
                Outcome::value(self.types.pointer(mutable, ty))
            }
            UnOp::Deref => match self.types.pointee(ty) {
                Some((mutable, elem)) => Outcome::place(elem, mutable),
                None => {
                    return Err(Error::CannotDeref {
                        ty: self.types.display(ty),
                        span,
                    })
                }
            },
        };
        Ok(out.diverging(inner.diverges))
    }

    fn check_binary(&mut self, op: BinOp, left: &mut Expr, right: &mut Expr, span: Span) -> Result<Outcome> {
        let lt = self.check_expr(left)?;
        self.check_expr(right)?;
        self.fold_to_string(right)?;
        let rt = right.ty.unwrap_or(TypeId::VOID);
        let diverges = left.diverges || right.diverges;

        if op.is_assignment() {
            if !left.is_place() || !left.mutable {
                return Err(Error::AssignToImmutable { span: left.span });
            }
            if op == BinOp::Assign {
                if !right.diverges && !self.types.equals(lt, rt) {
                    return Err(self.mismatch(lt, rt, right.span));
                }
            } else {
                self.check_operands(op, lt, rt, right.span, span)?;
            }
            return Ok(Outcome::value(lt).diverging(diverges));
        }

        let ty = self.check_operands(op, lt, rt, right.span, span)?;
        Ok(Outcome::value(ty).diverging(diverges))
    }

    /// Result type of `lt op rt`
    fn check_operands(&mut self, op: BinOp, lt: TypeId, rt: TypeId, right_span: Span, span: Span) -> Result<TypeId> {
        if op.is_shift() {
            if !self.types.is_int_like(lt) {
                return Err(self.invalid_operand(op.as_str(), lt, span));
            }
            if !self.types.is_int_like(rt) {
                return Err(self.invalid_operand(op.as_str(), rt, right_span));
            }
            return Ok(lt);
        }

        if !self.types.equals(lt, rt) {
            return Err(self.mismatch(lt, rt, right_span));
        }
        // A literal operand takes the other side's concrete type.
        let operand = if self.types.is_literal(lt) { rt } else { lt };
        let int_like = self.types.is_int_like(operand);
        let ok = if op.is_logical() {
            operand == TypeId::BOOL
        } else if op.is_comparison() {
            let scalar = int_like || operand == TypeId::BOOL || operand == TypeId::CHAR;
            match op {
                // Aggregates have no equality.
                BinOp::Eq | BinOp::Ne => {
                    scalar
                        || self.types.enum_type(operand).is_some()
                        || self.types.pointee(operand).is_some()
                }
                _ => scalar,
            }
        } else if op.is_bitwise() {
            int_like || operand == TypeId::BOOL
        } else {
            int_like
        };
        if !ok {
            return Err(self.invalid_operand(op.as_str(), operand, span));
        }
        if op.is_comparison() || op.is_logical() {
            Ok(TypeId::BOOL)
        } else {
            Ok(operand)
        }
    }

    // ==================== Aggregates ====================

    fn check_array_list(&mut self, elems: &mut [Expr], span: Span) -> Result<Outcome> {
        if elems.is_empty() {
            return Err(Error::Unsupported {
                what: "empty array literal".to_string(),
                span,
            });
        }
        let mut tys = Vec::with_capacity(elems.len());
        let mut diverges = false;
        for elem in elems.iter_mut() {
            tys.push(self.check_expr(elem)?);
            diverges |= elem.diverges;
        }
        let elem_ty = tys
            .iter()
            .copied()
            .find(|t| !self.types.is_literal(*t))
            .unwrap_or(tys[0]);
        for (elem, ty) in elems.iter().zip(&tys) {
            if !self.types.equals(elem_ty, *ty) {
                return Err(self.mismatch(elem_ty, *ty, elem.span));
            }
        }
        let len = u32::try_from(elems.len()).map_err(|_| Error::ArraySizeOutOfRange {
            value: elems.len() as i64,
            span,
        })?;
        Ok(Outcome::value(self.types.array(elem_ty, len)).diverging(diverges))
    }

    fn check_index(&mut self, base: &mut Expr, index: &mut Expr) -> Result<Outcome> {
        let base_ty = self.check_expr(base)?;
        let index_ty = self.check_expr(index)?;

        let (array, mutable) = match self.types.pointee(base_ty) {
            Some((is_mut, inner)) if self.types.as_array(inner).is_some() => (inner, is_mut),
            _ => (base_ty, base.mutable),
        };
        let Some((elem, _)) = self.types.as_array(array) else {
            return Err(Error::NotIndexable {
                ty: self.types.display(base_ty),
                span: base.span,
            });
        };
        let index_ok = index_ty == TypeId::USIZE
            || index_ty == TypeId::U32
            || self.types.literal_value(index_ty).is_some_and(|v| v >= 0);
        if !index_ok {
            return Err(self.mismatch(TypeId::USIZE, index_ty, index.span));
        }
        Ok(Outcome::place(elem, mutable).diverging(base.diverges || index.diverges))
    }

    fn check_struct_lit(&mut self, path: &PathExpr, fields: &mut [FieldInit], span: Span) -> Result<Outcome> {
        let id = match (&path.first, &path.second) {
            (PathSegment::SelfType(s), None) => self.cur_impl.ok_or_else(|| Error::UndefinedType {
                name: "Self".to_string(),
                span: *s,
            })?,
            (PathSegment::Ident(ident), None) => match self.symbols.structs.get(&ident.name) {
                Some(id) => id,
                None if self.symbols.enums.get(&ident.name).is_some() => {
                    return Err(Error::NotAStruct {
                        ty: ident.name.clone(),
                        span: ident.span,
                    })
                }
                None => {
                    return Err(Error::UndefinedType {
                        name: ident.name.clone(),
                        span: ident.span,
                    })
                }
            },
            _ => {
                return Err(Error::Unsupported {
                    what: "struct literal path".to_string(),
                    span,
                })
            }
        };
        let Some(st) = self.types.struct_type(id) else {
            return Err(Error::NotAStruct {
                ty: self.types.display(id),
                span,
            });
        };
        let name = st.name.clone();
        let expected = st.fields().to_vec();

        let mut seen: Vec<String> = Vec::with_capacity(fields.len());
        let mut diverges = false;
        for field in fields.iter_mut() {
            if seen.contains(&field.name.name) {
                return Err(Error::DuplicateDefinition {
                    kind: "field",
                    name: format!("{}.{}", name, field.name.name),
                    span: field.name.span,
                });
            }
            let Some((_, field_ty)) = expected.iter().find(|(n, _)| *n == field.name.name) else {
                return Err(Error::UnknownField {
                    ty: name,
                    field: field.name.name.clone(),
                    span: field.name.span,
                });
            };
            self.check_expr(&mut field.value)?;
            self.fold_to_string(&mut field.value)?;
            let value_ty = field.value.ty.unwrap_or(TypeId::VOID);
            if !field.value.diverges && !self.types.equals(*field_ty, value_ty) {
                return Err(self.mismatch(*field_ty, value_ty, field.value.span));
            }
            diverges |= field.value.diverges;
            seen.push(field.name.name.clone());
        }
        if fields.len() != expected.len() {
            return Err(Error::FieldCountMismatch {
                ty: name,
                expected: expected.len(),
                got: fields.len(),
                span,
            });
        }
        Ok(Outcome::value(id).diverging(diverges))
    }

    // ==================== Calls ====================

    /// Check arguments against parameter types; returns whether any diverges
    fn check_args(&mut self, params: &[TypeId], args: &mut [Expr], span: Span) -> Result<bool> {
        if params.len() != args.len() {
            return Err(Error::ArgCountMismatch {
                expected: params.len(),
                got: args.len(),
                span,
            });
        }
        let mut diverges = false;
        for (param, arg) in params.iter().zip(args.iter_mut()) {
            self.check_expr(arg)?;
            self.fold_to_string(arg)?;
            let arg_ty = arg.ty.unwrap_or(TypeId::VOID);
            if !arg.diverges && !self.types.equals(*param, arg_ty) {
                return Err(self.mismatch(*param, arg_ty, arg.span));
            }
            diverges |= arg.diverges;
        }
        Ok(diverges)
    }

    fn check_method_call(&mut self, receiver: &mut Expr, method: &Ident, args: &mut [Expr], span: Span) -> Result<Outcome> {
        let recv_ty = self.check_expr(receiver)?;
        let (target, through) = match self.types.pointee(recv_ty) {
            Some((is_mut, elem)) => (elem, Some(is_mut)),
            None => (recv_ty, None),
        };
        let name = method.name.as_str();

        // Built-in methods
        if name == "len" && self.types.as_array(target).is_some() {
            self.check_args(&[], args, span)?;
            return Ok(Outcome::value(TypeId::USIZE).diverging(receiver.diverges));
        }
        if name == "to_string" && self.types.is_int_like(target) {
            self.check_args(&[], args, span)?;
            let text = match self.types.literal_value(target) {
                Some(v) => self.types.str_type(&v.to_string()),
                None => self.types.string(),
            };
            let ty = self.types.pointer(false, text);
            return Ok(Outcome::value(ty).diverging(receiver.diverges));
        }

        let Some(st) = self.types.struct_type(target) else {
            return Err(Error::UnknownMethod {
                ty: self.types.display(recv_ty),
                method: method.name.clone(),
                span: method.span,
            });
        };
        let unknown = || Error::UnknownMethod {
            ty: st.name.clone(),
            method: method.name.clone(),
            span: method.span,
        };
        let Some(sig) = st.method(name) else {
            return Err(unknown());
        };
        let receiver_kind = self.receiver(target, name).unwrap_or(Receiver::None);
        if receiver_kind == Receiver::None {
            return Err(unknown());
        }
        if receiver_kind == Receiver::Unique && !through.unwrap_or(receiver.mutable) {
            return Err(Error::MutSelfOnImmutable {
                method: method.name.clone(),
                span: receiver.span,
            });
        }

        let Some((params, ret)) = self
            .types
            .as_function(sig)
            .map(|(p, r)| (p.iter().skip(1).copied().collect::<Vec<_>>(), r))
        else {
            return Err(Error::NotCallable {
                ty: self.types.display(sig),
                span,
            });
        };
        let diverges = self.check_args(&params, args, span)?;
        Ok(Outcome::value(ret).diverging(diverges || receiver.diverges))
    }

    // ==================== Control Flow ====================

    fn check_if(&mut self, cond: &mut Expr, then_block: &mut Block, else_branch: Option<&mut Expr>) -> Result<Outcome> {
        let cond_ty = self.check_expr(cond)?;
        if !self.types.equals(TypeId::BOOL, cond_ty) {
            return Err(self.mismatch(TypeId::BOOL, cond_ty, cond.span));
        }
        let then_ty = self.check_block(then_block)?;
        let Some(else_branch) = else_branch else {
            if !then_block.diverges && then_ty != TypeId::VOID && !tail_is_assignment(then_block) {
                let span = then_block.tail.as_ref().map_or(then_block.span, |tail| tail.span);
                return Err(self.mismatch(TypeId::VOID, then_ty, span));
            }
            return Ok(Outcome::value(TypeId::VOID).diverging(cond.diverges));
        };
        let else_ty = self.check_expr(else_branch)?;

        let (ty, diverges) = match (then_block.diverges, else_branch.diverges) {
            (true, true) => (TypeId::VOID, true),
            (true, false) => (else_ty, false),
            (false, true) => (then_ty, false),
            (false, false) => {
                if !self.types.equals(then_ty, else_ty) {
                    return Err(self.mismatch(then_ty, else_ty, else_branch.span));
                }
                let ty = if self.types.is_literal(then_ty) { else_ty } else { then_ty };
                (ty, false)
            }
        };
        Ok(Outcome::value(ty).diverging(diverges || cond.diverges))
    }

    fn check_break(&mut self, value: Option<&mut Expr>, span: Span) -> Result<Outcome> {
        let value_ty = match value {
            Some(value) => {
                self.check_expr(value)?;
                self.fold_to_string(value)?;
                value.ty.unwrap_or(TypeId::VOID)
            }
            None => TypeId::VOID,
        };
        let previous = match self.block_ctx.innermost_loop() {
            Some(frame) => frame.ret,
            None => return Err(Error::BreakOutsideLoop { span }),
        };
        // First `break` fixes the loop type; a literal gives way to a concrete type.
        let unified = match previous {
            None => value_ty,
            Some(prev) if !self.types.equals(prev, value_ty) => {
                return Err(self.mismatch(prev, value_ty, span))
            }
            Some(prev) if self.types.is_literal(prev) => value_ty,
            Some(prev) => prev,
        };
        if let Some(frame) = self.block_ctx.innermost_loop() {
            frame.ret = Some(unified);
        }
        Ok(Outcome::value(TypeId::VOID).diverging(true))
    }

    fn check_return(&mut self, value: Option<&mut Expr>, span: Span) -> Result<Outcome> {
        let ret = match &self.cur_fn {
            Some(ctx) if self.block_ctx.in_scope(BlockKind::Function) => ctx.ret,
            _ => return Err(Error::ReturnOutsideFunction { span }),
        };
        let (value_ty, value_span, value_diverges) = match value {
            Some(value) => {
                self.check_expr(value)?;
                self.fold_to_string(value)?;
                (value.ty.unwrap_or(TypeId::VOID), value.span, value.diverges)
            }
            None => (TypeId::VOID, span, false),
        };
        if !value_diverges && !self.types.equals(ret, value_ty) {
            return Err(self.mismatch(ret, value_ty, value_span));
        }
        if let Some(frame) = self.block_ctx.last_mut(BlockKind::Function) {
            frame.ret.get_or_insert(value_ty);
        }
        Ok(Outcome::value(TypeId::VOID).diverging(true))
    }
}

/// An assignment in tail position only produces a value for chaining.
fn tail_is_assignment(block: &Block) -> bool {
    matches!(
        block.tail.as_deref(),
        Some(Expr { kind: ExprKind::Binary { op, .. }, .. }) if op.is_assignment()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check_source;
    use pretty_assertions::assert_eq;

    fn check(source: &str) -> Result<(Crate, Checker)> {
        check_source(source)
    }

    fn function<'a>(krate: &'a Crate, name: &str) -> &'a Function {
        krate
            .items
            .iter()
            .find_map(|item| match item {
                Item::Function(f) if f.name.name == name => Some(f),
                _ => None,
            })
            .unwrap()
    }

    fn lets(f: &Function) -> Vec<&LetStmt> {
        f.body
            .as_ref()
            .unwrap()
            .stmts
            .iter()
            .filter_map(|s| match &s.kind {
                StmtKind::Let(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_array_bound_resolved() {
        let (krate, checker) = check("fn main() { let a: [i32; 2 + 3] = [0; 2 + 3]; }").unwrap();
        let main = function(&krate, "main");
        let a = lets(main)[0];
        assert_eq!(checker.types.display(a.ty.resolved.unwrap()), "[i32; 5]");
        let init = checker.types.as_array(a.init.ty.unwrap()).unwrap();
        assert_eq!(init.1, 5);
    }

    #[test]
    fn test_negative_array_bound() {
        let err = check("fn main() { let b: [i32; -1] = [0; 1]; }").unwrap_err();
        assert_eq!(err, Error::ArraySizeOutOfRange { value: -1, span: err.span().unwrap() });
    }

    #[test]
    fn test_non_constant_array_bound() {
        let err = check("fn main() { let n: usize = 3; let a: [i32; 3] = [0; n]; }").unwrap_err();
        assert!(matches!(err, Error::IllegalConstExpr { .. }));
    }

    #[test]
    fn test_assign_to_immutable() {
        let err = check("fn main() { let x: i32 = 0; x = 1; }").unwrap_err();
        assert!(matches!(err, Error::AssignToImmutable { .. }));
        assert!(check("fn main() { let mut x: i32 = 0; x = 1; x += 2; }").is_ok());
    }

    #[test]
    fn test_assign_through_pointers() {
        assert!(check("fn set(p: &mut i32) { *p = 3; } fn main() {}").is_ok());
        assert!(matches!(
            check("fn set(p: &i32) { *p = 3; } fn main() {}"),
            Err(Error::AssignToImmutable { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: i32 = 1; let r: &mut i32 = &mut x; }"),
            Err(Error::BorrowImmutableAsMutable { .. })
        ));
        assert!(check("fn main() { let mut x: i32 = 1; let r: &mut i32 = &mut x; *r = 2; }").is_ok());
    }

    #[test]
    fn test_break_unification() {
        let (krate, checker) = check(
            "fn main() { let c: bool = true; let v: i32 = loop { if (c) { break 1; } break 2; }; }",
        )
        .unwrap();
        let v = lets(function(&krate, "main"))[1];
        assert!(checker.types.equals(TypeId::I32, v.init.ty.unwrap()));
        assert!(!v.init.diverges);

        let err = check("fn main() { loop { break 1; break true; } }").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_break_and_continue_need_a_loop() {
        assert!(matches!(
            check("fn main() { break; }"),
            Err(Error::BreakOutsideLoop { .. })
        ));
        assert!(matches!(
            check("fn main() { continue; }"),
            Err(Error::ContinueOutsideLoop { .. })
        ));
        assert!(check("fn main() { let mut i: i32 = 0; while i < 3 { i += 1; continue; } }").is_ok());
    }

    #[test]
    fn test_loop_without_break_diverges() {
        assert!(check("fn f() -> i32 { loop { } } fn main() {}").is_ok());
        assert!(check("fn f() -> i32 { let mut i: i32 = 0; loop { i += 1; if i > 3 { return i; } } } fn main() {}").is_ok());
    }

    #[test]
    fn test_if_else_unification() {
        assert!(check("fn f(c: bool) -> i32 { if c { 1 } else { return 2; } } fn main() {}").is_ok());
        assert!(check("fn f(c: bool) -> i32 { if c { return 1; } else { return 2; } } fn main() {}").is_ok());
        assert!(check("fn f(c: bool) -> u32 { if c { 1 } else if !c { 2 } else { 3 } } fn main() {}").is_ok());
        assert!(matches!(
            check("fn f(c: bool) -> i32 { if c { 1 } else { true } } fn main() {}"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("fn main() { if 1 { } }"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_tail_is_mismatch() {
        assert!(matches!(
            check("fn f() -> i32 { let x: i32 = 1; } fn main() {}"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("fn f() -> i32 { return; } fn main() {}"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(check("fn f() { return; } fn main() {}").is_ok());
    }

    #[test]
    fn test_mut_self_needs_mutable_receiver() {
        let prelude = "struct C { n: i32 } impl C { fn inc(&mut self) { self.n += 1; } fn get(&self) -> i32 { self.n } }";
        let err = check(&format!("{} fn main() {{ let c: C = C {{ n: 0 }}; c.inc(); }}", prelude)).unwrap_err();
        assert!(matches!(err, Error::MutSelfOnImmutable { .. }));

        let err = check(&format!(
            "{} fn main() {{ let mut c: C = C {{ n: 0 }}; let r: &C = &c; r.inc(); }}",
            prelude
        ))
        .unwrap_err();
        assert!(matches!(err, Error::MutSelfOnImmutable { .. }));

        assert!(check(&format!(
            "{} fn main() {{ let mut c: C = C {{ n: 0 }}; c.inc(); let r: &mut C = &mut c; r.inc(); let v: i32 = r.get(); }}",
            prelude
        ))
        .is_ok());
    }

    #[test]
    fn test_method_arguments() {
        let prelude = "struct A { v: i32 } impl A { fn add(&self, x: i32) -> i32 { self.v + x } }";
        assert!(check(&format!("{} fn main() {{ let a: A = A {{ v: 1 }}; let s: i32 = a.add(2); }}", prelude)).is_ok());
        assert!(matches!(
            check(&format!("{} fn main() {{ let a: A = A {{ v: 1 }}; a.add(); }}", prelude)),
            Err(Error::ArgCountMismatch { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            check(&format!("{} fn main() {{ let a: A = A {{ v: 1 }}; a.add(true); }}", prelude)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            check(&format!("{} fn main() {{ let a: A = A {{ v: 1 }}; a.sub(1); }}", prelude)),
            Err(Error::UnknownMethod { .. })
        ));
        // associated function called through the type path
        assert!(check(&format!(
            "{} impl A {{ fn make() -> A {{ A {{ v: 0 }} }} }} fn main() {{ let a: A = A::make(); let b: i32 = A::add(&a, 1); }}",
            prelude
        ))
        .is_ok());
    }

    #[test]
    fn test_struct_literal_rules() {
        let prelude = "struct P { x: i32, y: i32 }";
        assert!(check(&format!("{} fn main() {{ let x: i32 = 1; let p: P = P {{ x, y: 2 }}; }}", prelude)).is_ok());
        assert!(matches!(
            check(&format!("{} fn main() {{ let p: P = P {{ x: 1 }}; }}", prelude)),
            Err(Error::FieldCountMismatch { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            check(&format!("{} fn main() {{ let p: P = P {{ x: 1, x: 2 }}; }}", prelude)),
            Err(Error::DuplicateDefinition { kind: "field", .. })
        ));
        assert!(matches!(
            check(&format!("{} fn main() {{ let p: P = P {{ x: 1, z: 2 }}; }}", prelude)),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            check(&format!("{} fn main() {{ let p: P = P {{ x: 1, y: 2 }}; let z: i32 = p.z; }}", prelude)),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_indexing() {
        assert!(check(
            "fn main() { let a: [i32; 3] = [1, 2, 3]; let i: usize = 1; let v: i32 = a[i] + a[2]; }"
        )
        .is_ok());
        assert!(check("fn f(a: &mut [u32; 2]) { a[0] = 7; } fn main() {}").is_ok());
        assert!(matches!(
            check("fn main() { let a: [i32; 3] = [1, 2, 3]; let i: i32 = 1; let v: i32 = a[i]; }"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("fn main() { let a: [i32; 3] = [1, 2, 3]; a[0] = 1; }"),
            Err(Error::AssignToImmutable { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: i32 = 1; let v: i32 = x[0]; }"),
            Err(Error::NotIndexable { .. })
        ));
        assert!(matches!(
            check("fn main() { let a: [i32; 2] = [1, true]; }"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_builtin_methods() {
        assert!(check("fn f(a: &[i32; 4]) -> usize { a.len() } fn main() {}").is_ok());

        let (krate, _) = check("fn main() { let s: String = 5.to_string(); }").unwrap();
        let s = lets(function(&krate, "main"))[0];
        assert_eq!(s.init.kind, ExprKind::Literal(Literal::Str("5".to_string())));
    }

    #[test]
    fn test_local_const_renamed() {
        let (krate, checker) = check(
            "const N: usize = 2; fn main() { const M: usize = N + 1; let a: [i32; M] = [0; M]; }",
        )
        .unwrap();
        let (name, entry) = checker
            .symbols
            .consts
            .iter()
            .into_iter()
            .find(|(n, _)| n.starts_with("_M_"))
            .map(|(n, e)| (n.to_string(), e))
            .unwrap();
        assert_eq!(entry.value, 3);
        let a = lets(function(&krate, "main"))[0];
        assert_eq!(checker.types.display(a.ty.resolved.unwrap()), "[i32; 3]");
        let TypeKind::Array { len, .. } = &a.ty.kind else { panic!() };
        let ExprKind::Path(path) = &len.kind else { panic!() };
        assert_eq!(path.first.as_str(), name);
    }

    #[test]
    fn test_shadowing_gets_fresh_names() {
        let (krate, checker) = check(
            "fn main() { let x: i32 = 1; { let x: bool = true; } let y: i32 = x; }",
        )
        .unwrap();
        let main = function(&krate, "main");
        assert_eq!(main.locals.len(), 3);
        let y = lets(main)[1];
        let ExprKind::Path(path) = &y.init.kind else { panic!() };
        let local = &main.locals[path.first.as_str()];
        assert_eq!(local.ty, TypeId::I32);
        assert!(!checker.types.equals(local.ty, TypeId::BOOL));
    }

    #[test]
    fn test_enum_variants() {
        let (krate, _) = check("enum Color { Red, Green } fn main() { let c: Color = Color::Green; }").unwrap();
        let c = lets(function(&krate, "main"))[0];
        let ExprKind::Path(path) = &c.init.kind else { panic!() };
        assert_eq!(path.variant, Some(1));
        assert!(matches!(
            check("enum Color { Red } fn main() { let c: Color = Color::Blue; }"),
            Err(Error::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_casts() {
        assert!(check("enum E { A } fn main() { let x: i32 = true as i32; let y: usize = 'a' as usize; let z: u32 = E::A as u32; }").is_ok());
        assert!(matches!(
            check("struct P {} fn main() { let p: P = 1 as P; }"),
            Err(Error::InvalidCast { .. })
        ));
    }

    #[test]
    fn test_literal_suffixes() {
        assert!(check("fn main() { let x: u32 = 300u32; let y: usize = 7usize; }").is_ok());
        assert!(matches!(
            check("fn main() { let x: u32 = 5i32; }"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: u32 = 4294967296u32; }"),
            Err(Error::InvalidLiteral { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: i32 = 3000000000; }"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_operators() {
        assert!(check(
            "fn main() { let x: u32 = 1; let y: u32 = x << 2; let b: bool = x > 0 && y != 4 || !true; let m: bool = true & false; }"
        )
        .is_ok());
        assert!(matches!(
            check("fn main() { let b: bool = true + false; }"),
            Err(Error::InvalidOperand { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: i32 = 1; let y: u32 = 2; let z: i32 = x + y; }"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: u32 = 1; let y: u32 = -x; }"),
            Err(Error::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_undefined_names() {
        assert!(matches!(
            check("fn main() { let x: i32 = y; }"),
            Err(Error::UndefinedVariable { .. })
        ));
        assert!(matches!(
            check("fn main() { let x: i32 = 1; { let z: i32 = 2; } let w: i32 = z; }"),
            Err(Error::UndefinedVariable { .. })
        ));
        assert!(matches!(
            check("fn main() { undefined(); }"),
            Err(Error::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_calls() {
        assert!(check("fn add(a: i32, b: i32) -> i32 { a + b } fn main() { printInt(add(1, getInt())); }").is_ok());
        assert!(matches!(
            check("fn main() { printInt(1, 2); }"),
            Err(Error::ArgCountMismatch { expected: 1, got: 2, .. })
        ));
        assert!(matches!(
            check("fn main() { let x: i32 = 1; x(); }"),
            Err(Error::NotCallable { .. })
        ));
    }

    #[test]
    fn test_reference_pattern_in_let() {
        assert!(check("fn main() { let x: i32 = 1; let &y: &i32 = &x; let z: i32 = y; }").is_ok());
        assert!(matches!(
            check("fn main() { let x: i32 = 1; let &y: i32 = x; }"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_parameter_patterns_are_identifiers() {
        assert!(matches!(
            check("fn f(&x: &i32) {} fn main() {}"),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn test_expressions_record_mutability() {
        let (krate, _) = check("struct P { x: i32 } fn main() { let mut p: P = P { x: 1 }; p.x = 2; }").unwrap();
        let main = function(&krate, "main");
        let StmtKind::Expr { expr, .. } = &main.body.as_ref().unwrap().stmts[1].kind else { panic!() };
        let ExprKind::Binary { left, .. } = &expr.kind else { panic!() };
        assert!(left.mutable);
        assert_eq!(left.ty, Some(TypeId::I32));
    }

    #[test]
    fn test_to_string_outside_folded_positions() {
        assert!(check("fn f() -> String { 5.to_string() } fn main() {}").is_ok());
        assert!(check(
            "fn main() { let c: bool = true; let s: String = if c { 5.to_string() } else { 6.to_string() }; }"
        )
        .is_ok());
        assert!(check("fn g(c: bool) -> String { if c { 5.to_string() } else { 6.to_string() } } fn main() {}").is_ok());
    }

    #[test]
    fn test_equality_excludes_aggregates() {
        assert!(matches!(
            check("struct P { x: i32 } fn main() { let p: P = P { x: 1 }; let q: P = P { x: 1 }; let b: bool = p == q; }"),
            Err(Error::InvalidOperand { .. })
        ));
        assert!(matches!(
            check("fn main() { let a: [i32; 2] = [1, 2]; let b: bool = a != a; }"),
            Err(Error::InvalidOperand { .. })
        ));
        assert!(check(
            "enum E { A, B } fn main() { let e: E = E::A; let x: i32 = 1; let r: &i32 = &x; \
             let b: bool = e == E::B && r == r && 'a' != 'b' && true == false; }"
        )
        .is_ok());
    }

    #[test]
    fn test_if_without_else_is_unit() {
        assert!(matches!(
            check("fn main() { let c: bool = true; if c { 5 } }"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(check("fn main() { let c: bool = true; let mut x: i32 = 0; if c { x = 5 } if c { printInt(x); } }").is_ok());
        assert!(check("fn f(c: bool) -> i32 { if c { return 5 } 6 } fn main() {}").is_ok());
    }
}
