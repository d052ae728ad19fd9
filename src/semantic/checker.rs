//! Semantic checker
//!
//! Six ordered passes over one crate:
//!
//! 1. hoist items nested in function bodies to the top level
//! 2. declare struct shells, enums, traits and constants; merge impl blocks
//! 3. resolve global constants
//! 4. collect struct fields and every function and method signature
//! 5. validate trait impls and fold every impl of a type into one node
//! 6. check function bodies (see `check_body`)
//!
//! Every pass is fatal on the first violation.

use rustc_hash::FxHashMap;

use crate::frontend::ast::{
    Block, Crate, Expr, ExprKind, Function, ImplBlock, Item, PathSegment, SelfParam,
    Stmt, StmtKind, Type, TypeKind, VarDecl,
};
use crate::semantic::block_ctx::BlockCtx;
use crate::semantic::const_solver::ConstSolver;
use crate::semantic::scope::LocalScope;
use crate::semantic::symbols::SymbolTables;
use crate::types::{PrimitiveType, TypeArena, TypeId};
use crate::utils::{Error, Result, Span};

/// How a method takes `self`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Associated function, no `self`
    None,
    /// `self` / `mut self`
    Value,
    /// `&self`
    Shared,
    /// `&mut self`
    Unique,
}

impl Receiver {
    fn of(self_param: Option<&SelfParam>) -> Self {
        match self_param {
            None => Receiver::None,
            Some(SelfParam::Shorthand { reference: false, .. }) => Receiver::Value,
            Some(SelfParam::Shorthand { mutable: false, .. }) => Receiver::Shared,
            Some(SelfParam::Shorthand { mutable: true, .. }) => Receiver::Unique,
            Some(SelfParam::Typed { .. }) => Receiver::Value,
        }
    }
}

/// State of the function whose body is being checked
#[derive(Debug)]
pub(super) struct FnCtx {
    pub(super) locals: FxHashMap<String, VarDecl>,
    pub(super) ret: TypeId,
}

/// Semantic checker for one crate
#[derive(Debug)]
pub struct Checker {
    pub types: TypeArena,
    pub symbols: SymbolTables,
    /// (struct, method) -> receiver kind
    pub(super) receivers: FxHashMap<(TypeId, String), Receiver>,
    pub(super) scopes: LocalScope,
    pub(super) block_ctx: BlockCtx,
    /// Type named by `Self`
    pub(super) cur_impl: Option<TypeId>,
    pub(super) cur_fn: Option<FnCtx>,
}

impl Checker {
    pub fn new() -> Self {
        let mut checker = Self {
            types: TypeArena::new(),
            symbols: SymbolTables::new(),
            receivers: FxHashMap::default(),
            scopes: LocalScope::new(),
            block_ctx: BlockCtx::new(),
            cur_impl: None,
            cur_fn: None,
        };
        checker.register_builtins();
        checker
    }

    /// Register built-in functions
    fn register_builtins(&mut self) {
        self.define_builtin("printInt", vec![TypeId::I32], TypeId::VOID);
        self.define_builtin("printlnInt", vec![TypeId::I32], TypeId::VOID);
        self.define_builtin("exit", vec![TypeId::I32], TypeId::VOID);
        self.define_builtin("getInt", vec![], TypeId::I32);
    }

    fn define_builtin(&mut self, name: &str, params: Vec<TypeId>, ret: TypeId) {
        let sig = self.types.function(params, ret);
        self.symbols.functions.create(name, sig);
    }

    /// Check a crate, annotating it in place.
    pub fn check(&mut self, krate: &mut Crate) -> Result<()> {
        self.hoist(krate);
        self.declare(krate)?;
        self.resolve_globals(krate)?;
        self.collect(krate)?;
        self.merge_impls(krate)?;
        self.check_bodies(krate)?;
        log::debug!("check finished: {} items, {} types", krate.items.len(), self.types.len());
        Ok(())
    }

    /// Receiver kind of `method` on struct `ty`
    pub fn receiver(&self, ty: TypeId, method: &str) -> Option<Receiver> {
        self.receivers.get(&(ty, method.to_string())).copied()
    }

    // ==================== Pass 1: Hoist ====================

    /// Lift items nested in function bodies to the crate's top level.
    /// Local constants stay where they are.
    pub fn hoist(&mut self, krate: &mut Crate) {
        let mut hoisted = Vec::new();
        for item in &mut krate.items {
            hoist_from_item(item, &mut hoisted);
        }
        // Hoisted functions may themselves contain items.
        let mut next = 0;
        while next < hoisted.len() {
            let mut found = Vec::new();
            hoist_from_item(&mut hoisted[next], &mut found);
            hoisted.append(&mut found);
            next += 1;
        }
        log::debug!("pass 1 (hoist): {} nested items lifted", hoisted.len());
        krate.items.extend(hoisted);
    }

    // ==================== Pass 2: Declare ====================

    fn declare(&mut self, krate: &mut Crate) -> Result<()> {
        for item in &krate.items {
            match item {
                Item::Struct(s) => {
                    let name = &s.name.name;
                    if self.symbols.enums.get(name).is_some()
                        || !self.symbols.structs.create(&mut self.types, name)
                    {
                        return Err(duplicate("struct", name, s.name.span));
                    }
                }
                Item::Enum(e) => {
                    let name = &e.name.name;
                    let mut variants: Vec<String> = Vec::with_capacity(e.variants.len());
                    for variant in &e.variants {
                        if variants.contains(&variant.name) {
                            return Err(duplicate(
                                "variant",
                                &format!("{}::{}", name, variant.name),
                                variant.span,
                            ));
                        }
                        variants.push(variant.name.clone());
                    }
                    if self.symbols.structs.get(name).is_some()
                        || !self.symbols.enums.create(&mut self.types, name, variants)
                    {
                        return Err(duplicate("enum", name, e.name.span));
                    }
                }
                Item::Trait(t) => {
                    if !self.symbols.traits.create(&t.name.name) {
                        return Err(duplicate("trait", &t.name.name, t.name.span));
                    }
                }
                _ => {}
            }
        }

        for item in &mut krate.items {
            if let Item::Const(c) = item {
                let ty = self.resolve_const_type(&mut c.ty)?;
                if !self.symbols.consts.create(&c.name.name, ty) {
                    return Err(duplicate("const", &c.name.name, c.name.span));
                }
            }
        }

        let before = krate.items.len();
        let items = std::mem::take(&mut krate.items);
        let mut first: FxHashMap<String, usize> = FxHashMap::default();
        for item in items {
            match item {
                Item::Impl(imp) => {
                    let key = impl_key(&imp)?;
                    match first.get(&key) {
                        Some(&idx) => {
                            if let Item::Impl(target) = &mut krate.items[idx] {
                                target.methods.extend(imp.methods);
                            }
                        }
                        None => {
                            first.insert(key, krate.items.len());
                            krate.items.push(Item::Impl(imp));
                        }
                    }
                }
                other => krate.items.push(other),
            }
        }

        log::debug!(
            "pass 2 (declare): {} structs, {} enums, {} traits, {} consts; {} impl blocks merged",
            self.symbols.structs.len(),
            self.symbols.enums.len(),
            self.symbols.traits.len(),
            self.symbols.consts.len(),
            before - krate.items.len()
        );
        Ok(())
    }

    // ==================== Pass 3: Resolve globals ====================

    fn resolve_globals(&mut self, krate: &Crate) -> Result<()> {
        let mut solver = ConstSolver::new();
        for item in &krate.items {
            if let Item::Const(c) = item {
                let ty = c.ty.resolved.unwrap_or(TypeId::VOID);
                solver.ask_item(&c.name.name, ty, &c.value);
            }
        }
        let asked = solver.question().len();
        solver.solve(&mut self.types)?;
        for (name, ev) in solver.solution().items() {
            self.symbols.consts.set_value(name, ev.value);
        }
        log::debug!("pass 3 (resolve globals): {} constants resolved", asked);
        Ok(())
    }

    // ==================== Pass 4: Collect ====================

    fn collect(&mut self, krate: &mut Crate) -> Result<()> {
        // Trait contracts. `Self` inside a trait has no concrete type yet.
        for item in &mut krate.items {
            if let Item::Trait(t) = item {
                self.cur_impl = Some(TypeId::VOID);
                for method in &mut t.methods {
                    let sig = self.function_signature(method)?;
                    if !self.symbols.traits.insert_method(&t.name.name, &method.name.name, sig) {
                        self.cur_impl = None;
                        return Err(Error::DuplicateMethod {
                            ty: t.name.name.clone(),
                            method: method.name.name.clone(),
                            span: method.name.span,
                        });
                    }
                }
                self.cur_impl = None;
            }
        }
        krate.items.retain(|item| !matches!(item, Item::Trait(_)));

        for item in &mut krate.items {
            if let Item::Function(f) = item {
                let sig = self.function_signature(f)?;
                if f.name.name == "main" {
                    let ret = self.types.as_function(sig).map(|(_, r)| r).unwrap_or(TypeId::VOID);
                    if ret != TypeId::VOID {
                        return Err(Error::TypeMismatch {
                            expected: "()".to_string(),
                            got: self.types.display(ret),
                            span: f.ret_type.as_ref().map_or(f.span, |t| t.span),
                        });
                    }
                }
                if !self.symbols.functions.create(&f.name.name, sig) {
                    return Err(duplicate("function", &f.name.name, f.name.span));
                }
            }
        }

        for item in &mut krate.items {
            if let Item::Struct(s) = item {
                let Some(id) = self.symbols.structs.get(&s.name.name) else {
                    continue;
                };
                for field in &mut s.fields {
                    let ty = self.resolve_type(&mut field.ty)?;
                    self.types.insert_field(id, &field.name.name, ty, field.name.span)?;
                }
            }
        }

        for item in &mut krate.items {
            if let Item::Impl(imp) = item {
                let target = self.impl_target(&mut imp.target)?;
                self.cur_impl = Some(target);
                for method in &mut imp.methods {
                    let sig = self.function_signature(method)?;
                    self.types.insert_method(target, &method.name.name, sig, method.name.span)?;
                    self.receivers.insert(
                        (target, method.name.name.clone()),
                        Receiver::of(method.self_param.as_ref()),
                    );
                }
                self.cur_impl = None;
            }
        }

        self.types.seal_structs();
        log::debug!(
            "pass 4 (collect): {} functions, {} structs sealed",
            self.symbols.functions.len(),
            self.symbols.structs.len()
        );
        Ok(())
    }

    /// Struct type an impl block attaches to
    fn impl_target(&mut self, target: &mut Type) -> Result<TypeId> {
        let id = self.resolve_type(target)?;
        match self.types.struct_type(id) {
            Some(_) => Ok(id),
            None => Err(Error::NotAStruct {
                ty: self.types.display(id),
                span: target.span,
            }),
        }
    }

    /// Full signature of a function, `self` first for methods.
    fn function_signature(&mut self, f: &mut Function) -> Result<TypeId> {
        let mut params = Vec::with_capacity(f.params.len() + 1);
        if let Some(self_param) = &f.self_param {
            let target = match self.cur_impl {
                Some(target) => target,
                None => {
                    return Err(Error::Unsupported {
                        what: "`self` parameter outside of an impl".to_string(),
                        span: self_param.span(),
                    })
                }
            };
            match self_param {
                SelfParam::Shorthand { reference: true, mutable, .. } => {
                    params.push(self.types.pointer(*mutable, target))
                }
                SelfParam::Shorthand { reference: false, .. } => params.push(target),
                SelfParam::Typed { span, .. } => {
                    return Err(Error::Unsupported {
                        what: "typed `self` parameter".to_string(),
                        span: *span,
                    })
                }
            }
        }
        for param in &mut f.params {
            params.push(self.resolve_type(&mut param.ty)?);
        }
        let ret = match &mut f.ret_type {
            Some(ty) => self.resolve_type(ty)?,
            None => TypeId::VOID,
        };
        let sig = self.types.function(params, ret);
        f.signature = Some(sig);
        Ok(sig)
    }

    // ==================== Pass 5: Merge impls ====================

    fn merge_impls(&mut self, krate: &mut Crate) -> Result<()> {
        for item in &mut krate.items {
            let Item::Impl(imp) = item else { continue };
            let Some(trait_name) = imp.trait_name.take() else {
                continue;
            };
            let ty = imp
                .target
                .resolved
                .map(|id| self.types.display(id))
                .unwrap_or_default();
            let Some(required) = self.symbols.traits.get(&trait_name.name) else {
                return Err(Error::UndefinedTrait {
                    name: trait_name.name,
                    span: trait_name.span,
                });
            };
            if required.len() != imp.methods.len() {
                return Err(Error::IncompleteTraitImpl {
                    trait_name: trait_name.name,
                    ty,
                    detail: format!(
                        "expected {} methods, found {}",
                        required.len(),
                        imp.methods.len()
                    ),
                    span: imp.span,
                });
            }
            if let Some((missing, _)) = required
                .iter()
                .find(|(name, _)| !imp.methods.iter().any(|m| &m.name.name == name))
            {
                return Err(Error::IncompleteTraitImpl {
                    trait_name: trait_name.name.clone(),
                    ty,
                    detail: format!("missing method `{}`", missing),
                    span: imp.span,
                });
            }
        }

        let items = std::mem::take(&mut krate.items);
        let mut first: FxHashMap<TypeId, usize> = FxHashMap::default();
        let mut merged = 0;
        for item in items {
            match item {
                Item::Impl(imp) => {
                    let key = imp.target.resolved.unwrap_or(TypeId::VOID);
                    match first.get(&key) {
                        Some(&idx) => {
                            if let Item::Impl(target) = &mut krate.items[idx] {
                                target.methods.extend(imp.methods);
                            }
                            merged += 1;
                        }
                        None => {
                            first.insert(key, krate.items.len());
                            krate.items.push(Item::Impl(imp));
                        }
                    }
                }
                other => krate.items.push(other),
            }
        }
        log::debug!("pass 5 (merge impls): {} impl blocks folded", merged);
        Ok(())
    }

    // ==================== Pass 6: Check bodies ====================

    fn check_bodies(&mut self, krate: &mut Crate) -> Result<()> {
        let mut checked = 0;
        for item in &mut krate.items {
            match item {
                Item::Function(f) => {
                    self.check_function(f)?;
                    checked += 1;
                }
                Item::Impl(imp) => {
                    self.cur_impl = imp.target.resolved;
                    for method in &mut imp.methods {
                        self.check_function(method)?;
                        checked += 1;
                    }
                    self.cur_impl = None;
                }
                Item::Const(c) => {
                    self.check_expr(&mut c.value)?;
                }
                _ => {}
            }
        }
        log::debug!("pass 6 (check bodies): {} function bodies checked", checked);
        Ok(())
    }

    // ==================== Type Resolution ====================

    /// Resolve a written type, recording the result on the node.
    pub(super) fn resolve_type(&mut self, ty: &mut Type) -> Result<TypeId> {
        let id = match &mut ty.kind {
            TypeKind::Unit => TypeId::VOID,
            TypeKind::Path(PathSegment::SelfType(span)) => match self.cur_impl {
                Some(id) => id,
                None => {
                    return Err(Error::UndefinedType {
                        name: "Self".to_string(),
                        span: *span,
                    })
                }
            },
            TypeKind::Path(PathSegment::SelfValue(span)) => {
                return Err(Error::ExpectedType { span: *span })
            }
            TypeKind::Path(PathSegment::Ident(ident)) => self.type_by_name(&ident.name, ident.span)?,
            TypeKind::Reference { mutable, inner } => {
                let inner = self.resolve_type(inner)?;
                self.types.pointer(*mutable, inner)
            }
            TypeKind::Array { elem, len } => {
                let elem = self.resolve_type(elem)?;
                let len = self.eval_array_len(len)?;
                self.types.array(elem, len)
            }
        };
        ty.resolved = Some(id);
        Ok(id)
    }

    fn type_by_name(&mut self, name: &str, span: Span) -> Result<TypeId> {
        if let Some(prim) = PrimitiveType::from_name(name) {
            return Ok(prim.id());
        }
        match name {
            "str" => return Ok(self.types.string()),
            "String" => {
                let s = self.types.string();
                return Ok(self.types.pointer(false, s));
            }
            _ => {}
        }
        self.symbols
            .structs
            .get(name)
            .or_else(|| self.symbols.enums.get(name))
            .ok_or_else(|| Error::UndefinedType {
                name: name.to_string(),
                span,
            })
    }

    /// Constants are scalar: an integer type, `bool` or `char`.
    pub(super) fn resolve_const_type(&mut self, ty: &mut Type) -> Result<TypeId> {
        if matches!(ty.kind, TypeKind::Array { .. }) {
            return Err(Error::Unsupported {
                what: "array-typed constant".to_string(),
                span: ty.span,
            });
        }
        let id = self.resolve_type(ty)?;
        if self.types.is_integer(id) || id == TypeId::BOOL || id == TypeId::CHAR {
            Ok(id)
        } else {
            Err(Error::Unsupported {
                what: format!("constant of type {}", self.types.display(id)),
                span: ty.span,
            })
        }
    }

    /// Array length: a constant in `0..=u32::MAX`.
    pub(super) fn eval_array_len(&mut self, len: &mut Expr) -> Result<u32> {
        self.check_expr(len)?;
        let ev = ConstSolver::evaluate(&mut self.types, &self.symbols.consts, len)?;
        if !self.types.is_int_like(ev.ty) {
            return Err(Error::TypeMismatch {
                expected: "usize".to_string(),
                got: self.types.display(ev.ty),
                span: len.span,
            });
        }
        u32::try_from(ev.value).map_err(|_| Error::ArraySizeOutOfRange {
            value: ev.value,
            span: len.span,
        })
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(kind: &'static str, name: &str, span: Span) -> Error {
    Error::DuplicateDefinition {
        kind,
        name: name.to_string(),
        span,
    }
}

/// Merge key of an impl block before types are resolved
fn impl_key(imp: &ImplBlock) -> Result<String> {
    let target = match &imp.target.kind {
        TypeKind::Path(PathSegment::Ident(ident)) => ident.name.as_str(),
        _ => {
            return Err(Error::Unsupported {
                what: "impl target must be a named type".to_string(),
                span: imp.target.span,
            })
        }
    };
    Ok(match &imp.trait_name {
        Some(t) => format!("{} for {}", t.name, target),
        None => target.to_string(),
    })
}

// ==================== Hoisting ====================

fn hoist_from_item(item: &mut Item, out: &mut Vec<Item>) {
    match item {
        Item::Function(f) => hoist_from_function(f, out),
        Item::Impl(imp) => imp.methods.iter_mut().for_each(|m| hoist_from_function(m, out)),
        Item::Trait(t) => t.methods.iter_mut().for_each(|m| hoist_from_function(m, out)),
        Item::Const(c) => hoist_from_expr(&mut c.value, out),
        Item::Struct(_) | Item::Enum(_) => {}
    }
}

fn hoist_from_function(f: &mut Function, out: &mut Vec<Item>) {
    if let Some(body) = &mut f.body {
        hoist_from_block(body, out);
    }
}

fn is_hoistable(stmt: &Stmt) -> bool {
    matches!(&stmt.kind, StmtKind::Item(item) if !matches!(**item, Item::Const(_)))
}

fn hoist_from_block(block: &mut Block, out: &mut Vec<Item>) {
    if block.stmts.iter().any(is_hoistable) {
        let stmts = std::mem::take(&mut block.stmts);
        for stmt in stmts {
            if is_hoistable(&stmt) {
                if let StmtKind::Item(item) = stmt.kind {
                    out.push(*item);
                }
            } else {
                block.stmts.push(stmt);
            }
        }
    }
    for stmt in &mut block.stmts {
        match &mut stmt.kind {
            StmtKind::Let(let_stmt) => hoist_from_expr(&mut let_stmt.init, out),
            StmtKind::Expr { expr, .. } => hoist_from_expr(expr, out),
            StmtKind::Item(item) => hoist_from_item(item, out),
            StmtKind::Empty => {}
        }
    }
    if let Some(tail) = &mut block.tail {
        hoist_from_expr(tail, out);
    }
}

fn hoist_from_expr(expr: &mut Expr, out: &mut Vec<Item>) {
    match &mut expr.kind {
        ExprKind::Block(block) | ExprKind::Loop(block) => hoist_from_block(block, out),
        ExprKind::While { cond, body } => {
            hoist_from_expr(cond, out);
            hoist_from_block(body, out);
        }
        ExprKind::If { cond, then_block, else_branch } => {
            hoist_from_expr(cond, out);
            hoist_from_block(then_block, out);
            if let Some(else_branch) = else_branch {
                hoist_from_expr(else_branch, out);
            }
        }
        ExprKind::Grouped(inner)
        | ExprKind::Unary { expr: inner, .. }
        | ExprKind::Cast { expr: inner, .. }
        | ExprKind::Field { expr: inner, .. } => hoist_from_expr(inner, out),
        ExprKind::Break(value) | ExprKind::Return(value) => {
            if let Some(value) = value {
                hoist_from_expr(value, out);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            hoist_from_expr(left, out);
            hoist_from_expr(right, out);
        }
        ExprKind::ArrayList(elems) => elems.iter_mut().for_each(|e| hoist_from_expr(e, out)),
        ExprKind::ArrayRepeat { value, len } => {
            hoist_from_expr(value, out);
            hoist_from_expr(len, out);
        }
        ExprKind::Index { base, index } => {
            hoist_from_expr(base, out);
            hoist_from_expr(index, out);
        }
        ExprKind::StructLit { fields, .. } => {
            fields.iter_mut().for_each(|f| hoist_from_expr(&mut f.value, out))
        }
        ExprKind::Call { callee, args } => {
            hoist_from_expr(callee, out);
            args.iter_mut().for_each(|a| hoist_from_expr(a, out));
        }
        ExprKind::MethodCall { receiver, args, .. } => {
            hoist_from_expr(receiver, out);
            args.iter_mut().for_each(|a| hoist_from_expr(a, out));
        }
        ExprKind::Literal(_) | ExprKind::Path(_) | ExprKind::Unit | ExprKind::Continue => {}
    }
}
