//! Compile-time constant evaluation
//!
//! A [`ConstSolver`] is built for one solve: the global `const` items of a
//! crate, a local `const`, or a free-standing expression such as an array
//! length. Items may refer to one another in any order; the solver scans
//! the outstanding question repeatedly and stops as soon as a full scan
//! resolves nothing new. Whatever is left at that point is a cycle or a
//! reference to something that is not constant.
//!
//! Only `+ - * /` fold. Any other binary operator, borrows and dereferences
//! are rejected outright, as are division by zero and `i64` overflow.

use rustc_hash::FxHashMap;

use crate::frontend::ast::{BinOp, Expr, ExprKind, Literal, PathSegment, TypeKind, UnOp};
use crate::semantic::symbols::{ConstEntry, ConstTable};
use crate::types::{PrimitiveType, TypeArena, TypeId};
use crate::utils::{Error, Result, Span};

// ==================== Evaluation ====================

/// Outcome of evaluating one expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub ty: TypeId,
    /// `false` means "not known yet"; the node is retried next scan
    pub is_const: bool,
    pub value: i64,
}

impl Evaluation {
    /// Nothing known about the expression
    pub fn unknown() -> Self {
        Self {
            ty: TypeId::VOID,
            is_const: false,
            value: 0,
        }
    }

    /// Type known, value pending
    pub fn pending(ty: TypeId) -> Self {
        Self {
            ty,
            is_const: false,
            value: 0,
        }
    }

    pub fn constant(ty: TypeId, value: i64) -> Self {
        Self {
            ty,
            is_const: true,
            value,
        }
    }
}

// ==================== Solver State ====================

/// Already-resolved const tables, searched newest first
#[derive(Debug, Default)]
pub struct PrioriKnowledge<'a> {
    tables: Vec<&'a ConstTable>,
}

impl<'a> PrioriKnowledge<'a> {
    pub fn push(&mut self, table: &'a ConstTable) {
        self.tables.push(table);
    }

    pub fn lookup(&self, name: &str) -> Option<ConstEntry> {
        self.tables.iter().rev().find_map(|t| t.get(name))
    }
}

#[derive(Debug, Clone, Copy)]
struct ItemQuestion<'a> {
    name: &'a str,
    ty: TypeId,
    expr: &'a Expr,
}

/// What is still unresolved
#[derive(Debug, Default)]
pub struct Question<'a> {
    items: Vec<ItemQuestion<'a>>,
    exprs: Vec<&'a Expr>,
}

impl<'a> Question<'a> {
    pub fn item_len(&self) -> usize {
        self.items.len()
    }

    pub fn expr_len(&self) -> usize {
        self.exprs.len()
    }

    pub fn len(&self) -> usize {
        self.item_len() + self.expr_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What has been resolved
#[derive(Debug, Default)]
pub struct Solution<'a> {
    values: FxHashMap<&'a str, Evaluation>,
    items: Vec<(&'a str, Evaluation)>,
    exprs: Vec<(&'a Expr, Evaluation)>,
    iterations: usize,
}

impl<'a> Solution<'a> {
    /// Current knowledge about a named item (declared type if still pending)
    pub fn value_of(&self, name: &str) -> Option<Evaluation> {
        self.values.get(name).copied()
    }

    /// Resolved items in resolution order
    pub fn items(&self) -> &[(&'a str, Evaluation)] {
        &self.items
    }

    /// Result for a question expression, matched by node identity
    pub fn expr_value(&self, expr: &Expr) -> Option<Evaluation> {
        self.exprs
            .iter()
            .find(|(e, _)| std::ptr::eq(*e, expr))
            .map(|(_, ev)| *ev)
    }

    /// Scans made by the last `solve`, including the final one that made
    /// no progress or emptied the question
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

// ==================== Solver ====================

#[derive(Debug, Default)]
pub struct ConstSolver<'a> {
    knowledge: PrioriKnowledge<'a>,
    question: Question<'a>,
    solution: Solution<'a>,
    /// First type error met; the solve fails once it is set
    failure: Option<Error>,
}

impl<'a> ConstSolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_knowledge(table: &'a ConstTable) -> Self {
        let mut solver = Self::new();
        solver.knowledge.push(table);
        solver
    }

    pub fn add_knowledge(&mut self, table: &'a ConstTable) {
        self.knowledge.push(table);
    }

    /// Ask for a named constant of declared type `ty`
    pub fn ask_item(&mut self, name: &'a str, ty: TypeId, expr: &'a Expr) {
        self.question.items.push(ItemQuestion { name, ty, expr });
    }

    /// Ask for the value of a free-standing expression
    pub fn ask_expr(&mut self, expr: &'a Expr) {
        self.question.exprs.push(expr);
    }

    pub fn question(&self) -> &Question<'a> {
        &self.question
    }

    pub fn solution(&self) -> &Solution<'a> {
        &self.solution
    }

    /// Evaluate one expression against `table`
    pub fn evaluate(types: &mut TypeArena, table: &ConstTable, expr: &Expr) -> Result<Evaluation> {
        let mut solver = ConstSolver::with_knowledge(table);
        solver.ask_expr(expr);
        solver.solve(types)?;
        solver
            .solution
            .expr_value(expr)
            .ok_or_else(|| Error::IllegalConstExpr {
                reason: "expression is not a compile-time constant".to_string(),
                span: expr.span,
            })
    }

    /// Run the fixed-point loop until nothing more resolves.
    pub fn solve(&mut self, types: &mut TypeArena) -> Result<()> {
        // Declared types are visible before any value is.
        for item in &self.question.items {
            self.solution
                .values
                .insert(item.name, Evaluation::pending(item.ty));
        }

        let mut iteration = 0;
        loop {
            let before = self.question.len();
            iteration += 1;

            self.check_items(types)?;
            self.check_exprs(types)?;

            log::trace!(
                "const solve iteration {}: {} items and {} expressions left",
                iteration,
                self.question.item_len(),
                self.question.expr_len()
            );

            if self.question.is_empty() || self.question.len() == before {
                break;
            }
        }
        self.solution.iterations = iteration;

        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        if let Some(first) = self.question.items.first() {
            return Err(Error::UnresolvedConstants {
                names: self.question.items.iter().map(|i| i.name.to_string()).collect(),
                span: first.expr.span,
            });
        }
        if let Some(first) = self.question.exprs.first() {
            return Err(Error::IllegalConstExpr {
                reason: "expression is not a compile-time constant".to_string(),
                span: first.span,
            });
        }

        log::debug!(
            "const solve converged after {} iterations ({} items)",
            iteration,
            self.solution.items.len()
        );
        Ok(())
    }

    fn check_items(&mut self, types: &mut TypeArena) -> Result<()> {
        let mut i = 0;
        while i < self.question.items.len() {
            let item = self.question.items[i];
            let result = self.check_expr(types, item.expr)?;

            if !types.equals(item.ty, result.ty) {
                if self.failure.is_none() {
                    self.failure = Some(Error::TypeMismatch {
                        expected: types.display(item.ty),
                        got: types.display(result.ty),
                        span: item.expr.span,
                    });
                }
                i += 1;
            } else if result.is_const {
                check_range(types, item.ty, result.value, item.expr.span)?;
                let ev = Evaluation::constant(item.ty, result.value);
                self.solution.values.insert(item.name, ev);
                self.solution.items.push((item.name, ev));
                self.question.items.remove(i);
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn check_exprs(&mut self, types: &mut TypeArena) -> Result<()> {
        let mut i = 0;
        while i < self.question.exprs.len() {
            let expr = self.question.exprs[i];
            let result = self.check_expr(types, expr)?;
            if result.is_const {
                self.solution.exprs.push((expr, result));
                self.question.exprs.remove(i);
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn get_value(&self, name: &str) -> Evaluation {
        if let Some(ev) = self.solution.value_of(name) {
            return ev;
        }
        match self.knowledge.lookup(name) {
            Some(entry) => Evaluation::constant(entry.ty, entry.value),
            None => Evaluation::unknown(),
        }
    }

    fn check_expr(&self, types: &mut TypeArena, expr: &Expr) -> Result<Evaluation> {
        match &expr.kind {
            ExprKind::Grouped(inner) => self.check_expr(types, inner),

            ExprKind::Literal(Literal::Bool(b)) => Ok(Evaluation::constant(TypeId::BOOL, *b as i64)),
            ExprKind::Literal(Literal::Char(c)) => Ok(Evaluation::constant(TypeId::CHAR, *c as i64)),
            ExprKind::Literal(Literal::Int { value, suffix }) => {
                let ty = match suffix {
                    Some(suffix) => match PrimitiveType::from_name(suffix) {
                        Some(p) if p.is_integer() => p.id(),
                        _ => {
                            return Err(Error::InvalidLiteral {
                                text: format!("{}{}", value, suffix),
                                span: expr.span,
                            })
                        }
                    },
                    None => types.int_literal(*value),
                };
                check_range(types, ty, *value, expr.span)?;
                Ok(Evaluation::constant(ty, *value))
            }
            ExprKind::Literal(Literal::Str(_)) => Ok(Evaluation::unknown()),

            ExprKind::Binary { op, left, right } => {
                if !matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div) {
                    return Err(Error::IllegalConstExpr {
                        reason: format!("operator `{}` is not allowed in a constant", op.as_str()),
                        span: expr.span,
                    });
                }
                let l = self.check_expr(types, left)?;
                let r = self.check_expr(types, right)?;
                if l.ty == TypeId::VOID || r.ty == TypeId::VOID {
                    return Ok(Evaluation::unknown());
                }
                if !types.equals(l.ty, r.ty) {
                    return Err(Error::TypeMismatch {
                        expected: types.display(l.ty),
                        got: types.display(r.ty),
                        span: right.span,
                    });
                }
                if !types.is_int_like(l.ty) || !types.is_int_like(r.ty) {
                    return Err(Error::IllegalConstExpr {
                        reason: format!(
                            "operator `{}` needs integer operands, found {}",
                            op.as_str(),
                            types.display(l.ty)
                        ),
                        span: expr.span,
                    });
                }
                if !(l.is_const && r.is_const) {
                    let ty = if types.is_literal(l.ty) { r.ty } else { l.ty };
                    return Ok(Evaluation::pending(ty));
                }
                let value = fold_binary(*op, l.value, r.value, expr.span)?;
                let ty = match (types.is_literal(l.ty), types.is_literal(r.ty)) {
                    (true, true) => types.int_literal(value),
                    (true, false) => r.ty,
                    _ => l.ty,
                };
                check_range(types, ty, value, expr.span)?;
                Ok(Evaluation::constant(ty, value))
            }

            ExprKind::Unary { op, expr: inner } => match op {
                UnOp::Not => {
                    let v = self.check_expr(types, inner)?;
                    if v.ty != TypeId::BOOL {
                        return Err(Error::IllegalConstExpr {
                            reason: format!("`!` needs a bool, found {}", types.display(v.ty)),
                            span: expr.span,
                        });
                    }
                    Ok(Evaluation {
                        ty: TypeId::BOOL,
                        is_const: v.is_const,
                        value: (v.value == 0) as i64,
                    })
                }
                UnOp::Neg => {
                    let v = self.check_expr(types, inner)?;
                    let zero = types.int_literal(0);
                    if !types.equals(v.ty, zero) {
                        return Err(Error::IllegalConstExpr {
                            reason: format!("`-` needs an integer, found {}", types.display(v.ty)),
                            span: expr.span,
                        });
                    }
                    if !v.is_const {
                        return Ok(v);
                    }
                    let value = v.value.checked_neg().ok_or_else(|| overflow(expr.span))?;
                    let ty = if types.is_literal(v.ty) {
                        types.int_literal(value)
                    } else {
                        v.ty
                    };
                    check_range(types, ty, value, expr.span)?;
                    Ok(Evaluation::constant(ty, value))
                }
                UnOp::Borrow | UnOp::BorrowMut | UnOp::Deref => Err(Error::IllegalConstExpr {
                    reason: format!("`{}` is not allowed in a constant", op.as_str()),
                    span: expr.span,
                }),
            },

            ExprKind::Path(path) => match (&path.first, &path.second) {
                (PathSegment::Ident(ident), None) => Ok(self.get_value(&ident.name)),
                _ => Ok(Evaluation::unknown()),
            },

            ExprKind::Cast { expr: inner, ty } => {
                let target = match &ty.kind {
                    TypeKind::Path(PathSegment::Ident(ident)) => PrimitiveType::from_name(&ident.name),
                    _ => None,
                };
                let Some(target) = target.filter(|p| p.is_integer()) else {
                    return Err(Error::IllegalConstExpr {
                        reason: "constant casts must target an integer type".to_string(),
                        span: ty.span,
                    });
                };
                let v = self.check_expr(types, inner)?;
                if !(types.is_int_like(v.ty) || v.ty == TypeId::BOOL || v.ty == TypeId::CHAR) {
                    return Ok(Evaluation::unknown());
                }
                let value = match target {
                    PrimitiveType::I32 | PrimitiveType::Isize => v.value as i32 as i64,
                    _ => v.value as u32 as i64,
                };
                Ok(Evaluation {
                    ty: target.id(),
                    is_const: v.is_const,
                    value,
                })
            }

            _ => Err(Error::IllegalConstExpr {
                reason: "expression is not a compile-time constant".to_string(),
                span: expr.span,
            }),
        }
    }
}

fn overflow(span: Span) -> Error {
    Error::IllegalConstExpr {
        reason: "arithmetic overflow".to_string(),
        span,
    }
}

fn fold_binary(op: BinOp, l: i64, r: i64, span: Span) -> Result<i64> {
    let value = match op {
        BinOp::Add => l.checked_add(r),
        BinOp::Sub => l.checked_sub(r),
        BinOp::Mul => l.checked_mul(r),
        BinOp::Div => {
            if r == 0 {
                return Err(Error::IllegalConstExpr {
                    reason: "division by zero".to_string(),
                    span,
                });
            }
            l.checked_div(r)
        }
        _ => None,
    };
    value.ok_or_else(|| overflow(span))
}

/// A value of concrete integer type must fit that type
fn check_range(types: &TypeArena, ty: TypeId, value: i64, span: Span) -> Result<()> {
    if let Some((lo, hi)) = types.primitive(ty).and_then(|p| p.int_range()) {
        if value < lo || value > hi {
            return Err(Error::IllegalConstExpr {
                reason: format!("{} does not fit in {}", value, types.display(ty)),
                span,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{ConstDef, Item};
    use crate::frontend::parser::parse_source;
    use pretty_assertions::assert_eq;

    fn consts(source: &str) -> Vec<ConstDef> {
        parse_source(source)
            .unwrap()
            .items
            .into_iter()
            .filter_map(|item| match item {
                Item::Const(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn declared(c: &ConstDef) -> TypeId {
        match &c.ty.kind {
            TypeKind::Path(PathSegment::Ident(i)) => PrimitiveType::from_name(&i.name).unwrap().id(),
            _ => panic!("unexpected const type"),
        }
    }

    /// Solve every const in `source`, returning values sorted by name
    fn solve(source: &str) -> Result<Vec<(String, i64)>> {
        let items = consts(source);
        let mut types = TypeArena::new();
        let mut solver = ConstSolver::new();
        for c in &items {
            solver.ask_item(&c.name.name, declared(c), &c.value);
        }
        solver.solve(&mut types)?;
        let mut out: Vec<(String, i64)> = solver
            .solution()
            .items()
            .iter()
            .map(|(n, ev)| (n.to_string(), ev.value))
            .collect();
        out.sort();
        Ok(out)
    }

    #[test]
    fn test_scalar_const() {
        assert_eq!(solve("const X: i32 = 2 + 3;").unwrap(), vec![("X".into(), 5)]);
    }

    #[test]
    fn test_dependent_consts_any_order() {
        let expected = vec![("A".to_string(), 5), ("B".to_string(), 4)];
        assert_eq!(solve("const A: i32 = B + 1; const B: i32 = 4;").unwrap(), expected);
        assert_eq!(solve("const B: i32 = 4; const A: i32 = B + 1;").unwrap(), expected);
    }

    #[test]
    fn test_chain_converges() {
        // Worst case order: each scan resolves exactly one more item.
        let n = 12;
        let mut src = String::new();
        for i in 0..n {
            src.push_str(&format!("const C{}: i32 = C{} * 2;\n", i, i + 1));
        }
        src.push_str(&format!("const C{}: i32 = 1;\n", n));
        let values = solve(&src).unwrap();
        assert_eq!(values.len(), n + 1);
        let c0 = values.iter().find(|(name, _)| name == "C0").unwrap().1;
        assert_eq!(c0, 1 << n);

        let items = consts(&src);
        let mut types = TypeArena::new();
        let mut solver = ConstSolver::new();
        for c in &items {
            solver.ask_item(&c.name.name, declared(c), &c.value);
        }
        solver.solve(&mut types).unwrap();
        assert!(solver.solution().iterations() <= items.len());
    }

    #[test]
    fn test_cycle_stops_after_one_idle_scan() {
        let items = consts("const A: i32 = B + 1; const B: i32 = A; const C: i32 = 2;");
        let mut types = TypeArena::new();
        let mut solver = ConstSolver::new();
        for c in &items {
            solver.ask_item(&c.name.name, declared(c), &c.value);
        }
        assert!(matches!(
            solver.solve(&mut types),
            Err(Error::UnresolvedConstants { .. })
        ));
        // C resolves in the first scan, the second makes no progress.
        assert_eq!(solver.solution().iterations(), 2);
    }

    #[test]
    fn test_mixed_operand_types_are_reported() {
        match solve("const A: i32 = B + C; const B: i32 = 1; const C: u32 = 2;") {
            Err(Error::TypeMismatch { expected, got, .. }) => {
                assert_eq!(expected, "i32");
                assert_eq!(got, "u32");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cycle_fails() {
        let err = solve("const A: i32 = B; const B: i32 = A;").unwrap_err();
        match err {
            Error::UnresolvedConstants { mut names, .. } => {
                names.sort();
                assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(solve("const S: i32 = S + 1;").is_err());
    }

    #[test]
    fn test_type_mismatch_fails() {
        assert!(matches!(
            solve("const F: bool = 1;"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            solve("const U: u32 = 0 - 1;"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_illegal_operators() {
        for src in [
            "const A: i32 = 7 % 2;",
            "const A: i32 = 1 << 2;",
            "const A: i32 = 4 / 0;",
            "const A: i32 = *B;",
        ] {
            assert!(
                matches!(solve(src), Err(Error::IllegalConstExpr { .. })),
                "{}",
                src
            );
        }
    }

    #[test]
    fn test_overflow_against_declared_type() {
        assert!(matches!(
            solve("const A: i32 = 2147483647; const B: i32 = A + 1;"),
            Err(Error::IllegalConstExpr { .. })
        ));
    }

    #[test]
    fn test_unary_and_literals() {
        let values = solve("const T: bool = !false; const N: i32 = -(3 - 5); const C: char = 'a';").unwrap();
        assert_eq!(
            values,
            vec![("C".to_string(), 97), ("N".to_string(), 2), ("T".to_string(), 1)]
        );
        assert!(matches!(
            solve("const B: bool = -true;"),
            Err(Error::IllegalConstExpr { .. })
        ));
    }

    #[test]
    fn test_string_is_never_const() {
        assert!(solve("const S: i32 = \"no\";").is_err());
    }

    #[test]
    fn test_expression_with_prior_knowledge() {
        let items = consts("const LEN: usize = 2 + 3 * 4;");
        let mut table = ConstTable::default();
        table.create("N", TypeId::USIZE);
        table.set_value("N", 3);
        let mut types = TypeArena::new();

        let ev = ConstSolver::evaluate(&mut types, &table, &items[0].value).unwrap();
        assert!(ev.is_const);
        assert_eq!(ev.value, 14);

        let with_n = consts("const M: usize = N * 2 + 1;");
        let ev = ConstSolver::evaluate(&mut types, &table, &with_n[0].value).unwrap();
        assert_eq!(ev.value, 7);
        assert_eq!(ev.ty, TypeId::USIZE);

        let unknown = consts("const M: usize = missing + 1;");
        assert!(ConstSolver::evaluate(&mut types, &table, &unknown[0].value).is_err());
    }

    #[test]
    fn test_cast_in_constant() {
        let values = solve("const A: i32 = 3; const B: usize = A as usize + 1;").unwrap();
        assert_eq!(values, vec![("A".to_string(), 3), ("B".to_string(), 4)]);
    }
}
