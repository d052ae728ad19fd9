//! End-to-end checks through the public library API.

use pretty_assertions::assert_eq;
use rlc::check_source;
use rlc::frontend::ast::*;
use rlc::semantic::ConstEntry;
use rlc::types::TypeId;
use rlc::utils::{Error, ErrorKind, Span};

fn main_body(krate: &Crate) -> &Block {
    krate
        .items
        .iter()
        .find_map(|item| match item {
            Item::Function(f) if f.name.name == "main" => f.body.as_ref(),
            _ => None,
        })
        .unwrap()
}

fn let_type(stmt: &Stmt) -> TypeId {
    match &stmt.kind {
        StmtKind::Let(l) => l.ty.resolved.unwrap(),
        other => panic!("expected let, got {:?}", other),
    }
}

fn let_init(stmt: &Stmt) -> &Expr {
    match &stmt.kind {
        StmtKind::Let(l) => &l.init,
        other => panic!("expected let, got {:?}", other),
    }
}

// ==================== Annotated tree ====================

struct Unannotated(Vec<Span>);

impl Unannotated {
    fn item(&mut self, item: &Item) {
        match item {
            Item::Function(f) => self.function(f),
            Item::Impl(i) => i.methods.iter().for_each(|m| self.function(m)),
            Item::Const(c) => {
                self.ty(&c.ty);
                self.expr(&c.value);
            }
            Item::Struct(s) => s.fields.iter().for_each(|f| self.ty(&f.ty)),
            Item::Enum(_) | Item::Trait(_) => {}
        }
    }

    fn function(&mut self, f: &Function) {
        if f.signature.is_none() {
            self.0.push(f.span);
        }
        if let Some(body) = &f.body {
            self.block(body);
        }
    }

    fn ty(&mut self, ty: &Type) {
        if ty.resolved.is_none() {
            self.0.push(ty.span);
        }
        match &ty.kind {
            TypeKind::Reference { inner, .. } => self.ty(inner),
            TypeKind::Array { elem, len } => {
                self.ty(elem);
                self.expr(len);
            }
            TypeKind::Path(_) | TypeKind::Unit => {}
        }
    }

    fn block(&mut self, block: &Block) {
        if block.ty.is_none() {
            self.0.push(block.span);
        }
        for stmt in &block.stmts {
            match &stmt.kind {
                StmtKind::Let(l) => {
                    self.ty(&l.ty);
                    self.expr(&l.init);
                }
                StmtKind::Expr { expr, .. } => self.expr(expr),
                StmtKind::Item(item) => self.item(item),
                StmtKind::Empty => {}
            }
        }
        if let Some(tail) = &block.tail {
            self.expr(tail);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        if expr.ty.is_none() {
            self.0.push(expr.span);
        }
        match &expr.kind {
            ExprKind::Block(b) | ExprKind::Loop(b) => self.block(b),
            ExprKind::Grouped(e) | ExprKind::Unary { expr: e, .. } => self.expr(e),
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Cast { expr, ty } => {
                self.expr(expr);
                self.ty(ty);
            }
            ExprKind::ArrayList(items) => items.iter().for_each(|e| self.expr(e)),
            ExprKind::ArrayRepeat { value, len } => {
                self.expr(value);
                self.expr(len);
            }
            ExprKind::Index { base, index } => {
                self.expr(base);
                self.expr(index);
            }
            ExprKind::StructLit { fields, .. } => fields.iter().for_each(|f| self.expr(&f.value)),
            ExprKind::Call { callee, args } => {
                self.expr(callee);
                args.iter().for_each(|e| self.expr(e));
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                self.expr(receiver);
                args.iter().for_each(|e| self.expr(e));
            }
            ExprKind::Field { expr, .. } => self.expr(expr),
            ExprKind::While { cond, body } => {
                self.expr(cond);
                self.block(body);
            }
            ExprKind::If { cond, then_block, else_branch } => {
                self.expr(cond);
                self.block(then_block);
                if let Some(e) = else_branch {
                    self.expr(e);
                }
            }
            ExprKind::Break(Some(e)) | ExprKind::Return(Some(e)) => self.expr(e),
            ExprKind::Literal(_)
            | ExprKind::Path(_)
            | ExprKind::Unit
            | ExprKind::Break(None)
            | ExprKind::Continue
            | ExprKind::Return(None) => {}
        }
    }
}

const PROGRAM: &str = r#"
const SIZE: usize = 4;

enum Color { Red, Green }

struct Grid {
    cells: [i32; SIZE],
    color: Color,
}

trait Area {
    fn area(&self) -> i32;
}

impl Area for Grid {
    fn area(&self) -> i32 {
        let mut total: i32 = 0;
        let mut i: usize = 0;
        while i < self.cells.len() {
            total += self.cells[i];
            i += 1;
        }
        total
    }
}

impl Grid {
    fn new() -> Self {
        Grid { cells: [1; SIZE], color: Color::Red }
    }

    fn bump(&mut self, by: i32) {
        self.cells[0] = self.cells[0] + by;
    }
}

fn pick(flag: bool) -> i32 {
    if flag { return 1; } else { 2 }
}

fn main() {
    const LOCAL: i32 = 3 * 2;
    let mut g: Grid = Grid::new();
    g.bump(LOCAL);
    let n: i32 = loop {
        if g.area() > 10 { break 1; }
        break pick(true);
    };
    let c: u32 = (g.color as u32) + 1;
    let s: String = 7.to_string();
    printlnInt(n);
    struct Inner { v: bool }
    let inner: Inner = Inner { v: n == 1 };
    if inner.v { exit(0); }
}
"#;

#[test]
fn test_whole_program_checks() {
    let (krate, checker) = check_source(PROGRAM).unwrap();
    // Inner was hoisted, trait items dropped after collection
    assert!(checker.symbols.structs.get("Inner").is_some());
    assert!(checker.symbols.traits.contains("Area"));
    assert!(krate.items.iter().all(|item| !matches!(item, Item::Trait(_))));
}

#[test]
fn test_every_node_is_annotated() {
    let (krate, _) = check_source(PROGRAM).unwrap();
    let mut walker = Unannotated(vec![]);
    krate.items.iter().for_each(|item| walker.item(item));
    assert_eq!(walker.0, vec![]);
}

// ==================== Scenarios ====================

#[test]
fn test_scalar_const() {
    let (_, checker) = check_source("const X: i32 = 2 + 3;\nfn main() {}").unwrap();
    assert_eq!(
        checker.symbols.consts.get("X"),
        Some(ConstEntry { ty: TypeId::I32, value: 5 })
    );
}

#[test]
fn test_dependent_consts_any_order() {
    let (_, checker) =
        check_source("const A: i32 = B + 1;\nconst B: i32 = 4;\nfn main() {}").unwrap();
    assert_eq!(checker.symbols.consts.get("A").map(|c| c.value), Some(5));
    assert_eq!(checker.symbols.consts.get("B").map(|c| c.value), Some(4));
}

#[test]
fn test_cyclic_consts_fail() {
    let err = check_source("const A: i32 = B;\nconst B: i32 = A;\nfn main() {}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalConstant);
    assert!(matches!(err, Error::UnresolvedConstants { .. }));
}

#[test]
fn test_struct_with_method() {
    let (_, checker) = check_source(
        "struct P { x: i32 }\nimpl P { fn get(&self) -> i32 { self.x } }\nfn main() {}",
    )
    .unwrap();
    let p = checker.symbols.structs.get("P").unwrap();
    let st = checker.types.struct_type(p).unwrap();
    assert_eq!(st.fields(), &[("x".to_string(), TypeId::I32)][..]);
    assert_eq!(st.methods().len(), 1);
    let get = st.method("get").unwrap();
    assert_eq!(checker.types.display(get), "fn(&P) -> i32");
    assert!(st.is_sealed());
}

#[test]
fn test_array_bound() {
    let (krate, checker) =
        check_source("fn main() { let a: [i32; 2 + 3] = [0; 2 + 3]; }").unwrap();
    let ty = let_type(&main_body(&krate).stmts[0]);
    assert_eq!(checker.types.as_array(ty), Some((TypeId::I32, 5)));

    let err = check_source("fn main() { let b: [i32; -1] = [0; 1]; }").unwrap_err();
    assert!(matches!(err, Error::ArraySizeOutOfRange { value: -1, .. }));
}

#[test]
fn test_mutability() {
    let err = check_source("fn main() { let x: i32 = 0; x = 1; }").unwrap_err();
    assert!(matches!(err, Error::AssignToImmutable { .. }));
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(check_source("fn main() { let mut x: i32 = 0; x = 1; }").is_ok());
}

#[test]
fn test_break_unification() {
    let (krate, checker) = check_source(
        "fn main() { let c: bool = true; let v: i32 = loop { if (c) { break 1; } break 2; }; }",
    )
    .unwrap();
    let ty = let_init(&main_body(&krate).stmts[1]).ty.unwrap();
    assert!(checker.types.equals(ty, TypeId::I32));

    let err = check_source("fn main() { loop { break 1; break true; } }").unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

// ==================== Error classes ====================

#[test]
fn test_error_kinds() {
    let cases = [
        ("fn main() { let x: i32 = @; }", ErrorKind::Syntax),
        ("struct A {}\nstruct A {}\nfn main() {}", ErrorKind::DuplicateDeclaration),
        ("fn main() { let x: Nope = 1; }", ErrorKind::UndefinedReference),
        ("fn main() { let x: bool = 1; }", ErrorKind::TypeMismatch),
        ("const X: i32 = 1 % 2;\nfn main() {}", ErrorKind::IllegalConstant),
        ("fn main() { break; }", ErrorKind::StructuralViolation),
    ];
    for (source, kind) in cases {
        let err = check_source(source).unwrap_err();
        assert_eq!(err.kind(), kind, "{}", source);
    }
}
