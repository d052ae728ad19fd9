//! Abstract Syntax Tree definitions for rlc
//!
//! The tree is produced by the parser and then annotated in place by the
//! checker: expressions receive `ty`, `mutable` and `diverges`, blocks and
//! statements receive `diverges`, type annotations receive `resolved`, and
//! functions receive their signature and local variable declarations.

use rustc_hash::FxHashMap;

use crate::types::TypeId;
use crate::utils::Span;

/// A complete compilation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crate {
    pub items: Vec<Item>,
}

/// Items, at top level or nested in a block
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(Function),
    Struct(StructDef),
    Enum(EnumDef),
    Impl(ImplBlock),
    Trait(TraitDef),
    Const(ConstDef),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Function(f) => f.span,
            Item::Struct(s) => s.span,
            Item::Enum(e) => e.span,
            Item::Impl(i) => i.span,
            Item::Trait(t) => t.span,
            Item::Const(c) => c.span,
        }
    }
}

/// An identifier with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

// ==================== Items ====================

/// A local variable known to a function body
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeId,
    pub mutable: bool,
}

/// Function or method definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub self_param: Option<SelfParam>,
    pub params: Vec<Param>,
    pub ret_type: Option<Type>,
    /// `None` only for required trait methods
    pub body: Option<Block>,
    pub span: Span,
    /// Full signature, `self` first for methods
    pub signature: Option<TypeId>,
    /// Parameters and `let` bindings by (mangled) name
    pub locals: FxHashMap<String, VarDecl>,
}

/// Method receiver
#[derive(Debug, Clone, PartialEq)]
pub enum SelfParam {
    /// `self`, `mut self`, `&self`, `&mut self`
    Shorthand { reference: bool, mutable: bool, span: Span },
    /// `self: Type`
    Typed { mutable: bool, ty: Type, span: Span },
}

impl SelfParam {
    pub fn span(&self) -> Span {
        match self {
            SelfParam::Shorthand { span, .. } | SelfParam::Typed { span, .. } => *span,
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Pattern,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: Ident,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: Ident,
    pub variants: Vec<Ident>,
    pub span: Span,
}

/// `impl Type { .. }` or `impl Trait for Type { .. }`
#[derive(Debug, Clone, PartialEq)]
pub struct ImplBlock {
    pub target: Type,
    pub trait_name: Option<Ident>,
    pub methods: Vec<Function>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitDef {
    pub name: Ident,
    pub methods: Vec<Function>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDef {
    pub name: Ident,
    pub ty: Type,
    pub value: Expr,
    pub span: Span,
}

// ==================== Types ====================

/// A type annotation as written
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
    pub resolved: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// `i32`, `Point`, `Self`
    Path(PathSegment),
    Reference { mutable: bool, inner: Box<Type> },
    Array { elem: Box<Type>, len: Box<Expr> },
    /// `()`
    Unit,
}

impl Type {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Self { kind, span, resolved: None }
    }
}

// ==================== Patterns ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Identifier {
        name: Ident,
        by_ref: bool,
        mutable: bool,
    },
    Reference {
        mutable: bool,
        inner: Box<Pattern>,
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier { name, .. } => name.span,
            Pattern::Reference { span, .. } => *span,
        }
    }
}

// ==================== Statements ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Final expression without a trailing `;`
    pub tail: Option<Box<Expr>>,
    pub span: Span,
    pub ty: Option<TypeId>,
    pub diverges: bool,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, tail: Option<Box<Expr>>, span: Span) -> Self {
        Self { stmts, tail, span, ty: None, diverges: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub diverges: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `;`
    Empty,
    Item(Box<Item>),
    Let(LetStmt),
    /// Expression statement; `has_semi` is false for block-like expressions
    Expr { expr: Expr, has_semi: bool },
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span, diverges: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub pattern: Pattern,
    pub ty: Type,
    pub init: Expr,
}

// ==================== Expressions ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Resolved type, set by the checker
    pub ty: Option<TypeId>,
    /// Whether the expression denotes a mutable place
    pub mutable: bool,
    /// Whether evaluation never completes normally
    pub diverges: bool,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span, ty: None, mutable: false, diverges: false }
    }

    /// Place expressions denote storage that can be assigned or borrowed
    pub fn is_place(&self) -> bool {
        match &self.kind {
            ExprKind::Path(_) | ExprKind::Field { .. } | ExprKind::Index { .. } => true,
            ExprKind::Unary { op: UnOp::Deref, .. } => true,
            ExprKind::Grouped(inner) => inner.is_place(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int { value: i64, suffix: Option<String> },
    Bool(bool),
    Char(char),
    Str(String),
}

/// One path segment
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Ident(Ident),
    /// `self`
    SelfValue(Span),
    /// `Self`
    SelfType(Span),
}

impl PathSegment {
    pub fn span(&self) -> Span {
        match self {
            PathSegment::Ident(ident) => ident.span,
            PathSegment::SelfValue(span) | PathSegment::SelfType(span) => *span,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PathSegment::Ident(ident) => &ident.name,
            PathSegment::SelfValue(_) => "self",
            PathSegment::SelfType(_) => "Self",
        }
    }
}

/// `a` or `A::b`
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub first: PathSegment,
    pub second: Option<PathSegment>,
    /// Ordinal of the enum variant named by a two-segment path
    pub variant: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Path(PathExpr),
    Block(Block),
    Grouped(Box<Expr>),
    /// `()`
    Unit,
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        ty: Type,
    },
    /// `[a, b, c]`
    ArrayList(Vec<Expr>),
    /// `[value; len]`
    ArrayRepeat {
        value: Box<Expr>,
        len: Box<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    StructLit {
        path: PathExpr,
        fields: Vec<FieldInit>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    Field {
        expr: Box<Expr>,
        field: Ident,
    },
    Loop(Block),
    While {
        cond: Box<Expr>,
        body: Block,
    },
    If {
        cond: Box<Expr>,
        then_block: Block,
        /// Either a block expression or another `if`
        else_branch: Option<Box<Expr>>,
    },
    Break(Option<Box<Expr>>),
    Continue,
    Return(Option<Box<Expr>>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    // Assignment
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::AddAssign
                | Self::SubAssign
                | Self::MulAssign
                | Self::DivAssign
                | Self::ModAssign
                | Self::BitAndAssign
                | Self::BitOrAssign
                | Self::BitXorAssign
                | Self::ShlAssign
                | Self::ShrAssign
        )
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, Self::Shl | Self::Shr | Self::ShlAssign | Self::ShrAssign)
    }

    /// Operators that accept `bool` as well as integers
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            Self::BitAnd
                | Self::BitOr
                | Self::BitXor
                | Self::BitAndAssign
                | Self::BitOrAssign
                | Self::BitXorAssign
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::ModAssign => "%=",
            Self::BitAndAssign => "&=",
            Self::BitOrAssign => "|=",
            Self::BitXorAssign => "^=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    /// `&`
    Borrow,
    /// `&mut`
    BorrowMut,
    /// `*`
    Deref,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
            Self::Borrow => "&",
            Self::BorrowMut => "&mut",
            Self::Deref => "*",
        }
    }
}
