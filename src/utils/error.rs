//! Error handling for rlc
//!
//! Every check either produces a value or returns one of these errors; the
//! first error aborts the compilation.

use crate::utils::Span;
use serde::Serialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Syntax,
    DuplicateDeclaration,
    UndefinedReference,
    TypeMismatch,
    IllegalConstant,
    StructuralViolation,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::DuplicateDeclaration => "duplicate-declaration",
            Self::UndefinedReference => "undefined-reference",
            Self::TypeMismatch => "type-mismatch",
            Self::IllegalConstant => "illegal-constant",
            Self::StructuralViolation => "structural-violation",
            Self::Io => "io",
        }
    }
}

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer / Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected identifier")]
    ExpectedIdent { span: Span },

    #[error("Expected type")]
    ExpectedType { span: Span },

    #[error("Expected expression")]
    ExpectedExpr { span: Span },

    #[error("Expected pattern")]
    ExpectedPattern { span: Span },

    #[error("Invalid literal: {text}")]
    InvalidLiteral { text: String, span: Span },

    #[error("Unknown character: {ch:?}")]
    UnknownCharacter { ch: char, span: Span },

    #[error("Unterminated literal")]
    UnterminatedLiteral { span: Span },

    // ==================== Declaration Errors ====================

    #[error("Duplicate {kind}: {name}")]
    DuplicateDefinition {
        kind: &'static str,
        name: String,
        span: Span,
    },

    #[error("Duplicate method {method} on {ty}")]
    DuplicateMethod {
        ty: String,
        method: String,
        span: Span,
    },

    // ==================== Resolution Errors ====================

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String, span: Span },

    #[error("Undefined type: {name}")]
    UndefinedType { name: String, span: Span },

    #[error("Undefined trait: {name}")]
    UndefinedTrait { name: String, span: Span },

    #[error("Unknown field {field} on {ty}")]
    UnknownField {
        ty: String,
        field: String,
        span: Span,
    },

    #[error("Unknown method {method} on {ty}")]
    UnknownMethod {
        ty: String,
        method: String,
        span: Span,
    },

    #[error("Unknown variant {variant} of {ty}")]
    UnknownVariant {
        ty: String,
        variant: String,
        span: Span,
    },

    // ==================== Type Errors ====================

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Argument count mismatch: expected {expected}, got {got}")]
    ArgCountMismatch {
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Struct {ty} has {expected} fields, literal gives {got}")]
    FieldCountMismatch {
        ty: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Cannot assign to an immutable place")]
    AssignToImmutable { span: Span },

    #[error("Cannot borrow an immutable place as mutable")]
    BorrowImmutableAsMutable { span: Span },

    #[error("Method {method} takes `&mut self` but the receiver is immutable")]
    MutSelfOnImmutable { method: String, span: Span },

    #[error("Impl of {trait_name} for {ty} is incomplete: {detail}")]
    IncompleteTraitImpl {
        trait_name: String,
        ty: String,
        detail: String,
        span: Span,
    },

    #[error("Operator {op} cannot be applied to {ty}")]
    InvalidOperand {
        op: String,
        ty: String,
        span: Span,
    },

    #[error("Invalid cast from {from} to {to}")]
    InvalidCast {
        from: String,
        to: String,
        span: Span,
    },

    #[error("Expression of type {ty} is not callable")]
    NotCallable { ty: String, span: Span },

    #[error("Expression of type {ty} is not a struct")]
    NotAStruct { ty: String, span: Span },

    #[error("Expression of type {ty} is not indexable")]
    NotIndexable { ty: String, span: Span },

    #[error("Cannot dereference {ty}")]
    CannotDeref { ty: String, span: Span },

    // ==================== Constant Errors ====================

    #[error("Illegal constant expression: {reason}")]
    IllegalConstExpr { reason: String, span: Span },

    #[error("Unresolved constants: {}", names.join(", "))]
    UnresolvedConstants { names: Vec<String>, span: Span },

    #[error("Array size {value} is out of range")]
    ArraySizeOutOfRange { value: i64, span: Span },

    // ==================== Structural Errors ====================

    #[error("Unsupported: {what}")]
    Unsupported { what: String, span: Span },

    #[error("`break` outside of a loop")]
    BreakOutsideLoop { span: Span },

    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop { span: Span },

    #[error("`return` outside of a function")]
    ReturnOutsideFunction { span: Span },

    #[error("Struct {name} is sealed")]
    SealedStruct { name: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::ExpectedIdent { span }
            | Self::ExpectedType { span }
            | Self::ExpectedExpr { span }
            | Self::ExpectedPattern { span }
            | Self::InvalidLiteral { span, .. }
            | Self::UnknownCharacter { span, .. }
            | Self::UnterminatedLiteral { span }
            | Self::DuplicateDefinition { span, .. }
            | Self::DuplicateMethod { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::UndefinedType { span, .. }
            | Self::UndefinedTrait { span, .. }
            | Self::UnknownField { span, .. }
            | Self::UnknownMethod { span, .. }
            | Self::UnknownVariant { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::ArgCountMismatch { span, .. }
            | Self::FieldCountMismatch { span, .. }
            | Self::AssignToImmutable { span }
            | Self::BorrowImmutableAsMutable { span }
            | Self::MutSelfOnImmutable { span, .. }
            | Self::IncompleteTraitImpl { span, .. }
            | Self::InvalidOperand { span, .. }
            | Self::InvalidCast { span, .. }
            | Self::NotCallable { span, .. }
            | Self::NotAStruct { span, .. }
            | Self::NotIndexable { span, .. }
            | Self::CannotDeref { span, .. }
            | Self::IllegalConstExpr { span, .. }
            | Self::UnresolvedConstants { span, .. }
            | Self::ArraySizeOutOfRange { span, .. }
            | Self::Unsupported { span, .. }
            | Self::BreakOutsideLoop { span }
            | Self::ContinueOutsideLoop { span }
            | Self::ReturnOutsideFunction { span } => Some(*span),
            Self::SealedStruct { .. } | Self::Io(_) => None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedToken { .. }
            | Self::ExpectedIdent { .. }
            | Self::ExpectedType { .. }
            | Self::ExpectedExpr { .. }
            | Self::ExpectedPattern { .. }
            | Self::InvalidLiteral { .. }
            | Self::UnknownCharacter { .. }
            | Self::UnterminatedLiteral { .. } => ErrorKind::Syntax,

            Self::DuplicateDefinition { .. } | Self::DuplicateMethod { .. } => {
                ErrorKind::DuplicateDeclaration
            }

            Self::UndefinedVariable { .. }
            | Self::UndefinedType { .. }
            | Self::UndefinedTrait { .. }
            | Self::UnknownField { .. }
            | Self::UnknownMethod { .. }
            | Self::UnknownVariant { .. } => ErrorKind::UndefinedReference,

            Self::TypeMismatch { .. }
            | Self::ArgCountMismatch { .. }
            | Self::FieldCountMismatch { .. }
            | Self::AssignToImmutable { .. }
            | Self::BorrowImmutableAsMutable { .. }
            | Self::MutSelfOnImmutable { .. }
            | Self::IncompleteTraitImpl { .. }
            | Self::InvalidOperand { .. }
            | Self::InvalidCast { .. }
            | Self::NotCallable { .. }
            | Self::NotAStruct { .. }
            | Self::NotIndexable { .. }
            | Self::CannotDeref { .. } => ErrorKind::TypeMismatch,

            Self::IllegalConstExpr { .. }
            | Self::UnresolvedConstants { .. }
            | Self::ArraySizeOutOfRange { .. } => ErrorKind::IllegalConstant,

            Self::Unsupported { .. }
            | Self::BreakOutsideLoop { .. }
            | Self::ContinueOutsideLoop { .. }
            | Self::ReturnOutsideFunction { .. }
            | Self::SealedStruct { .. } => ErrorKind::StructuralViolation,

            Self::Io(_) => ErrorKind::Io,
        }
    }
}
