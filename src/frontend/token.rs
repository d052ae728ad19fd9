//! Token definitions for rlc

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    Fn,
    Let,
    Mut,
    Ref,
    If,
    Else,
    Loop,
    While,
    Return,
    Break,
    Continue,
    Struct,
    Enum,
    Impl,
    Trait,
    For,
    Const,
    As,
    True,
    False,
    /// self
    SelfValue,
    /// Self
    SelfType,

    // ============ Identifiers and Literals ============
    Ident(String),
    /// Integer literal with optional type suffix (`7usize`)
    IntLit { value: i64, suffix: Option<String> },
    StringLit(String),
    CharLit(char),

    // ============ Operators ============
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Not,
    And,
    Or,
    Caret,
    Shl,
    Shr,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AndEq,
    OrEq,
    CaretEq,
    ShlEq,
    ShrEq,
    /// ->
    Arrow,
    Dot,
    ColonColon,

    // ============ Delimiters ============
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,

    // ============ Special ============
    Eof,
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "fn" => Some(TokenKind::Fn),
            "let" => Some(TokenKind::Let),
            "mut" => Some(TokenKind::Mut),
            "ref" => Some(TokenKind::Ref),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "loop" => Some(TokenKind::Loop),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "struct" => Some(TokenKind::Struct),
            "enum" => Some(TokenKind::Enum),
            "impl" => Some(TokenKind::Impl),
            "trait" => Some(TokenKind::Trait),
            "for" => Some(TokenKind::For),
            "const" => Some(TokenKind::Const),
            "as" => Some(TokenKind::As),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "self" => Some(TokenKind::SelfValue),
            "Self" => Some(TokenKind::SelfType),
            _ => None,
        }
    }

    /// Binding power of an infix operator as `(left, right)`.
    ///
    /// Left-associative operators bind tighter on the right; assignment is
    /// right-associative. Comparisons share one level and do not chain.
    pub fn infix_binding_power(&self) -> Option<(u8, u8)> {
        let bp = match self {
            TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AndEq
            | TokenKind::OrEq
            | TokenKind::CaretEq
            | TokenKind::ShlEq
            | TokenKind::ShrEq => (2, 1),
            TokenKind::OrOr => (3, 4),
            TokenKind::AndAnd => (5, 6),
            TokenKind::EqEq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => (7, 8),
            TokenKind::Or => (8, 9),
            TokenKind::Caret => (10, 11),
            TokenKind::And => (12, 13),
            TokenKind::Shl | TokenKind::Shr => (14, 15),
            TokenKind::Plus | TokenKind::Minus => (16, 17),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (18, 19),
            TokenKind::As => (20, 21),
            _ => return None,
        };
        Some(bp)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
        )
    }
}

/// Binding power of prefix unary operators
pub const PREFIX_BINDING_POWER: u8 = 22;
