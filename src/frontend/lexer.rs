//! Lexer for rlc
//!
//! Converts source code into a stream of tokens.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The lexer state
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    /// Start position of current token
    start: usize,
    file_id: usize,
}

impl Lexer {
    pub fn new(source: &str, file_id: usize) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            file_id,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Consume `expected` if it is next
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.file_id)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut depth = 1;
                    while depth > 0 && !self.is_at_end() {
                        match (self.peek(), self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                depth -= 1;
                            }
                            (Some('/'), Some('*')) => {
                                self.advance();
                                self.advance();
                                depth += 1;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_word(&mut self) -> String {
        let from = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.source[from..self.pos].iter().collect()
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let text = self.read_word();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read an integer literal and its optional suffix
    fn read_number(&mut self) -> Result<Token> {
        let (radix, digits_from) =
            if self.peek() == Some('0') && matches!(self.peek_next(), Some('x') | Some('X')) {
                self.advance();
                self.advance();
                (16, self.pos)
            } else {
                (10, self.pos)
            };

        while let Some(c) = self.peek() {
            if c.is_digit(radix) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let digits: String = self.source[digits_from..self.pos]
            .iter()
            .filter(|&&c| c != '_')
            .collect();

        let suffix = match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => Some(self.read_word()),
            _ => None,
        };

        let value = i64::from_str_radix(&digits, radix).map_err(|_| Error::InvalidLiteral {
            text: self.source[self.start..self.pos].iter().collect(),
            span: self.make_span(),
        })?;

        Ok(self.make_token(TokenKind::IntLit { value, suffix }))
    }

    fn read_escape(&mut self) -> Result<char> {
        let c = match self.advance() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some(other) => {
                return Err(Error::InvalidLiteral {
                    text: format!("\\{}", other),
                    span: self.make_span(),
                })
            }
            None => return Err(Error::UnterminatedLiteral { span: self.make_span() }),
        };
        Ok(c)
    }

    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => value.push(self.read_escape()?),
                Some(c) => value.push(c),
                None => return Err(Error::UnterminatedLiteral { span: self.make_span() }),
            }
        }

        Ok(self.make_token(TokenKind::StringLit(value)))
    }

    fn read_char(&mut self) -> Result<Token> {
        self.advance(); // opening quote

        let c = match self.advance() {
            Some('\\') => self.read_escape()?,
            Some('\'') | None => return Err(Error::UnterminatedLiteral { span: self.make_span() }),
            Some(c) => c,
        };
        if !self.eat('\'') {
            return Err(Error::UnterminatedLiteral { span: self.make_span() });
        }

        Ok(self.make_token(TokenKind::CharLit(c)))
    }

    /// Pick the compound-assignment form when `=` follows
    fn with_eq(&mut self, plain: TokenKind, assign: TokenKind) -> TokenKind {
        if self.eat('=') {
            assign
        } else {
            plain
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return Ok(Token::eof(self.make_span()));
        };

        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_identifier());
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }
        if c == '\'' {
            return self.read_char();
        }

        self.advance();
        let kind = match c {
            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            '-' => {
                if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::MinusEq)
                }
            }
            '*' => self.with_eq(TokenKind::Star, TokenKind::StarEq),
            '/' => self.with_eq(TokenKind::Slash, TokenKind::SlashEq),
            '%' => self.with_eq(TokenKind::Percent, TokenKind::PercentEq),
            '^' => self.with_eq(TokenKind::Caret, TokenKind::CaretEq),
            '=' => self.with_eq(TokenKind::Eq, TokenKind::EqEq),
            '!' => self.with_eq(TokenKind::Not, TokenKind::Ne),
            '<' => {
                if self.eat('<') {
                    self.with_eq(TokenKind::Shl, TokenKind::ShlEq)
                } else {
                    self.with_eq(TokenKind::Lt, TokenKind::Le)
                }
            }
            '>' => {
                if self.eat('>') {
                    self.with_eq(TokenKind::Shr, TokenKind::ShrEq)
                } else {
                    self.with_eq(TokenKind::Gt, TokenKind::Ge)
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else {
                    self.with_eq(TokenKind::And, TokenKind::AndEq)
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else {
                    self.with_eq(TokenKind::Or, TokenKind::OrEq)
                }
            }
            ':' => {
                if self.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => {
                return Err(Error::UnknownCharacter {
                    ch: c,
                    span: self.make_span(),
                })
            }
        };

        Ok(self.make_token(kind))
    }

    /// Tokenize the entire source; the last token is always `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, 0)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("fn main() { }");
        assert!(matches!(tokens[0], TokenKind::Fn));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "main"));
        assert!(matches!(tokens[2], TokenKind::LParen));
        assert!(matches!(tokens[3], TokenKind::RParen));
        assert!(matches!(tokens[4], TokenKind::LBrace));
        assert!(matches!(tokens[5], TokenKind::RBrace));
        assert!(matches!(tokens[6], TokenKind::Eof));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 0xFF_FF 7usize 1_000");
        assert_eq!(tokens[0], TokenKind::IntLit { value: 42, suffix: None });
        assert_eq!(tokens[1], TokenKind::IntLit { value: 0xFFFF, suffix: None });
        assert_eq!(
            tokens[2],
            TokenKind::IntLit { value: 7, suffix: Some("usize".into()) }
        );
        assert_eq!(tokens[3], TokenKind::IntLit { value: 1000, suffix: None });
    }

    #[test]
    fn test_strings_and_chars() {
        let tokens = kinds(r#""hello\nworld" 'a' '\n'"#);
        assert!(matches!(tokens[0], TokenKind::StringLit(ref s) if s == "hello\nworld"));
        assert_eq!(tokens[1], TokenKind::CharLit('a'));
        assert_eq!(tokens[2], TokenKind::CharLit('\n'));
    }

    #[test]
    fn test_keywords() {
        let tokens = kinds("let mut ref self Self trait impl for");
        assert_eq!(
            tokens[..8],
            [
                TokenKind::Let,
                TokenKind::Mut,
                TokenKind::Ref,
                TokenKind::SelfValue,
                TokenKind::SelfType,
                TokenKind::Trait,
                TokenKind::Impl,
                TokenKind::For,
            ]
        );
    }

    #[test]
    fn test_compound_operators() {
        let tokens = kinds("<<= >>= &= |= ^= %= -> :: && || != <= >=");
        assert_eq!(
            tokens[..13],
            [
                TokenKind::ShlEq,
                TokenKind::ShrEq,
                TokenKind::AndEq,
                TokenKind::OrEq,
                TokenKind::CaretEq,
                TokenKind::PercentEq,
                TokenKind::Arrow,
                TokenKind::ColonColon,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("a // line\n /* block /* nested */ */ b");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("let $x", 0).tokenize(),
            Err(Error::UnknownCharacter { ch: '$', .. })
        ));
        assert!(matches!(
            Lexer::new("\"open", 0).tokenize(),
            Err(Error::UnterminatedLiteral { .. })
        ));
        assert!(matches!(
            Lexer::new("99999999999999999999", 0).tokenize(),
            Err(Error::InvalidLiteral { .. })
        ));
    }
}
