//! Lexer for size expressions and spec text
//!
//! Tokenizes with logos. Unlike a general-purpose lexer, nothing is skipped
//! except whitespace: any character outside the token set stops the stream
//! and is reported by [`Lexer::invalid`].

use logos::{Logos, Span};
use std::fmt;

/// Source location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub start: usize,
    pub end: usize,
}

impl Loc {
    pub fn new(start: usize, end: usize) -> Self {
        Loc { start, end }
    }

    pub fn from_span(span: Span) -> Self {
        Loc { start: span.start, end: span.end }
    }
}

/// Token with location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub loc: Loc,
}

impl<T> Spanned<T> {
    pub fn new(value: T, loc: Loc) -> Self {
        Spanned { value, loc }
    }
}

/// Token type
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // ============ Delimiters ============
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    // ============ Arithmetic ============
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,

    // ============ Literals ============
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok().filter(|v| v.is_finite()))]
    Float(f64),

    // ============ Identifiers ============
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{}", n),
            Token::Float(v) => write!(f, "{}", v),
            Token::Ident(s) => write!(f, "{}", s),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::SlashSlash => write!(f, "//"),
            Token::Percent => write!(f, "%"),
        }
    }
}

/// Lexer with peek support
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    peeked: Option<Option<Spanned<Token>>>,
    invalid: Option<Loc>,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            inner: Token::lexer(source),
            peeked: None,
            invalid: None,
            source,
        }
    }

    /// Peek at the next token
    pub fn peek(&mut self) -> Option<&Token> {
        self.peek_spanned().map(|s| &s.value)
    }

    /// Peek at next token with location
    pub fn peek_spanned(&mut self) -> Option<&Spanned<Token>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_inner());
        }
        self.peeked.as_ref().and_then(|p| p.as_ref())
    }

    /// Get the next token
    pub fn next(&mut self) -> Option<Token> {
        self.next_spanned().map(|s| s.value)
    }

    /// Get next token with location
    pub fn next_spanned(&mut self) -> Option<Spanned<Token>> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.next_inner(),
        }
    }

    fn next_inner(&mut self) -> Option<Spanned<Token>> {
        if self.invalid.is_some() {
            return None;
        }
        match self.inner.next() {
            Some(Ok(token)) => Some(Spanned::new(token, Loc::from_span(self.inner.span()))),
            Some(Err(())) => {
                // Input outside the token set ends the stream
                self.invalid = Some(Loc::from_span(self.inner.span()));
                None
            }
            None => None,
        }
    }

    /// Location and text of the first rejected input, if any
    pub fn invalid(&self) -> Option<(Loc, &'a str)> {
        self.invalid.map(|loc| (loc, self.slice(loc)))
    }

    /// Check if there are more tokens
    pub fn has_more(&mut self) -> bool {
        self.peek().is_some()
    }

    /// Get source slice for a location
    pub fn slice(&self, loc: Loc) -> &'a str {
        &self.source[loc.start..loc.end]
    }

    pub fn source(&self) -> &'a str {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let mut lex = Lexer::new("X + 2 * Y");
        assert_eq!(lex.next(), Some(Token::Ident("X".into())));
        assert_eq!(lex.next(), Some(Token::Plus));
        assert_eq!(lex.next(), Some(Token::Int(2)));
        assert_eq!(lex.next(), Some(Token::Star));
        assert_eq!(lex.next(), Some(Token::Ident("Y".into())));
        assert_eq!(lex.next(), None);
        assert!(lex.invalid().is_none());
    }

    #[test]
    fn test_floor_div_is_one_token() {
        let mut lex = Lexer::new("N // 2");
        assert_eq!(lex.next(), Some(Token::Ident("N".into())));
        assert_eq!(lex.next(), Some(Token::SlashSlash));
        assert_eq!(lex.next(), Some(Token::Int(2)));
    }

    #[test]
    fn test_power_is_two_stars() {
        let mut lex = Lexer::new("X**2");
        assert_eq!(lex.next(), Some(Token::Ident("X".into())));
        assert_eq!(lex.next(), Some(Token::Star));
        assert_eq!(lex.next(), Some(Token::Star));
    }

    #[test]
    fn test_float() {
        let mut lex = Lexer::new("1.25");
        assert_eq!(lex.next(), Some(Token::Float(1.25)));
    }

    #[test]
    fn test_overflowing_float_is_rejected() {
        let mut lex = Lexer::new("1.0e400 + X");
        assert_eq!(lex.next(), None);
        assert_eq!(lex.invalid().map(|(_, text)| text), Some("1.0e400"));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lex = Lexer::new("a:b");
        assert_eq!(lex.peek(), Some(&Token::Ident("a".into())));
        assert_eq!(lex.next(), Some(Token::Ident("a".into())));
        assert_eq!(lex.next(), Some(Token::Colon));
    }

    #[test]
    fn test_invalid_character_stops_stream() {
        let mut lex = Lexer::new("X < 3");
        assert_eq!(lex.next(), Some(Token::Ident("X".into())));
        assert_eq!(lex.next(), None);
        let (loc, text) = lex.invalid().unwrap();
        assert_eq!(loc.start, 2);
        assert_eq!(text, "<");
    }

    #[test]
    fn test_attribute_access_rejected() {
        let mut lex = Lexer::new("x.shape");
        assert_eq!(lex.next(), Some(Token::Ident("x".into())));
        assert_eq!(lex.next(), None);
        assert!(lex.invalid().is_some());
    }
}
