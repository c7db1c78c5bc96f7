//! Parser for size expressions
//!
//! Pratt parser over the allow-listed grammar:
//!
//! ```text
//! expr  ::= expr (+ | - | * | / | // | %) expr | -expr | atom
//! atom  ::= integer | decimal | identifier | ( expr )
//! ```
//!
//! Everything else (calls, attribute access, comparisons, `**`) is a parse
//! error, never an evaluated expression.

use crate::lexer::{Lexer, Token};
use shapeguard_ast::expr::SizeExpr;
use shapeguard_ast::op::BinOp;
use thiserror::Error;

/// Parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: {found}, expected {expected}")]
    Unexpected { found: String, expected: String },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Invalid element in expression: {text:?} at offset {offset}")]
    InvalidCharacter { text: String, offset: usize },

    #[error("Empty expression")]
    Empty,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parser
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser { lexer: Lexer::new(source) }
    }

    // ============ Utilities ============

    fn peek(&mut self) -> Option<&Token> {
        self.lexer.peek()
    }

    fn next(&mut self) -> Option<Token> {
        self.lexer.next()
    }

    /// Error for a token that did not fit, or for the end of input
    fn unexpected(&self, found: Option<Token>, expected: &str) -> ParseError {
        if let Some((loc, text)) = self.lexer.invalid() {
            return ParseError::InvalidCharacter {
                text: text.to_string(),
                offset: loc.start,
            };
        }
        match found {
            Some(t) => ParseError::Unexpected {
                found: t.to_string(),
                expected: expected.into(),
            },
            None => ParseError::UnexpectedEof { expected: expected.into() },
        }
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        match self.next() {
            Some(ref t) if t == &expected => Ok(()),
            other => Err(self.unexpected(other, &format!("'{}'", expected))),
        }
    }

    /// Require that all input has been consumed
    pub fn expect_end(&mut self) -> ParseResult<()> {
        match self.next() {
            None if self.lexer.invalid().is_none() => Ok(()),
            other => Err(self.unexpected(other, "end of expression")),
        }
    }

    // ============ Expression Parsing (Pratt) ============

    /// Parse an expression
    pub fn parse_expr(&mut self) -> ParseResult<SizeExpr> {
        if !self.lexer.has_more() && self.lexer.invalid().is_none() {
            return Err(ParseError::Empty);
        }
        self.parse_expr_bp(0)
    }

    /// Parse expression with minimum binding power
    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<SizeExpr> {
        let mut lhs = self.parse_prefix()?;

        while let Some(op) = self.peek().and_then(binop_of) {
            let prec = op.precedence();
            if prec < min_bp {
                break;
            }
            self.next();
            // All operators are left-associative
            let rhs = self.parse_expr_bp(prec + 1)?;
            lhs = SizeExpr::binop(lhs, op, rhs);
        }

        Ok(lhs)
    }

    /// Parse prefix expression (atoms and unary minus)
    fn parse_prefix(&mut self) -> ParseResult<SizeExpr> {
        match self.peek().cloned() {
            Some(Token::Minus) => {
                self.next();
                let operand = self.parse_prefix()?;
                Ok(SizeExpr::neg(operand))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> ParseResult<SizeExpr> {
        match self.next() {
            Some(Token::Int(n)) => Ok(SizeExpr::Int(n)),
            Some(Token::Float(v)) => Ok(SizeExpr::Float(v)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    return Err(ParseError::Unexpected {
                        found: format!("call to {}", name),
                        expected: "arithmetic only".into(),
                    });
                }
                Ok(SizeExpr::var(name))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr_bp(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(self.unexpected(other, "expression")),
        }
    }
}

fn binop_of(token: &Token) -> Option<BinOp> {
    match token {
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        Token::SlashSlash => Some(BinOp::FloorDiv),
        Token::Percent => Some(BinOp::Mod),
        _ => None,
    }
}

/// Parse a complete size expression
pub fn parse_expr(source: &str) -> ParseResult<SizeExpr> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}
