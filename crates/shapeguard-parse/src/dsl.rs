//! Spec-token DSL
//!
//! Builds [`ShapeSpec`]s from a short list of tokens, the way a shape is
//! written next to a parameter:
//!
//! | token            | meaning                                   |
//! |------------------|-------------------------------------------|
//! | `4`              | `Fixed(4)`                                |
//! | `2..8`, `"2:8"`  | `NumericRange [2, 8)`                     |
//! | `..`, `":"`, `"_"`, `"*"` | any size on this axis            |
//! | `"*"` alone      | any rank                                  |
//! | `"X"`, `"X + 2"` | `SymbolicEqual`                           |
//! | `"X:"`, `"X:Y"`  | `SymbolicRange`                           |

use crate::lexer::{Lexer, Token};
use crate::parser::{parse_expr, ParseError};
use shapeguard_ast::dim::{DimSpec, ShapeSpec};
use shapeguard_ast::expr::SizeExpr;
use shapeguard_ast::interval::Interval;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};
use thiserror::Error;

/// DSL error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DslError {
    #[error("Invalid size expression {token:?}: {source}")]
    Parse {
        token: String,
        #[source]
        source: ParseError,
    },

    #[error("Size {0:?} must have only one ':'")]
    TooManyColons(String),

    #[error("Dimension size must be non-negative, got {0}")]
    NegativeSize(f64),

    #[error("Empty range [{lo}, {hi})")]
    EmptyRange { lo: f64, hi: f64 },

    #[error("Empty dimension token")]
    EmptyToken,

    #[error("Shape spec must be a bracketed, comma-separated list: {0:?}")]
    Malformed(String),
}

pub type DslResult<T> = Result<T, DslError>;

/// One entry of a spec
#[derive(Debug, Clone, PartialEq)]
pub enum SpecToken<'a> {
    Int(i64),
    Range(Option<f64>, Option<f64>),
    Str(&'a str),
}

impl<'a> From<&'a str> for SpecToken<'a> {
    fn from(s: &'a str) -> Self {
        SpecToken::Str(s)
    }
}

macro_rules! int_tokens {
    ($($t:ty),*) => {$(
        impl From<$t> for SpecToken<'_> {
            fn from(n: $t) -> Self {
                SpecToken::Int(n as i64)
            }
        }

        impl From<Range<$t>> for SpecToken<'_> {
            fn from(r: Range<$t>) -> Self {
                SpecToken::Range(Some(r.start as f64), Some(r.end as f64))
            }
        }

        impl From<RangeFrom<$t>> for SpecToken<'_> {
            fn from(r: RangeFrom<$t>) -> Self {
                SpecToken::Range(Some(r.start as f64), None)
            }
        }

        impl From<RangeTo<$t>> for SpecToken<'_> {
            fn from(r: RangeTo<$t>) -> Self {
                SpecToken::Range(None, Some(r.end as f64))
            }
        }
    )*};
}

int_tokens!(i32, i64, usize);

impl From<RangeFull> for SpecToken<'_> {
    fn from(_: RangeFull) -> Self {
        SpecToken::Range(None, None)
    }
}

/// Build a spec from a token list.
///
/// `"*"` as the only token means any rank; anywhere else it is a per-axis
/// wildcard.
pub fn build_dimension_spec(tokens: &[SpecToken<'_>]) -> DslResult<ShapeSpec> {
    if let [SpecToken::Str(s)] = tokens {
        if s.trim() == "*" {
            return Ok(ShapeSpec::AnyRank);
        }
    }
    tokens.iter().map(dim_from_token).collect::<DslResult<Vec<_>>>().map(ShapeSpec::Dims)
}

/// `spec![4, "b", 2..8]` - build a spec from mixed literal tokens
#[macro_export]
macro_rules! spec {
    ($($tok:expr),* $(,)?) => {
        $crate::dsl::build_dimension_spec(&[$($crate::dsl::SpecToken::from($tok)),*])
    };
}

/// Parse a whole spec written as text: `"[*, X, Y - 1]"`.
///
/// Brackets are optional. `"[]"` is the rank-0 spec.
pub fn parse_shape_spec(text: &str) -> DslResult<ShapeSpec> {
    let trimmed = text.trim();
    let inner = match (trimmed.strip_prefix('['), trimmed.ends_with(']')) {
        (Some(rest), true) => &rest[..rest.len() - 1],
        (None, false) => trimmed,
        _ => return Err(DslError::Malformed(text.to_string())),
    };
    if inner.trim().is_empty() {
        return Ok(ShapeSpec::Dims(vec![]));
    }
    let tokens: Vec<SpecToken<'_>> = inner.split(',').map(|s| SpecToken::Str(s.trim())).collect();
    build_dimension_spec(&tokens)
}

fn dim_from_token(token: &SpecToken<'_>) -> DslResult<DimSpec> {
    match token {
        SpecToken::Int(n) if *n < 0 => Err(DslError::NegativeSize(*n as f64)),
        SpecToken::Int(n) => Ok(DimSpec::Fixed(*n as usize)),
        SpecToken::Range(None, None) => Ok(DimSpec::Wildcard),
        SpecToken::Range(lo, hi) => numeric_range(*lo, *hi),
        SpecToken::Str(s) => dim_from_str(s),
    }
}

fn numeric_range(lo: Option<f64>, hi: Option<f64>) -> DslResult<DimSpec> {
    let interval = Interval::from_options(lo, hi);
    if interval.hi() < interval.lo() {
        return Err(DslError::EmptyRange {
            lo: interval.lo(),
            hi: interval.hi(),
        });
    }
    Ok(DimSpec::NumericRange(interval))
}

fn dim_from_str(raw: &str) -> DslResult<DimSpec> {
    let s = raw.trim();
    match s {
        "" => return Err(DslError::EmptyToken),
        "*" | "_" | ":" => return Ok(DimSpec::Wildcard),
        _ => {}
    }

    match s.matches(':').count() {
        0 => {}
        1 => {
            let (lo, hi) = s.split_once(':').ok_or(DslError::EmptyToken)?;
            return range_from_str(s, lo, hi);
        }
        _ => return Err(DslError::TooManyColons(s.to_string())),
    }

    let expr = parse_side(s, s)?;
    match fold_closed(&expr) {
        Some(v) if v < 0.0 => Err(DslError::NegativeSize(v)),
        Some(v) if v.fract() == 0.0 => Ok(DimSpec::Fixed(v as usize)),
        _ => Ok(DimSpec::SymbolicEqual(expr)),
    }
}

fn range_from_str(token: &str, lo: &str, hi: &str) -> DslResult<DimSpec> {
    let lo = optional_side(token, lo)?;
    let hi = optional_side(token, hi)?;

    let lo_val = lo.as_ref().map(fold_closed);
    let hi_val = hi.as_ref().map(fold_closed);
    match (lo_val, hi_val) {
        // Fully numeric: both ends fold to numbers, or are absent
        (None | Some(Some(_)), None | Some(Some(_))) => numeric_range(lo_val.flatten(), hi_val.flatten()),
        _ => Ok(DimSpec::SymbolicRange { min: lo, max: hi }),
    }
}

fn optional_side(token: &str, side: &str) -> DslResult<Option<SizeExpr>> {
    if side.trim().is_empty() {
        Ok(None)
    } else {
        parse_side(token, side).map(Some)
    }
}

fn parse_side(token: &str, side: &str) -> DslResult<SizeExpr> {
    parse_expr(side).map_err(|source| DslError::Parse {
        token: token.to_string(),
        source,
    })
}

/// Value of an expression without symbols
fn fold_closed(expr: &SizeExpr) -> Option<f64> {
    match expr {
        SizeExpr::Int(n) => Some(*n as f64),
        SizeExpr::Float(v) => Some(*v),
        SizeExpr::Var(_) => None,
        SizeExpr::BinOp(l, op, r) => op.apply(fold_closed(l)?, fold_closed(r)?),
        SizeExpr::UnaryOp(op, e) => Some(op.apply(fold_closed(e)?)),
    }
}

/// Split `"4x6x8"` or `"4,6,8"` or `"(4, 6, 8)"` into a concrete shape
pub fn parse_concrete_shape(text: &str) -> DslResult<Vec<usize>> {
    let trimmed = text.trim().trim_start_matches(['(', '[']).trim_end_matches([')', ']']);
    if trimmed.trim().is_empty() {
        return Ok(vec![]);
    }
    trimmed
        .split(|c: char| c == 'x' || c == ',')
        .map(|part| {
            let part = part.trim();
            let mut lexer = Lexer::new(part);
            match (lexer.next(), lexer.next(), lexer.invalid()) {
                (Some(Token::Int(n)), None, None) => Ok(n as usize),
                _ => Err(DslError::Malformed(text.to_string())),
            }
        })
        .collect()
}
