//! Size expressions
//!
//! A `SizeExpr` describes the size of a dimension in terms of literals and
//! named symbols: `4`, `X`, `X + 2`, `2 * W`, `(N - 1) // 2`.

use crate::op::{BinOp, UnaryOp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Arithmetic expression over dimension symbols
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SizeExpr {
    /// Non-negative integer literal
    Int(i64),

    /// Decimal literal
    Float(f64),

    /// Named symbol
    Var(Box<str>),

    /// Binary operation: l op r
    BinOp(Box<SizeExpr>, BinOp, Box<SizeExpr>),

    /// Unary operation: op e
    UnaryOp(UnaryOp, Box<SizeExpr>),
}

impl SizeExpr {
    // ============ Constructors ============

    pub fn int(n: i64) -> Self {
        SizeExpr::Int(n)
    }

    pub fn float(v: f64) -> Self {
        SizeExpr::Float(v)
    }

    pub fn var(name: impl Into<Box<str>>) -> Self {
        SizeExpr::Var(name.into())
    }

    pub fn binop(l: SizeExpr, op: BinOp, r: SizeExpr) -> Self {
        SizeExpr::BinOp(Box::new(l), op, Box::new(r))
    }

    pub fn add(l: SizeExpr, r: SizeExpr) -> Self {
        Self::binop(l, BinOp::Add, r)
    }

    pub fn sub(l: SizeExpr, r: SizeExpr) -> Self {
        Self::binop(l, BinOp::Sub, r)
    }

    pub fn mul(l: SizeExpr, r: SizeExpr) -> Self {
        Self::binop(l, BinOp::Mul, r)
    }

    pub fn div(l: SizeExpr, r: SizeExpr) -> Self {
        Self::binop(l, BinOp::Div, r)
    }

    pub fn floor_div(l: SizeExpr, r: SizeExpr) -> Self {
        Self::binop(l, BinOp::FloorDiv, r)
    }

    pub fn modulo(l: SizeExpr, r: SizeExpr) -> Self {
        Self::binop(l, BinOp::Mod, r)
    }

    pub fn neg(e: SizeExpr) -> Self {
        SizeExpr::UnaryOp(UnaryOp::Neg, Box::new(e))
    }

    // ============ Queries ============

    /// The symbol name if this expression is a bare identifier
    pub fn as_var(&self) -> Option<&str> {
        match self {
            SizeExpr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// The value if this expression is a literal
    pub fn as_literal(&self) -> Option<f64> {
        match self {
            SizeExpr::Int(n) => Some(*n as f64),
            SizeExpr::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// True if the expression mentions no symbols
    pub fn is_closed(&self) -> bool {
        match self {
            SizeExpr::Int(_) | SizeExpr::Float(_) => true,
            SizeExpr::Var(_) => false,
            SizeExpr::BinOp(l, _, r) => l.is_closed() && r.is_closed(),
            SizeExpr::UnaryOp(_, e) => e.is_closed(),
        }
    }

    /// All symbol names mentioned, in sorted order
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            SizeExpr::Int(_) | SizeExpr::Float(_) => {}
            SizeExpr::Var(name) => {
                out.insert(name.to_string());
            }
            SizeExpr::BinOp(l, _, r) => {
                l.collect_symbols(out);
                r.collect_symbols(out);
            }
            SizeExpr::UnaryOp(_, e) => e.collect_symbols(out),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            SizeExpr::BinOp(_, op, _) => op.precedence(),
            SizeExpr::UnaryOp(..) => 3,
            _ => 4,
        }
    }
}

impl From<i64> for SizeExpr {
    fn from(n: i64) -> Self {
        SizeExpr::Int(n)
    }
}

impl From<&str> for SizeExpr {
    fn from(name: &str) -> Self {
        SizeExpr::var(name)
    }
}

impl std::ops::Add for SizeExpr {
    type Output = SizeExpr;
    fn add(self, rhs: SizeExpr) -> SizeExpr {
        SizeExpr::add(self, rhs)
    }
}

impl std::ops::Sub for SizeExpr {
    type Output = SizeExpr;
    fn sub(self, rhs: SizeExpr) -> SizeExpr {
        SizeExpr::sub(self, rhs)
    }
}

impl std::ops::Mul for SizeExpr {
    type Output = SizeExpr;
    fn mul(self, rhs: SizeExpr) -> SizeExpr {
        SizeExpr::mul(self, rhs)
    }
}

impl std::ops::Div for SizeExpr {
    type Output = SizeExpr;
    fn div(self, rhs: SizeExpr) -> SizeExpr {
        SizeExpr::div(self, rhs)
    }
}

impl std::ops::Neg for SizeExpr {
    type Output = SizeExpr;
    fn neg(self) -> SizeExpr {
        SizeExpr::neg(self)
    }
}

impl std::fmt::Display for SizeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeExpr::Int(n) => write!(f, "{}", n),
            SizeExpr::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{:.1}", v),
            SizeExpr::Float(v) => write!(f, "{}", v),
            SizeExpr::Var(name) => write!(f, "{}", name),
            SizeExpr::BinOp(l, op, r) => {
                let prec = op.precedence();
                if l.precedence() < prec {
                    write!(f, "({})", l)?;
                } else {
                    write!(f, "{}", l)?;
                }
                write!(f, " {} ", op)?;
                // Operators are left-associative, so a right operand of the same level keeps its parentheses
                if r.precedence() <= prec {
                    write!(f, "({})", r)
                } else {
                    write!(f, "{}", r)
                }
            }
            SizeExpr::UnaryOp(op, e) => {
                if e.precedence() < 3 {
                    write!(f, "{}({})", op, e)
                } else {
                    write!(f, "{}{}", op, e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_simple() {
        let e = SizeExpr::add(SizeExpr::var("X"), SizeExpr::int(2));
        assert_eq!(e.to_string(), "X + 2");
    }

    #[test]
    fn test_display_parenthesizes_lower_precedence() {
        let e = SizeExpr::mul(
            SizeExpr::add(SizeExpr::var("N"), SizeExpr::int(1)),
            SizeExpr::int(2),
        );
        assert_eq!(e.to_string(), "(N + 1) * 2");
    }

    #[test]
    fn test_display_right_subtraction() {
        let e = SizeExpr::sub(
            SizeExpr::var("A"),
            SizeExpr::sub(SizeExpr::var("B"), SizeExpr::var("C")),
        );
        assert_eq!(e.to_string(), "A - (B - C)");
    }

    #[test]
    fn test_display_keeps_right_grouping() {
        let sum = SizeExpr::add(
            SizeExpr::var("A"),
            SizeExpr::add(SizeExpr::var("B"), SizeExpr::var("C")),
        );
        assert_eq!(sum.to_string(), "A + (B + C)");
        let product = SizeExpr::mul(
            SizeExpr::var("A"),
            SizeExpr::mul(SizeExpr::var("B"), SizeExpr::var("C")),
        );
        assert_eq!(product.to_string(), "A * (B * C)");
        let left = SizeExpr::add(
            SizeExpr::add(SizeExpr::var("A"), SizeExpr::var("B")),
            SizeExpr::var("C"),
        );
        assert_eq!(left.to_string(), "A + B + C");
    }

    #[test]
    fn test_display_neg() {
        assert_eq!(SizeExpr::neg(SizeExpr::var("X")).to_string(), "-X");
        let e = SizeExpr::neg(SizeExpr::add(SizeExpr::var("X"), SizeExpr::int(1)));
        assert_eq!(e.to_string(), "-(X + 1)");
    }

    #[test]
    fn test_operator_overloads() {
        let w = SizeExpr::var("W");
        let e = SizeExpr::int(2) * w;
        assert_eq!(e.to_string(), "2 * W");
    }

    #[test]
    fn test_symbols_sorted_and_deduplicated() {
        let e = SizeExpr::var("Y") + SizeExpr::var("X") * SizeExpr::var("Y");
        let syms: Vec<_> = e.symbols().into_iter().collect();
        assert_eq!(syms, vec!["X".to_string(), "Y".to_string()]);
    }

    #[test]
    fn test_is_closed() {
        assert!((SizeExpr::int(3) + SizeExpr::float(0.5)).is_closed());
        assert!(!(SizeExpr::int(3) + SizeExpr::var("A")).is_closed());
    }
}
