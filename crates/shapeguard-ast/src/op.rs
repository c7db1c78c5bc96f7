//! Operators allowed in size expressions
//!
//! The set is closed: there is no exponentiation, comparison, boolean or call
//! operator, so nothing outside plain arithmetic can be written down.

use serde::{Deserialize, Serialize};

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /  (true division)
    FloorDiv, // //
    Mod,      // %  (sign follows the divisor)
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg, // -
}

impl BinOp {
    /// Source text for this operator
    pub fn glyph(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => 2,
        }
    }

    /// Apply the operator to two numbers.
    ///
    /// Returns `None` when the right operand of a division or modulo is zero.
    pub fn apply(&self, l: f64, r: f64) -> Option<f64> {
        match self {
            BinOp::Add => Some(l + r),
            BinOp::Sub => Some(l - r),
            BinOp::Mul => Some(l * r),
            BinOp::Div if r == 0.0 => None,
            BinOp::Div => Some(l / r),
            BinOp::FloorDiv if r == 0.0 => None,
            BinOp::FloorDiv => Some((l / r).floor()),
            BinOp::Mod if r == 0.0 => None,
            BinOp::Mod => Some(l - r * (l / r).floor()),
        }
    }
}

impl UnaryOp {
    pub fn glyph(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }

    pub fn apply(&self, v: f64) -> f64 {
        match self {
            UnaryOp::Neg => -v,
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
