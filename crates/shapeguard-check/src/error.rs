//! Validation errors
//!
//! Every failure is a structured value: dimension index, expected and actual
//! sizes, and the symbol or expression text involved are kept as fields so a
//! caller can render its own messages. The `Display` strings are the default
//! rendering.

use shapeguard_parse::parser::ParseError;
use thiserror::Error;

// ============================================================
// Expression evaluation
// ============================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Invalid size expression: {0}")]
    InvalidExpression(#[from] ParseError),

    /// A compound expression mentioned a symbol that has no value yet
    #[error("Symbol '{name}' in {expr:?} must be used on its own before it appears in an expression")]
    UnboundName { name: String, expr: String },

    #[error("Expression {expr:?} must evaluate to an integer, got {value}")]
    NonIntegerResult { expr: String, value: f64 },

    #[error("Division by zero in {expr:?}")]
    DivisionByZero { expr: String },
}

pub type ExprResult<T> = Result<T, ExprError>;

// ============================================================
// Constraint store
// ============================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("Invalid value, {expected} != {actual}")]
    ValueMismatch { expected: i64, actual: f64 },

    /// The expression (or the named symbol) already has a different value
    #[error("{} is already assigned to {assigned}, you provide {actual}", .symbol.as_deref().unwrap_or(.expr))]
    AlreadyAssigned {
        expr: String,
        symbol: Option<String>,
        assigned: f64,
        actual: f64,
    },

    #[error("Error expression {expr} (too many unsolved symbols: {})", .symbols.join(", "))]
    UnsolvableSymbols { expr: String, symbols: Vec<String> },

    #[error("Unsolved symbols in {expr}: {}", .symbols.join(", "))]
    UnresolvedSymbol { expr: String, symbols: Vec<String> },

    #[error("Invalid value, value you provide should be in range [{min}, {max}), you provide {actual}")]
    RangeViolation { min: f64, max: f64, actual: f64 },

    #[error("Range [{min}, {max}) is empty")]
    InvalidRange { min: f64, max: f64 },

    #[error("Cannot solve {expr} for {symbol}: not an affine expression")]
    NonAffine { expr: String, symbol: String },

    #[error("Symbol {symbol} would be {value}, which is not an integer size")]
    NonIntegerSolution { symbol: String, value: f64 },

    #[error(transparent)]
    Expr(#[from] ExprError),
}

pub type ConstraintResult<T> = Result<T, ConstraintError>;

// ============================================================
// Shape validation
// ============================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("This tensor-like object must have {expected} dimensions, which shape is {shape:?}")]
    RankMismatch {
        expected: usize,
        actual: usize,
        shape: Vec<usize>,
    },

    #[error("The {index}-th dimension of this tensor-like object must have size {expected}{}, you provide {actual}",
        .symbol.as_ref().map(|s| format!(" (symbol \"{}\")", s)).unwrap_or_default())]
    DimensionSize {
        index: usize,
        expected: f64,
        actual: usize,
        symbol: Option<String>,
    },

    #[error("The {index}-th dimension of this tensor-like object must have size in range [{min}, {max}){}, you provide {actual}",
        .symbol.as_ref().map(|s| format!(" (symbol \"{}\")", s)).unwrap_or_default())]
    DimensionRange {
        index: usize,
        min: f64,
        max: f64,
        actual: usize,
        symbol: Option<String>,
    },

    #[error("The {index}-th dimension of this tensor-like object: {source}")]
    Constraint {
        index: usize,
        #[source]
        source: ConstraintError,
    },
}

impl ShapeError {
    /// Dimension the error refers to, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            ShapeError::RankMismatch { .. } => None,
            ShapeError::DimensionSize { index, .. }
            | ShapeError::DimensionRange { index, .. }
            | ShapeError::Constraint { index, .. } => Some(*index),
        }
    }
}

pub type ShapeResult<T> = Result<T, ShapeError>;

// ============================================================
// Value ranges
// ============================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("This tensor-like object should have a minimum value of {min}, but its actual minimum value is {actual_min}")]
    BelowMinimum { min: f64, actual_min: f64 },

    #[error("This tensor-like object should have a maximum value below {max}, but its actual maximum value is {actual_max}")]
    AboveMaximum { max: f64, actual_max: f64 },

    #[error("This value should be in range [{min}, {max}), you provided {value}")]
    OutOfInterval { min: f64, max: f64, value: f64 },
}

pub type RangeResult<T> = Result<T, RangeError>;

// ============================================================
// Tensors
// ============================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("Shape {shape:?} needs {expected} elements, got {found}")]
    DataLength {
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("Shape {shape:?} has more elements than fit in memory")]
    TooLarge { shape: Vec<usize> },
}

// ============================================================
// Calls
// ============================================================

/// Failure of one argument
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("A value range needs a tensor with data, got a shape only")]
    NoValues,

    #[error("Expected a tensor-like value, got a scalar")]
    NotATensor,

    #[error("Expected a scalar, got a tensor-like value")]
    NotAScalar,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Parameter '{param}': {error}")]
pub struct ParamError {
    pub param: String,
    #[source]
    pub error: ArgError,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("Expected {expected} argument(s), got {found}")]
    Arity { expected: usize, found: usize },

    #[error(transparent)]
    Param(ParamError),

    #[error("{} parameter(s) failed validation:\n{}", .0.len(),
        .0.iter().map(|e| format!("  {}", e)).collect::<Vec<_>>().join("\n"))]
    Violations(Vec<ParamError>),
}

impl CallError {
    /// Every parameter failure carried by this error
    pub fn param_errors(&self) -> &[ParamError] {
        match self {
            CallError::Arity { .. } => &[],
            CallError::Param(e) => std::slice::from_ref(e),
            CallError::Violations(v) => v,
        }
    }
}

pub type CallResult<T> = Result<T, CallError>;
