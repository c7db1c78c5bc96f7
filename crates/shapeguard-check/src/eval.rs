//! Expression evaluation
//!
//! Evaluates [`SizeExpr`] trees against a symbol table. Only bare identifiers
//! bind on first use; a compound expression with an unknown symbol is an
//! error.

use crate::error::{ExprError, ExprResult};
use shapeguard_ast::expr::SizeExpr;
use shapeguard_parse::parser::parse_expr;
use std::collections::BTreeMap;

/// Symbol name → resolved value
pub type Bindings = BTreeMap<String, f64>;

/// Distance from the nearest integer still treated as integral
pub const INTEGER_EPSILON: f64 = 1e-9;

/// Evaluate an expression; every symbol must be bound
pub fn evaluate(expr: &SizeExpr, bindings: &Bindings) -> ExprResult<f64> {
    eval_node(expr, expr, bindings)
}

fn eval_node(node: &SizeExpr, root: &SizeExpr, bindings: &Bindings) -> ExprResult<f64> {
    match node {
        SizeExpr::Int(n) => Ok(*n as f64),
        SizeExpr::Float(v) => Ok(*v),
        SizeExpr::Var(name) => bindings.get(&**name).copied().ok_or_else(|| ExprError::UnboundName {
            name: name.to_string(),
            expr: root.to_string(),
        }),
        SizeExpr::BinOp(l, op, r) => {
            let l = eval_node(l, root, bindings)?;
            let r = eval_node(r, root, bindings)?;
            op.apply(l, r).ok_or_else(|| ExprError::DivisionByZero { expr: root.to_string() })
        }
        SizeExpr::UnaryOp(op, e) => Ok(op.apply(eval_node(e, root, bindings)?)),
    }
}

/// Evaluate and require an integral result
pub fn evaluate_int(expr: &SizeExpr, bindings: &Bindings) -> ExprResult<i64> {
    let value = evaluate(expr, bindings)?;
    as_integer(value).ok_or_else(|| ExprError::NonIntegerResult {
        expr: expr.to_string(),
        value,
    })
}

/// Parse and evaluate source text
pub fn evaluate_str(source: &str, bindings: &Bindings) -> ExprResult<f64> {
    let expr = parse_expr(source)?;
    evaluate(&expr, bindings)
}

/// Resolve a single spec token against the table.
///
/// - an integer literal is its own value
/// - a bare identifier binds to `actual_size` the first time it is seen
/// - anything else is a compound expression and never binds
pub fn evaluate_identifier_or_literal(
    token: &str,
    bindings: &mut Bindings,
    actual_size: usize,
) -> ExprResult<i64> {
    let expr = parse_expr(token.trim())?;
    match &expr {
        SizeExpr::Int(n) => Ok(*n),
        SizeExpr::Var(name) => {
            let value = *bindings.entry(name.to_string()).or_insert(actual_size as f64);
            as_integer(value).ok_or_else(|| ExprError::NonIntegerResult {
                expr: name.to_string(),
                value,
            })
        }
        _ => evaluate_int(&expr, bindings),
    }
}

/// `Some(n)` if `value` is within [`INTEGER_EPSILON`] of the integer `n`
pub fn as_integer(value: f64) -> Option<i64> {
    let rounded = value.round();
    if value.is_finite() && (value - rounded).abs() < INTEGER_EPSILON {
        Some(rounded as i64)
    } else {
        None
    }
}
