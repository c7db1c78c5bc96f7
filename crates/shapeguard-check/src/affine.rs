//! Affine forms and the single-unknown solver
//!
//! Size expressions met in practice are affine in their unknowns:
//! `2 * W`, `X + 2`, `(N - 1) / 2`. After substituting known symbols such an
//! expression reduces to `c₀ + Σ cᵢ·xᵢ`, which is all the constraint store
//! needs to count free symbols and to solve `a·x + b = target`.
//!
//! Anything that does not reduce (a product of two unknowns, floor division
//! of an unknown) is left to the [`Solver`] installed in the store.

use crate::error::{ConstraintError, ConstraintResult, ExprError, ExprResult};
use crate::eval::Bindings;
use shapeguard_ast::expr::SizeExpr;
use shapeguard_ast::op::BinOp;
use std::collections::BTreeMap;

/// Coefficients smaller than this are treated as cancelled
const COEFF_EPSILON: f64 = 1e-12;

/// c₀ + Σ cᵢ·xᵢ over unbound symbols
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Affine {
    pub coeffs: BTreeMap<String, f64>,
    pub constant: f64,
}

impl Affine {
    pub fn constant(c: f64) -> Self {
        Affine { coeffs: BTreeMap::new(), constant: c }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(name.into(), 1.0);
        Affine { coeffs, constant: 0.0 }
    }

    /// Reduce `expr` under `bindings`.
    ///
    /// Returns `Ok(None)` if the expression is not affine in its unbound
    /// symbols.
    pub fn from_expr(expr: &SizeExpr, bindings: &Bindings) -> ExprResult<Option<Affine>> {
        reduce(expr, expr, bindings)
    }

    /// Unbound symbols with a non-zero coefficient, sorted
    pub fn free_symbols(&self) -> Vec<String> {
        self.coeffs.keys().cloned().collect()
    }

    pub fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coefficient(&self, symbol: &str) -> f64 {
        self.coeffs.get(symbol).copied().unwrap_or(0.0)
    }

    fn plus(mut self, other: Affine, sign: f64) -> Affine {
        self.constant += sign * other.constant;
        for (name, c) in other.coeffs {
            *self.coeffs.entry(name).or_insert(0.0) += sign * c;
        }
        self.prune()
    }

    fn scale(mut self, k: f64) -> Affine {
        self.constant *= k;
        for c in self.coeffs.values_mut() {
            *c *= k;
        }
        self.prune()
    }

    fn prune(mut self) -> Affine {
        self.coeffs.retain(|_, c| c.abs() >= COEFF_EPSILON);
        self
    }
}

fn reduce(node: &SizeExpr, root: &SizeExpr, bindings: &Bindings) -> ExprResult<Option<Affine>> {
    let div_by_zero = || ExprError::DivisionByZero { expr: root.to_string() };

    let form = match node {
        SizeExpr::Int(n) => Affine::constant(*n as f64),
        SizeExpr::Float(v) => Affine::constant(*v),
        SizeExpr::Var(name) => match bindings.get(&**name) {
            Some(v) => Affine::constant(*v),
            None => Affine::symbol(name.as_ref()),
        },
        SizeExpr::UnaryOp(op, e) => match reduce(e, root, bindings)? {
            Some(a) if a.is_constant() => Affine::constant(op.apply(a.constant)),
            Some(a) => a.scale(-1.0),
            None => return Ok(None),
        },
        SizeExpr::BinOp(l, op, r) => {
            let (l, r) = match (reduce(l, root, bindings)?, reduce(r, root, bindings)?) {
                (Some(l), Some(r)) => (l, r),
                _ => return Ok(None),
            };
            if l.is_constant() && r.is_constant() {
                let v = op.apply(l.constant, r.constant).ok_or_else(div_by_zero)?;
                return Ok(Some(Affine::constant(v)));
            }
            match op {
                BinOp::Add => l.plus(r, 1.0),
                BinOp::Sub => l.plus(r, -1.0),
                BinOp::Mul if l.is_constant() => r.scale(l.constant),
                BinOp::Mul if r.is_constant() => l.scale(r.constant),
                BinOp::Div if r.is_constant() => {
                    if r.constant == 0.0 {
                        return Err(div_by_zero());
                    }
                    l.scale(1.0 / r.constant)
                }
                _ => return Ok(None),
            }
        }
    };
    Ok(Some(form))
}

/// Finds the value of one unknown.
///
/// Implementations see the original expression, the unknown's name, the
/// target value and the current bindings. Every other symbol in `expr` is
/// either bound or cancels out of its linear form: in `X - X + Y` only `Y`
/// is passed as the unknown and `X` may be unbound, so a solver that
/// evaluates `expr` directly has to tolerate [`ExprError::UnboundName`].
///
/// [`ExprError::UnboundName`]: crate::error::ExprError::UnboundName
pub trait Solver: std::fmt::Debug + Send + Sync {
    fn solve(&self, expr: &SizeExpr, symbol: &str, target: f64, bindings: &Bindings) -> ConstraintResult<f64>;
}

/// Solves `a·x + b = target` by `x = (target - b) / a`
#[derive(Debug, Clone, Copy, Default)]
pub struct AffineSolver;

impl Solver for AffineSolver {
    fn solve(&self, expr: &SizeExpr, symbol: &str, target: f64, bindings: &Bindings) -> ConstraintResult<f64> {
        let non_affine = || ConstraintError::NonAffine {
            expr: expr.to_string(),
            symbol: symbol.to_string(),
        };
        let form = Affine::from_expr(expr, bindings)?.ok_or_else(non_affine)?;
        let a = form.coefficient(symbol);
        if a == 0.0 || form.coeffs.len() != 1 {
            return Err(non_affine());
        }
        Ok((target - form.constant) / a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeguard_parse::parser::parse_expr;

    fn form(src: &str, bindings: &Bindings) -> Option<Affine> {
        Affine::from_expr(&parse_expr(src).unwrap(), bindings).unwrap()
    }

    #[test]
    fn test_linear_combination() {
        let a = form("2 * W + 3 - W / 2", &Bindings::new()).unwrap();
        assert_eq!(a.coefficient("W"), 1.5);
        assert_eq!(a.constant, 3.0);
    }

    #[test]
    fn test_substitutes_bindings() {
        let mut b = Bindings::new();
        b.insert("X".into(), 4.0);
        let a = form("X + 2", &b).unwrap();
        assert!(a.is_constant());
        assert_eq!(a.constant, 6.0);
    }

    #[test]
    fn test_cancellation_removes_symbol() {
        let a = form("X - X + 3", &Bindings::new()).unwrap();
        assert!(a.is_constant());
        assert_eq!(a.constant, 3.0);
    }

    #[test]
    fn test_product_of_unknowns_is_not_affine() {
        assert!(form("X * X", &Bindings::new()).is_none());
        assert!(form("N // 2", &Bindings::new()).is_none());
        assert!(form("4 / N", &Bindings::new()).is_none());
    }

    #[test]
    fn test_product_with_bound_symbol_is_affine() {
        let mut b = Bindings::new();
        b.insert("H".into(), 3.0);
        let a = form("H * W", &b).unwrap();
        assert_eq!(a.free_symbols(), vec!["W".to_string()]);
        assert_eq!(a.coefficient("W"), 3.0);
    }

    #[test]
    fn test_constant_division_by_zero() {
        let e = parse_expr("X / 0").unwrap();
        assert!(matches!(
            Affine::from_expr(&e, &Bindings::new()),
            Err(ExprError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_affine_solver() {
        let e = parse_expr("2 * W").unwrap();
        assert_eq!(AffineSolver.solve(&e, "W", 8.0, &Bindings::new()).unwrap(), 4.0);

        let e = parse_expr("Y - 1").unwrap();
        assert_eq!(AffineSolver.solve(&e, "Y", 6.0, &Bindings::new()).unwrap(), 7.0);
    }

    #[test]
    fn test_affine_solver_rejects_nonlinear() {
        let e = parse_expr("X * X").unwrap();
        assert!(matches!(
            AffineSolver.solve(&e, "X", 9.0, &Bindings::new()),
            Err(ConstraintError::NonAffine { .. })
        ));
    }
}
