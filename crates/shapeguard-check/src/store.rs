//! Constraint store
//!
//! Per-call symbol table. Every symbolic dimension is fed through
//! [`ConstraintStore::bind_equal`] or [`ConstraintStore::bind_range`]; the store
//! binds new symbols, solves single-unknown equations and reports
//! contradictions. A bound symbol never changes value until [`clear`].
//!
//! [`clear`]: ConstraintStore::clear

use crate::affine::{Affine, AffineSolver, Solver};
use crate::error::{ConstraintError, ConstraintResult, ExprResult};
use crate::eval::{as_integer, Bindings};
use serde::{Deserialize, Serialize};
use shapeguard_ast::expr::SizeExpr;
use std::sync::Arc;
use tracing::debug;

/// Store configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Largest difference still treated as equal
    pub tolerance: f64,
    /// Reject solved values that are not whole numbers
    #[serde(default)]
    pub integer_solutions: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            tolerance: 1e-10,
            integer_solutions: false,
        }
    }
}

/// Left-hand side of an equality constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EqKey<'a> {
    Literal(i64),
    Expr(&'a SizeExpr),
}

impl From<i64> for EqKey<'_> {
    fn from(n: i64) -> Self {
        EqKey::Literal(n)
    }
}

impl<'a> From<&'a SizeExpr> for EqKey<'a> {
    fn from(e: &'a SizeExpr) -> Self {
        EqKey::Expr(e)
    }
}

/// Result of resolving an expression without binding anything
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(f64),
    /// Symbols that still have no value, sorted
    Unresolved(Vec<String>),
}

impl Resolved {
    pub fn value(&self) -> Option<f64> {
        match self {
            Resolved::Value(v) => Some(*v),
            Resolved::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstraintStore {
    bindings: Bindings,
    config: StoreConfig,
    solver: Arc<dyn Solver>,
}

impl Default for ConstraintStore {
    fn default() -> Self {
        ConstraintStore::new()
    }
}

impl ConstraintStore {
    pub fn new() -> Self {
        ConstraintStore::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        ConstraintStore {
            bindings: Bindings::new(),
            config,
            solver: Arc::new(AffineSolver),
        }
    }

    /// Replace the solver used for single-unknown equations
    pub fn with_solver(mut self, solver: impl Solver + 'static) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ============ Accessors ============

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.bindings.get(name).copied()
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        if !self.bindings.is_empty() {
            debug!("clearing {} binding(s)", self.bindings.len());
        }
        self.bindings.clear();
    }

    // ============ Binding ============

    /// Bind `name` directly. Rebinding to the same value is a no-op.
    pub fn bind_symbol(&mut self, name: &str, value: f64) -> ConstraintResult<()> {
        match self.get(name) {
            Some(assigned) if (assigned - value).abs() < self.config.tolerance => Ok(()),
            Some(assigned) => Err(ConstraintError::AlreadyAssigned {
                expr: name.to_string(),
                symbol: Some(name.to_string()),
                assigned,
                actual: value,
            }),
            None => {
                debug!("bind {} = {}", name, value);
                self.bindings.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Require `key == actual`, binding or solving for at most one unknown
    pub fn bind_equal<'a>(&mut self, key: impl Into<EqKey<'a>>, actual: f64) -> ConstraintResult<()> {
        match key.into() {
            EqKey::Literal(expected) => {
                if expected as f64 == actual {
                    Ok(())
                } else {
                    Err(ConstraintError::ValueMismatch { expected, actual })
                }
            }
            EqKey::Expr(expr) => self.bind_expr(expr, actual),
        }
    }

    fn bind_expr(&mut self, expr: &SizeExpr, actual: f64) -> ConstraintResult<()> {
        let free = match Affine::from_expr(expr, &self.bindings)? {
            Some(form) if form.is_constant() => {
                let assigned = form.constant;
                if (assigned - actual).abs() < self.config.tolerance {
                    return Ok(());
                }
                return Err(ConstraintError::AlreadyAssigned {
                    expr: expr.to_string(),
                    symbol: None,
                    assigned,
                    actual,
                });
            }
            Some(form) => form.free_symbols(),
            None => self.unbound_symbols(expr),
        };

        if free.len() != 1 {
            return Err(ConstraintError::UnsolvableSymbols {
                expr: expr.to_string(),
                symbols: free,
            });
        }
        let symbol = &free[0];
        let value = self.solver.solve(expr, symbol, actual, &self.bindings)?;
        let value = if self.config.integer_solutions {
            as_integer(value).ok_or_else(|| ConstraintError::NonIntegerSolution {
                symbol: symbol.clone(),
                value,
            })? as f64
        } else {
            value
        };
        debug!("solved {} = {} from {} == {}", symbol, value, expr, actual);
        self.bind_symbol(symbol, value)
    }

    /// Require `min <= actual < max`; both ends must already resolve
    pub fn bind_range(
        &mut self,
        min: Option<&SizeExpr>,
        max: Option<&SizeExpr>,
        actual: f64,
    ) -> ConstraintResult<()> {
        let lo = self.resolve_bound(min, f64::NEG_INFINITY)?;
        let hi = self.resolve_bound(max, f64::INFINITY)?;
        if hi < lo {
            return Err(ConstraintError::InvalidRange { min: lo, max: hi });
        }
        if lo <= actual && actual < hi {
            Ok(())
        } else {
            Err(ConstraintError::RangeViolation { min: lo, max: hi, actual })
        }
    }

    fn resolve_bound(&self, bound: Option<&SizeExpr>, missing: f64) -> ConstraintResult<f64> {
        let Some(expr) = bound else {
            return Ok(missing);
        };
        match self.resolve(expr)? {
            Resolved::Value(v) => Ok(v),
            Resolved::Unresolved(symbols) => Err(ConstraintError::UnresolvedSymbol {
                expr: expr.to_string(),
                symbols,
            }),
        }
    }

    // ============ Resolution ============

    /// Value of `expr` under the current bindings, if every symbol is known
    pub fn resolve(&self, expr: &SizeExpr) -> ExprResult<Resolved> {
        Ok(match Affine::from_expr(expr, &self.bindings)? {
            Some(form) if form.is_constant() => Resolved::Value(form.constant),
            Some(form) => Resolved::Unresolved(form.free_symbols()),
            None => Resolved::Unresolved(self.unbound_symbols(expr)),
        })
    }

    /// False only if both ends resolve and `max < min`
    pub fn resolve_range(&self, min: Option<&SizeExpr>, max: Option<&SizeExpr>) -> ExprResult<bool> {
        let value = |e: Option<&SizeExpr>| -> ExprResult<Option<f64>> {
            match e {
                Some(e) => Ok(self.resolve(e)?.value()),
                None => Ok(None),
            }
        };
        Ok(match (value(min)?, value(max)?) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        })
    }

    fn unbound_symbols(&self, expr: &SizeExpr) -> Vec<String> {
        expr.symbols().into_iter().filter(|s| !self.is_bound(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeguard_parse::parser::parse_expr;

    fn e(src: &str) -> SizeExpr {
        parse_expr(src).unwrap()
    }

    #[test]
    fn test_literal_key() {
        let mut store = ConstraintStore::new();
        assert!(store.bind_equal(4i64, 4.0).is_ok());
        assert_eq!(
            store.bind_equal(4i64, 5.0),
            Err(ConstraintError::ValueMismatch { expected: 4, actual: 5.0 })
        );
    }

    #[test]
    fn test_bare_symbol_binds() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        assert_eq!(store.get("X"), Some(4.0));
    }

    #[test]
    fn test_rebinding_is_idempotent() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        store.bind_equal(&e("X"), 4.0).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_inconsistent_rebinding() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        assert!(matches!(
            store.bind_equal(&e("X"), 5.0),
            Err(ConstraintError::AlreadyAssigned { assigned, actual, .. }) if assigned == 4.0 && actual == 5.0
        ));
        assert_eq!(store.get("X"), Some(4.0));
    }

    #[test]
    fn test_solves_scaled_symbol() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("2 * W"), 8.0).unwrap();
        assert_eq!(store.get("W"), Some(4.0));
    }

    #[test]
    fn test_solves_offset_symbol() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("Y - 1"), 6.0).unwrap();
        assert_eq!(store.get("Y"), Some(7.0));
    }

    #[test]
    fn test_solves_with_bound_partner() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("H"), 3.0).unwrap();
        store.bind_equal(&e("H * W + 1"), 13.0).unwrap();
        assert_eq!(store.get("W"), Some(4.0));
    }

    #[test]
    fn test_resolved_mismatch_has_no_symbol() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        assert_eq!(
            store.bind_equal(&e("X + 2"), 7.0),
            Err(ConstraintError::AlreadyAssigned {
                expr: "X + 2".into(),
                symbol: None,
                assigned: 6.0,
                actual: 7.0,
            })
        );
    }

    #[test]
    fn test_two_unknowns_unsolvable() {
        let mut store = ConstraintStore::new();
        assert_eq!(
            store.bind_equal(&e("Y + X"), 5.0),
            Err(ConstraintError::UnsolvableSymbols {
                expr: "Y + X".into(),
                symbols: vec!["X".into(), "Y".into()],
            })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_cancelled_symbol_is_not_free() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X - X + 3"), 3.0).unwrap();
        assert!(store.is_empty());
        assert!(store.bind_equal(&e("X - X + 3"), 4.0).is_err());
    }

    #[test]
    fn test_cancelled_partner_stays_unbound() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X - X + Y"), 5.0).unwrap();
        assert_eq!(store.get("Y"), Some(5.0));
        assert!(!store.is_bound("X"));
    }

    #[test]
    fn test_fractional_solution_is_bound() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("2 * W"), 7.0).unwrap();
        assert_eq!(store.get("W"), Some(3.5));
        assert!(store.bind_equal(&e("2 * W"), 7.0).is_ok());
        assert!(store.bind_equal(&e("W"), 3.0).is_err());
    }

    #[test]
    fn test_integer_solutions_when_configured() {
        let config = StoreConfig { integer_solutions: true, ..StoreConfig::default() };
        let mut store = ConstraintStore::with_config(config);
        assert!(matches!(
            store.bind_equal(&e("2 * W"), 7.0),
            Err(ConstraintError::NonIntegerSolution { ref symbol, value }) if symbol == "W" && value == 3.5
        ));
        assert!(!store.is_bound("W"));
        store.bind_equal(&e("2 * W"), 8.0).unwrap();
        assert_eq!(store.get("W"), Some(4.0));
    }

    #[test]
    fn test_config_without_integer_flag_deserializes() {
        let config: StoreConfig = shapeguard_ast::ser::from_json(r#"{"tolerance": 0.001}"#).unwrap();
        assert_eq!(config, StoreConfig { tolerance: 0.001, integer_solutions: false });
    }

    #[test]
    fn test_nonlinear_with_default_solver() {
        let mut store = ConstraintStore::new();
        assert!(matches!(
            store.bind_equal(&e("X * X"), 9.0),
            Err(ConstraintError::NonAffine { .. })
        ));
    }

    /// Integer search over a small window
    #[derive(Debug)]
    struct BruteForce;

    impl Solver for BruteForce {
        fn solve(&self, expr: &SizeExpr, symbol: &str, target: f64, bindings: &Bindings) -> ConstraintResult<f64> {
            let mut scratch = bindings.clone();
            for candidate in 0..=1024 {
                scratch.insert(symbol.to_string(), candidate as f64);
                if crate::eval::evaluate(expr, &scratch).ok() == Some(target) {
                    return Ok(candidate as f64);
                }
            }
            Err(ConstraintError::NonAffine { expr: expr.to_string(), symbol: symbol.to_string() })
        }
    }

    #[test]
    fn test_custom_solver() {
        let mut store = ConstraintStore::new().with_solver(BruteForce);
        store.bind_equal(&e("X * X"), 9.0).unwrap();
        assert_eq!(store.get("X"), Some(3.0));
    }

    #[test]
    fn test_range_half_open() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        store.bind_equal(&e("Y"), 6.0).unwrap();
        let (x, y) = (e("X"), e("Y"));
        assert!(store.bind_range(Some(&x), Some(&y), 4.0).is_ok());
        assert!(store.bind_range(Some(&x), Some(&y), 5.0).is_ok());
        assert_eq!(
            store.bind_range(Some(&x), Some(&y), 6.0),
            Err(ConstraintError::RangeViolation { min: 4.0, max: 6.0, actual: 6.0 })
        );
    }

    #[test]
    fn test_range_missing_ends() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        let x = e("X");
        assert!(store.bind_range(Some(&x), None, 1e9).is_ok());
        assert_eq!(
            store.bind_range(Some(&x), None, 1.0),
            Err(ConstraintError::RangeViolation { min: 4.0, max: f64::INFINITY, actual: 1.0 })
        );
        assert!(store.bind_range(None, Some(&x), -3.0).is_ok());
    }

    #[test]
    fn test_range_never_binds() {
        let mut store = ConstraintStore::new();
        let z = e("Z");
        assert_eq!(
            store.bind_range(Some(&z), None, 3.0),
            Err(ConstraintError::UnresolvedSymbol { expr: "Z".into(), symbols: vec!["Z".into()] })
        );
        assert!(!store.is_bound("Z"));
    }

    #[test]
    fn test_inverted_range() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 6.0).unwrap();
        store.bind_equal(&e("Y"), 4.0).unwrap();
        assert_eq!(
            store.bind_range(Some(&e("X")), Some(&e("Y")), 5.0),
            Err(ConstraintError::InvalidRange { min: 6.0, max: 4.0 })
        );
        assert!(!store.resolve_range(Some(&e("X")), Some(&e("Y"))).unwrap());
        assert!(store.resolve_range(Some(&e("X")), Some(&e("Q"))).unwrap());
    }

    #[test]
    fn test_resolve_does_not_fail_on_unknowns() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        assert_eq!(store.resolve(&e("X + 2")).unwrap(), Resolved::Value(6.0));
        assert_eq!(
            store.resolve(&e("X * B * A")).unwrap(),
            Resolved::Unresolved(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn test_clear() {
        let mut store = ConstraintStore::new();
        store.bind_equal(&e("X"), 4.0).unwrap();
        store.clear();
        assert!(store.is_empty());
        store.bind_equal(&e("X"), 5.0).unwrap();
        assert_eq!(store.get("X"), Some(5.0));
    }

    #[test]
    fn test_tolerance_from_config() {
        let mut store = ConstraintStore::with_config(StoreConfig { tolerance: 0.5, ..StoreConfig::default() });
        store.bind_equal(&e("X"), 4.0).unwrap();
        assert!(store.bind_equal(&e("X / 2"), 2.25).is_ok());
    }
}
