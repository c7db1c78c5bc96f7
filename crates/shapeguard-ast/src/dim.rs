//! Dimension specs
//!
//! A `ShapeSpec` is the declared shape of one tensor argument: an ordered list
//! of per-axis constraints, or the rank wildcard that accepts anything.
//!
//! ```text
//! [4, _, 2:8, X, X + 2, X:Y]
//!  │  │  │    │  │      └─ SymbolicRange   X <= d < Y
//!  │  │  │    │  └─ SymbolicEqual   d == X + 2
//!  │  │  │    └─ SymbolicEqual      d == X (binds X on first use)
//!  │  │  └─ NumericRange            2 <= d < 8
//!  │  └─ Wildcard
//!  └─ Fixed
//! ```
//!
//! Specs carry no per-call state and can be shared freely.

use crate::expr::SizeExpr;
use crate::interval::Interval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Constraint on a single axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DimSpec {
    /// Any size
    Wildcard,

    /// Exactly n
    Fixed(usize),

    /// min <= d < max
    NumericRange(Interval),

    /// d == expr
    SymbolicEqual(SizeExpr),

    /// min <= d < max with symbolic ends; a missing end is unbounded
    SymbolicRange {
        min: Option<SizeExpr>,
        max: Option<SizeExpr>,
    },
}

impl DimSpec {
    pub fn fixed(n: usize) -> Self {
        DimSpec::Fixed(n)
    }

    pub fn range(lo: f64, hi: f64) -> Self {
        DimSpec::NumericRange(Interval::new(lo, hi))
    }

    /// d == name
    pub fn symbol(name: impl Into<Box<str>>) -> Self {
        DimSpec::SymbolicEqual(SizeExpr::var(name))
    }

    pub fn expr(e: SizeExpr) -> Self {
        DimSpec::SymbolicEqual(e)
    }

    /// min <= d
    pub fn range_from(min: SizeExpr) -> Self {
        DimSpec::SymbolicRange { min: Some(min), max: None }
    }

    /// d < max
    pub fn range_to(max: SizeExpr) -> Self {
        DimSpec::SymbolicRange { min: None, max: Some(max) }
    }

    pub fn symbolic_range(min: SizeExpr, max: SizeExpr) -> Self {
        DimSpec::SymbolicRange { min: Some(min), max: Some(max) }
    }

    /// Symbols mentioned by this axis
    pub fn symbols(&self) -> BTreeSet<String> {
        match self {
            DimSpec::SymbolicEqual(e) => e.symbols(),
            DimSpec::SymbolicRange { min, max } => {
                let mut out = BTreeSet::new();
                for e in min.iter().chain(max.iter()) {
                    out.extend(e.symbols());
                }
                out
            }
            _ => BTreeSet::new(),
        }
    }
}

/// Declared shape of a tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeSpec {
    /// Any rank, no per-axis constraints
    AnyRank,

    /// Exactly these axes
    Dims(Vec<DimSpec>),
}

impl ShapeSpec {
    pub fn new(dims: Vec<DimSpec>) -> Self {
        ShapeSpec::Dims(dims)
    }

    pub fn any_rank() -> Self {
        ShapeSpec::AnyRank
    }

    pub fn is_any_rank(&self) -> bool {
        matches!(self, ShapeSpec::AnyRank)
    }

    /// Required rank, or `None` for the rank wildcard
    pub fn rank(&self) -> Option<usize> {
        match self {
            ShapeSpec::AnyRank => None,
            ShapeSpec::Dims(dims) => Some(dims.len()),
        }
    }

    pub fn dims(&self) -> &[DimSpec] {
        match self {
            ShapeSpec::AnyRank => &[],
            ShapeSpec::Dims(dims) => dims,
        }
    }

    /// Symbols mentioned anywhere in the spec
    pub fn symbols(&self) -> BTreeSet<String> {
        self.dims().iter().flat_map(|d| d.symbols()).collect()
    }
}

impl FromIterator<DimSpec> for ShapeSpec {
    fn from_iter<I: IntoIterator<Item = DimSpec>>(iter: I) -> Self {
        ShapeSpec::Dims(iter.into_iter().collect())
    }
}

impl std::fmt::Display for DimSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimSpec::Wildcard => write!(f, "_"),
            DimSpec::Fixed(n) => write!(f, "{}", n),
            DimSpec::NumericRange(i) => {
                if i.lo.is_finite() {
                    write!(f, "{}", i.lo)?;
                }
                write!(f, ":")?;
                if i.hi.is_finite() {
                    write!(f, "{}", i.hi)?;
                }
                Ok(())
            }
            DimSpec::SymbolicEqual(e) => write!(f, "{}", e),
            DimSpec::SymbolicRange { min, max } => {
                if let Some(min) = min {
                    write!(f, "{}", min)?;
                }
                write!(f, ":")?;
                if let Some(max) = max {
                    write!(f, "{}", max)?;
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for ShapeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeSpec::AnyRank => write!(f, "[*]"),
            ShapeSpec::Dims(dims) => {
                let parts: Vec<_> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank() {
        let spec = ShapeSpec::new(vec![DimSpec::fixed(4), DimSpec::symbol("b")]);
        assert_eq!(spec.rank(), Some(2));
        assert_eq!(ShapeSpec::any_rank().rank(), None);
        assert!(ShapeSpec::any_rank().dims().is_empty());
    }

    #[test]
    fn test_display() {
        let x = || SizeExpr::var("X");
        let spec: ShapeSpec = vec![
            DimSpec::Wildcard,
            DimSpec::range(2.0, 8.0),
            DimSpec::range_from(x()),
            DimSpec::expr(x() + SizeExpr::int(2)),
            DimSpec::symbolic_range(x(), SizeExpr::var("Y")),
        ]
        .into_iter()
        .collect();
        assert_eq!(spec.to_string(), "[_, 2:8, X:, X + 2, X:Y]");
    }

    #[test]
    fn test_open_numeric_range_display() {
        assert_eq!(DimSpec::NumericRange(Interval::below(8.0)).to_string(), ":8");
    }

    #[test]
    fn test_symbols() {
        let spec = ShapeSpec::new(vec![
            DimSpec::symbolic_range(SizeExpr::var("X"), SizeExpr::var("Y")),
            DimSpec::expr(SizeExpr::int(2) * SizeExpr::var("W")),
        ]);
        let syms: Vec<_> = spec.symbols().into_iter().collect();
        assert_eq!(syms, vec!["W", "X", "Y"]);
    }
}
