//! Shape validation
//!
//! Walks a tensor's dimensions against a [`ShapeSpec`] and routes every
//! symbolic dimension through the constraint store. Bindings made for one
//! tensor are visible to the next one checked against the same store, which
//! is how `[2W, 2H]` on one argument constrains `[H, W]` on another.
//!
//! Checking is fail-fast: the first violated dimension is reported and the
//! remaining ones are not looked at.

use crate::error::{ConstraintError, ShapeError, ShapeResult};
use crate::store::ConstraintStore;
use crate::tensor::TensorLike;
use shapeguard_ast::dim::{DimSpec, ShapeSpec};
use tracing::trace;

// ============================================================================
// Validator
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeValidator;

impl ShapeValidator {
    /// Check `value` against `spec`, returning the same reference on success
    pub fn validate<'v, T>(spec: &ShapeSpec, value: &'v T, store: &mut ConstraintStore) -> ShapeResult<&'v T>
    where
        T: TensorLike + ?Sized,
    {
        check_shape(spec, value.shape(), store)?;
        Ok(value)
    }
}

/// Check a bare shape against `spec`
pub fn check_shape(spec: &ShapeSpec, shape: &[usize], store: &mut ConstraintStore) -> ShapeResult<()> {
    let dims = match spec {
        ShapeSpec::AnyRank => return Ok(()),
        ShapeSpec::Dims(dims) => dims,
    };

    if dims.len() != shape.len() {
        return Err(ShapeError::RankMismatch {
            expected: dims.len(),
            actual: shape.len(),
            shape: shape.to_vec(),
        });
    }

    for (index, (dim, &actual)) in dims.iter().zip(shape).enumerate() {
        trace!("dim {}: {} against {}", index, dim, actual);
        check_dim(index, dim, actual, store)?;
    }
    Ok(())
}

fn check_dim(index: usize, dim: &DimSpec, actual: usize, store: &mut ConstraintStore) -> ShapeResult<()> {
    match dim {
        DimSpec::Wildcard => Ok(()),

        DimSpec::Fixed(n) => {
            if *n == actual {
                Ok(())
            } else {
                Err(ShapeError::DimensionSize {
                    index,
                    expected: *n as f64,
                    actual,
                    symbol: None,
                })
            }
        }

        DimSpec::NumericRange(interval) => {
            if interval.contains(actual as f64) {
                Ok(())
            } else {
                Err(ShapeError::DimensionRange {
                    index,
                    min: interval.lo(),
                    max: interval.hi(),
                    actual,
                    symbol: None,
                })
            }
        }

        DimSpec::SymbolicEqual(expr) => store.bind_equal(expr, actual as f64).map_err(|e| match e {
            ConstraintError::AlreadyAssigned { symbol: None, assigned, .. } => ShapeError::DimensionSize {
                index,
                expected: assigned,
                actual,
                symbol: Some(expr.to_string()),
            },
            source => ShapeError::Constraint { index, source },
        }),

        DimSpec::SymbolicRange { min, max } => store
            .bind_range(min.as_ref(), max.as_ref(), actual as f64)
            .map_err(|e| match e {
                ConstraintError::RangeViolation { min, max, .. } => ShapeError::DimensionRange {
                    index,
                    min,
                    max,
                    actual,
                    symbol: Some(dim.to_string()),
                },
                source => ShapeError::Constraint { index, source },
            }),
    }
}
