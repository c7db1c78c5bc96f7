//! Value range validation
//!
//! Checks element values, not shapes, so it never touches the constraint
//! store. Ranges are half-open: `min <= x < max`.

use crate::error::{RangeError, RangeResult};
use crate::tensor::TensorExtrema;
use shapeguard_ast::interval::Interval;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueRangeValidator;

impl ValueRangeValidator {
    /// Every element of `value` must lie in `[min, max)`. An empty tensor passes.
    pub fn validate_range<'v, T>(min: f64, max: f64, value: &'v T) -> RangeResult<&'v T>
    where
        T: TensorExtrema + ?Sized,
    {
        if let Some(actual_min) = value.min_value() {
            if actual_min < min {
                return Err(RangeError::BelowMinimum { min, actual_min });
            }
        }
        if let Some(actual_max) = value.max_value() {
            if actual_max >= max {
                return Err(RangeError::AboveMaximum { max, actual_max });
            }
        }
        Ok(value)
    }

    pub fn validate_interval<'v, T>(interval: &Interval, value: &'v T) -> RangeResult<&'v T>
    where
        T: TensorExtrema + ?Sized,
    {
        Self::validate_range(interval.lo(), interval.hi(), value)
    }

    /// Scalar form of [`validate_range`](Self::validate_range)
    pub fn validate_scalar(min: f64, max: f64, value: f64) -> RangeResult<f64> {
        if min <= value && value < max {
            Ok(value)
        } else {
            Err(RangeError::OutOfInterval { min, max, value })
        }
    }
}
