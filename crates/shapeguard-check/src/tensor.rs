//! Tensor-like capabilities
//!
//! The validators never look inside a value beyond these two traits: a shape
//! for dimension checks and, for value ranges, the smallest and largest
//! element.

use crate::error::TensorError;

/// Anything with a shape
pub trait TensorLike {
    fn shape(&self) -> &[usize];

    fn ndim(&self) -> usize {
        self.shape().len()
    }
}

/// A tensor whose elements can be inspected.
///
/// Both extrema are `None` for an empty tensor.
pub trait TensorExtrema: TensorLike {
    fn min_value(&self) -> Option<f64>;
    fn max_value(&self) -> Option<f64>;
}

// ============================================================
// Shape-only handle
// ============================================================

/// A bare shape, for checks that never need element values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub Vec<usize>);

impl ShapeHandle {
    pub fn new(shape: impl Into<Vec<usize>>) -> Self {
        ShapeHandle(shape.into())
    }
}

impl From<Vec<usize>> for ShapeHandle {
    fn from(shape: Vec<usize>) -> Self {
        ShapeHandle(shape)
    }
}

impl TensorLike for ShapeHandle {
    fn shape(&self) -> &[usize] {
        &self.0
    }
}

// ============================================================
// Host tensor
// ============================================================

/// Owned row-major tensor of f64
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl HostTensor {
    pub fn from_shape_vec(shape: impl Into<Vec<usize>>, data: Vec<f64>) -> Result<Self, TensorError> {
        let shape = shape.into();
        let expected = element_count(&shape)?;
        if expected != data.len() {
            return Err(TensorError::DataLength { shape, expected, found: data.len() });
        }
        Ok(HostTensor { shape, data })
    }

    pub fn try_filled(shape: impl Into<Vec<usize>>, value: f64) -> Result<Self, TensorError> {
        let shape = shape.into();
        let len = element_count(&shape)?;
        Ok(HostTensor { shape, data: vec![value; len] })
    }

    /// # Panics
    ///
    /// If the element count overflows `usize`. Use [`HostTensor::try_filled`]
    /// for shapes that are not known to fit.
    pub fn filled(shape: impl Into<Vec<usize>>, value: f64) -> Self {
        match HostTensor::try_filled(shape, value) {
            Ok(t) => t,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        HostTensor::filled(shape, 0.0)
    }

    /// Rank-0 tensor
    pub fn scalar(value: f64) -> Self {
        HostTensor { shape: Vec::new(), data: vec![value] }
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn element_count(shape: &[usize]) -> Result<usize, TensorError> {
    shape
        .iter()
        .try_fold(1usize, |n, &d| n.checked_mul(d))
        .ok_or_else(|| TensorError::TooLarge { shape: shape.to_vec() })
}

impl TensorLike for HostTensor {
    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl TensorExtrema for HostTensor {
    fn min_value(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    fn max_value(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }
}

// ============================================================
// ndarray
// ============================================================

#[cfg(feature = "ndarray")]
mod ndarray_impls {
    use super::{TensorExtrema, TensorLike};
    use ndarray::{ArrayBase, Data, Dimension};

    impl<S, D> TensorLike for ArrayBase<S, D>
    where
        S: Data,
        D: Dimension,
    {
        fn shape(&self) -> &[usize] {
            ArrayBase::shape(self)
        }
    }

    impl<S, D> TensorExtrema for ArrayBase<S, D>
    where
        S: Data,
        S::Elem: Copy + Into<f64>,
        D: Dimension,
    {
        fn min_value(&self) -> Option<f64> {
            self.iter().map(|&x| x.into()).reduce(f64::min)
        }

        fn max_value(&self) -> Option<f64> {
            self.iter().map(|&x| x.into()).reduce(f64::max)
        }
    }

}
