//! Half-open numeric intervals
//!
//! Every range in shapeguard is `[lo, hi)`: the lower end is included, the
//! upper end is not. Infinite ends are explicit variants so that intervals
//! survive a JSON round trip.

use serde::{Deserialize, Serialize};

/// An endpoint of an interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    /// Negative infinity
    NegInf,

    /// Positive infinity
    PosInf,

    /// Concrete value
    Const(f64),
}

impl Bound {
    /// Build a bound from a float, mapping infinities to their variants
    pub fn from_f64(v: f64) -> Self {
        if v == f64::INFINITY {
            Bound::PosInf
        } else if v == f64::NEG_INFINITY {
            Bound::NegInf
        } else {
            Bound::Const(v)
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Bound::NegInf => f64::NEG_INFINITY,
            Bound::PosInf => f64::INFINITY,
            Bound::Const(v) => *v,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Bound::Const(_))
    }
}

/// Half-open interval [lo, hi)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: Bound,
    pub hi: Bound,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Interval {
            lo: Bound::from_f64(lo),
            hi: Bound::from_f64(hi),
        }
    }

    /// Missing ends become -∞ and +∞
    pub fn from_options(lo: Option<f64>, hi: Option<f64>) -> Self {
        Interval::new(lo.unwrap_or(f64::NEG_INFINITY), hi.unwrap_or(f64::INFINITY))
    }

    /// All reals [-∞, ∞)
    pub fn all() -> Self {
        Interval { lo: Bound::NegInf, hi: Bound::PosInf }
    }

    /// [lo, ∞)
    pub fn at_least(lo: f64) -> Self {
        Interval::new(lo, f64::INFINITY)
    }

    /// [-∞, hi)
    pub fn below(hi: f64) -> Self {
        Interval::new(f64::NEG_INFINITY, hi)
    }

    pub fn lo(&self) -> f64 {
        self.lo.value()
    }

    pub fn hi(&self) -> f64 {
        self.hi.value()
    }

    /// lo <= v < hi
    pub fn contains(&self, v: f64) -> bool {
        self.lo() <= v && v < self.hi()
    }

    /// True if no value satisfies the interval
    pub fn is_empty(&self) -> bool {
        self.hi() <= self.lo()
    }

    /// True if both ends are unbounded
    pub fn is_unbounded(&self) -> bool {
        matches!((self.lo, self.hi), (Bound::NegInf, Bound::PosInf))
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-inf"),
            Bound::PosInf => write!(f, "inf"),
            Bound::Const(v) => write!(f, "{}", v),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.lo, self.hi)
    }
}
