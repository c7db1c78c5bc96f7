//! # shapeguard AST
//!
//! Data model for declared tensor shapes.
//!
//! - [`expr::SizeExpr`] - arithmetic over dimension symbols (`X + 2`, `2 * W`)
//! - [`dim::DimSpec`] - constraint on one axis
//! - [`dim::ShapeSpec`] - ordered axis constraints, or the rank wildcard
//! - [`interval::Interval`] - half-open numeric ranges
//!
//! ## Example
//!
//! ```rust
//! use shapeguard_ast::prelude::*;
//!
//! // [*, X, Y - 1]
//! let spec = ShapeSpec::new(vec![
//!     DimSpec::Wildcard,
//!     DimSpec::symbol("X"),
//!     DimSpec::expr(SizeExpr::var("Y") - SizeExpr::int(1)),
//! ]);
//! assert_eq!(spec.rank(), Some(3));
//! assert_eq!(spec.to_string(), "[_, X, Y - 1]");
//! ```

pub mod op;
pub mod expr;
pub mod interval;
pub mod dim;
pub mod ser;

/// Prelude - common imports
pub mod prelude {
    pub use crate::op::{BinOp, UnaryOp};
    pub use crate::expr::SizeExpr;
    pub use crate::interval::{Bound, Interval};
    pub use crate::dim::{DimSpec, ShapeSpec};
    pub use crate::ser;
}
