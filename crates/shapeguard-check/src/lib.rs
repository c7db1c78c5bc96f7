//! shapeguard constraint engine
//!
//! Call-time checking of tensor shapes against symbolic specs.
//!
//! ## Example
//!
//! ```rust
//! use shapeguard_check::prelude::*;
//! use shapeguard_parse::dsl::parse_shape_spec;
//!
//! let first = parse_shape_spec("[*, X, Y - 1]").unwrap();
//! let second = parse_shape_spec("[X:, X + 2, X:Y]").unwrap();
//!
//! let mut session = new_session();
//! session.validate(&first, &ShapeHandle::new([1, 4, 6])).unwrap();
//! assert_eq!(session.get("X"), Some(4.0));
//! assert_eq!(session.get("Y"), Some(7.0));
//!
//! let err = session.validate(&second, &ShapeHandle::new([4, 7, 5])).unwrap_err();
//! assert_eq!(err.index(), Some(1));
//! ```

pub mod error;
pub mod eval;
pub mod affine;
pub mod store;
pub mod tensor;
pub mod shapes;
pub mod range;
pub mod session;
pub mod signature;

pub use error::{ShapeError, ShapeResult, ConstraintError, ConstraintResult};
pub use store::ConstraintStore;
pub use session::{new_session, with_session, Session};

pub mod prelude {
    pub use crate::error::{
        ArgError, CallError, CallResult, ConstraintError, ConstraintResult, ExprError, ExprResult,
        ParamError, RangeError, RangeResult, ShapeError, ShapeResult, TensorError,
    };
    pub use crate::eval::{evaluate, evaluate_identifier_or_literal, Bindings};
    pub use crate::affine::{AffineSolver, Solver};
    pub use crate::store::{ConstraintStore, EqKey, Resolved, StoreConfig};
    pub use crate::tensor::{HostTensor, ShapeHandle, TensorExtrema, TensorLike};
    pub use crate::shapes::{check_shape, ShapeValidator};
    pub use crate::range::ValueRangeValidator;
    pub use crate::session::{new_session, with_session, Session};
    pub use crate::signature::{Arg, AsArg, Param, ParamSpec, Policy, Signature};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use shapeguard_parse::spec;

    #[test]
    fn test_spec_macro_to_session() {
        let lhs = spec![..8, "b"].unwrap();
        let rhs = spec!["b", ..8].unwrap();
        let mut session = new_session();
        session.validate(&lhs, &ShapeHandle::new([4, 3])).unwrap();
        assert!(session.validate(&rhs, &ShapeHandle::new([3, 2])).is_ok());
        assert!(session.validate(&rhs, &ShapeHandle::new([2, 2])).is_err());
    }

    #[test]
    fn test_engine_types_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConstraintStore>();
        assert_send_sync::<Signature>();
    }
}
