//! Validation sessions
//!
//! A session is one checked call: it owns a [`ConstraintStore`] and clears it
//! when dropped, so bindings never leak into the next call whatever path the
//! current one leaves by.

use crate::error::{RangeResult, ShapeResult};
use crate::range::ValueRangeValidator;
use crate::shapes::{check_shape, ShapeValidator};
use crate::store::{ConstraintStore, StoreConfig};
use crate::tensor::{TensorExtrema, TensorLike};
use shapeguard_ast::dim::ShapeSpec;
use std::ops::{Deref, DerefMut};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Session {
    store: ConstraintStore,
}

impl Session {
    pub fn new() -> Self {
        Session::from_store(ConstraintStore::new())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Session::from_store(ConstraintStore::with_config(config))
    }

    /// Take over `store`; whatever it holds is cleared on drop
    pub fn from_store(store: ConstraintStore) -> Self {
        debug!("session opened");
        Session { store }
    }

    /// Drop the bindings and keep the session
    pub fn reset(&mut self) {
        self.store.clear();
    }

    pub fn validate<'v, T>(&mut self, spec: &ShapeSpec, value: &'v T) -> ShapeResult<&'v T>
    where
        T: TensorLike + ?Sized,
    {
        ShapeValidator::validate(spec, value, &mut self.store)
    }

    pub fn check_shape(&mut self, spec: &ShapeSpec, shape: &[usize]) -> ShapeResult<()> {
        check_shape(spec, shape, &mut self.store)
    }

    pub fn validate_range<'v, T>(&self, min: f64, max: f64, value: &'v T) -> RangeResult<&'v T>
    where
        T: TensorExtrema + ?Sized,
    {
        ValueRangeValidator::validate_range(min, max, value)
    }
}

impl Deref for Session {
    type Target = ConstraintStore;

    fn deref(&self) -> &ConstraintStore {
        &self.store
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut ConstraintStore {
        &mut self.store
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.store.clear();
        debug!("session closed");
    }
}

pub fn new_session() -> Session {
    Session::new()
}

/// Run `f` in a fresh session
pub fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> R {
    let mut session = Session::new();
    f(&mut session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::ShapeHandle;
    use shapeguard_parse::dsl::parse_shape_spec;

    #[test]
    fn test_bindings_accumulate_within_session() {
        let mut session = new_session();
        let a = parse_shape_spec("[2 * W, 2 * H]").unwrap();
        let b = parse_shape_spec("[H, W]").unwrap();
        session.validate(&a, &ShapeHandle::new([4, 6])).unwrap();
        session.validate(&b, &ShapeHandle::new([3, 2])).unwrap();
        assert_eq!(session.get("W"), Some(2.0));
        assert_eq!(session.get("H"), Some(3.0));
    }

    #[test]
    fn test_reset() {
        let mut session = new_session();
        session.check_shape(&parse_shape_spec("[X]").unwrap(), &[4]).unwrap();
        session.reset();
        assert!(session.is_empty());
    }

    #[test]
    fn test_with_session_returns_result() {
        let spec = parse_shape_spec("[X, X]").unwrap();
        let err = with_session(|s| s.check_shape(&spec, &[2, 3]));
        assert!(err.is_err());
        let ok = with_session(|s| s.check_shape(&spec, &[3, 3]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_early_return_still_closes_session() {
        fn checked(shape: &[usize]) -> ShapeResult<usize> {
            let mut session = new_session();
            session.check_shape(&parse_shape_spec("[N, N]").unwrap(), shape)?;
            Ok(session.len())
        }
        assert!(checked(&[1, 2]).is_err());
        assert_eq!(checked(&[2, 2]).unwrap(), 1);
    }
}
