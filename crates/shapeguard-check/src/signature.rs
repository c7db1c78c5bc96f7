//! Call-level checking
//!
//! A [`Signature`] lists a function's parameters by name, each with a shape
//! spec, a value range or both, plus an optional spec for the return value.
//! The caller hands the argument values over explicitly; nothing is
//! intercepted. All parameters of one call share a session, so a symbol bound
//! by the first argument constrains the second and the return value.
//!
//! ```rust
//! use shapeguard_check::prelude::*;
//! use shapeguard_parse::dsl::parse_shape_spec;
//!
//! let sig = Signature::new()
//!     .shape("lhs", parse_shape_spec("[M, K]").unwrap())
//!     .shape("rhs", parse_shape_spec("[K, N]").unwrap())
//!     .returns(ParamSpec::Shape(parse_shape_spec("[M, N]").unwrap()));
//!
//! let (a, b) = (HostTensor::zeros([2, 3]), HostTensor::zeros([3, 4]));
//! let out = sig.call(&[Arg::tensor(&a), Arg::tensor(&b)], || HostTensor::zeros([2, 4]));
//! assert!(out.is_ok());
//! ```

use crate::error::{ArgError, CallError, CallResult, ParamError};
use crate::range::ValueRangeValidator;
use crate::session::Session;
use crate::store::StoreConfig;
use crate::tensor::{HostTensor, ShapeHandle, TensorExtrema, TensorLike};
use serde::{Deserialize, Serialize};
use shapeguard_ast::dim::ShapeSpec;
use shapeguard_ast::interval::Interval;
use tracing::debug;

/// Parameter name used for errors on the return value
pub const RETURN: &str = "return";

// ============================================================================
// Parameter specs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamSpec {
    /// Tensor with a constrained shape
    Shape(ShapeSpec),
    /// Tensor whose elements lie in the interval
    Values(Interval),
    ShapeAndValues { shape: ShapeSpec, values: Interval },
    /// Plain number in the interval
    Scalar(Interval),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub spec: ParamSpec,
}

/// What to do after the first failing parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Policy {
    #[default]
    FailFast,
    /// Check every parameter and report all failures
    Aggregate,
}

// ============================================================================
// Arguments
// ============================================================================

/// One argument value as seen by the checker
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Tensor(&'a dyn TensorExtrema),
    Shape(&'a dyn TensorLike),
    Scalar(f64),
}

impl<'a> Arg<'a> {
    pub fn tensor<T: TensorExtrema>(t: &'a T) -> Self {
        Arg::Tensor(t)
    }

    pub fn shape<T: TensorLike>(t: &'a T) -> Self {
        Arg::Shape(t)
    }

    pub fn scalar(v: f64) -> Self {
        Arg::Scalar(v)
    }

    fn dims(&self) -> Option<&'a [usize]> {
        match *self {
            Arg::Tensor(t) => Some(t.shape()),
            Arg::Shape(t) => Some(t.shape()),
            Arg::Scalar(_) => None,
        }
    }
}

impl std::fmt::Debug for dyn TensorExtrema + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tensor{:?}", self.shape())
    }
}

impl std::fmt::Debug for dyn TensorLike + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shape{:?}", self.shape())
    }
}

/// Values that can be checked as a return value
pub trait AsArg {
    fn as_arg(&self) -> Arg<'_>;
}

impl AsArg for f64 {
    fn as_arg(&self) -> Arg<'_> {
        Arg::Scalar(*self)
    }
}

impl AsArg for HostTensor {
    fn as_arg(&self) -> Arg<'_> {
        Arg::Tensor(self)
    }
}

impl AsArg for ShapeHandle {
    fn as_arg(&self) -> Arg<'_> {
        Arg::Shape(self)
    }
}

#[cfg(feature = "ndarray")]
impl<S, D> AsArg for ndarray::ArrayBase<S, D>
where
    S: ndarray::Data,
    S::Elem: Copy + Into<f64>,
    D: ndarray::Dimension,
{
    fn as_arg(&self) -> Arg<'_> {
        Arg::Tensor(self)
    }
}

// ============================================================================
// Signature
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ParamSpec>,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub config: StoreConfig,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.params.push(Param { name: name.into(), spec });
        self
    }

    pub fn shape(self, name: impl Into<String>, spec: ShapeSpec) -> Self {
        self.param(name, ParamSpec::Shape(spec))
    }

    pub fn values(self, name: impl Into<String>, interval: Interval) -> Self {
        self.param(name, ParamSpec::Values(interval))
    }

    pub fn returns(mut self, spec: ParamSpec) -> Self {
        self.returns = Some(spec);
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Check `args` in a fresh session
    pub fn check_args(&self, args: &[Arg<'_>]) -> CallResult<()> {
        let mut session = Session::with_config(self.config);
        self.check_args_in(args, &mut session)
    }

    /// Check `args` in `session`, keeping its bindings
    pub fn check_args_in(&self, args: &[Arg<'_>], session: &mut Session) -> CallResult<()> {
        if args.len() != self.params.len() {
            return Err(CallError::Arity {
                expected: self.params.len(),
                found: args.len(),
            });
        }

        let mut failures = Vec::new();
        for (param, arg) in self.params.iter().zip(args) {
            debug!("checking parameter {}", param.name);
            if let Err(error) = check_param(&param.spec, arg, session) {
                let failure = ParamError { param: param.name.clone(), error };
                match self.policy {
                    Policy::FailFast => return Err(CallError::Param(failure)),
                    Policy::Aggregate => failures.push(failure),
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CallError::Violations(failures))
        }
    }

    /// Check the arguments, run `f`, then check what it returned.
    ///
    /// The return spec sees the bindings made by the arguments.
    pub fn call<R: AsArg>(&self, args: &[Arg<'_>], f: impl FnOnce() -> R) -> CallResult<R> {
        let mut session = Session::with_config(self.config);
        self.check_args_in(args, &mut session)?;

        let out = f();
        if let Some(spec) = &self.returns {
            check_param(spec, &out.as_arg(), &mut session).map_err(|error| {
                CallError::Param(ParamError { param: RETURN.to_string(), error })
            })?;
        }
        Ok(out)
    }
}

fn check_param(spec: &ParamSpec, arg: &Arg<'_>, session: &mut Session) -> Result<(), ArgError> {
    match spec {
        ParamSpec::Shape(shape) => {
            let dims = arg.dims().ok_or(ArgError::NotATensor)?;
            session.check_shape(shape, dims)?;
        }
        ParamSpec::Values(interval) => match *arg {
            Arg::Tensor(t) => {
                ValueRangeValidator::validate_interval(interval, t)?;
            }
            Arg::Shape(_) => return Err(ArgError::NoValues),
            Arg::Scalar(v) => {
                ValueRangeValidator::validate_scalar(interval.lo(), interval.hi(), v)?;
            }
        },
        ParamSpec::ShapeAndValues { shape, values } => {
            let dims = arg.dims().ok_or(ArgError::NotATensor)?;
            session.check_shape(shape, dims)?;
            match *arg {
                Arg::Tensor(t) => {
                    ValueRangeValidator::validate_interval(values, t)?;
                }
                _ => return Err(ArgError::NoValues),
            }
        }
        ParamSpec::Scalar(interval) => match *arg {
            Arg::Scalar(v) => {
                ValueRangeValidator::validate_scalar(interval.lo(), interval.hi(), v)?;
            }
            _ => return Err(ArgError::NotAScalar),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RangeError, ShapeError};
    use shapeguard_ast::ser;
    use shapeguard_parse::dsl::parse_shape_spec;

    fn spec(text: &str) -> ShapeSpec {
        parse_shape_spec(text).unwrap()
    }

    fn matmul() -> Signature {
        Signature::new()
            .shape("lhs", spec("[:8, b]"))
            .shape("rhs", spec("[b, :8]"))
    }

    #[test]
    fn test_cross_argument_symbol() {
        let (a, b) = (ShapeHandle::new([4, 3]), ShapeHandle::new([3, 5]));
        assert!(matmul().check_args(&[Arg::shape(&a), Arg::shape(&b)]).is_ok());

        let c = ShapeHandle::new([2, 5]);
        let err = matmul().check_args(&[Arg::shape(&a), Arg::shape(&c)]).unwrap_err();
        assert!(matches!(
            err,
            CallError::Param(ParamError { ref param, error: ArgError::Shape(ShapeError::DimensionSize { index: 0, .. }) })
                if param == "rhs"
        ));
    }

    #[test]
    fn test_arity() {
        let a = ShapeHandle::new([4, 3]);
        assert_eq!(
            matmul().check_args(&[Arg::shape(&a)]),
            Err(CallError::Arity { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_aggregate_collects_every_parameter() {
        let sig = Signature::new()
            .shape("x", spec("[3]"))
            .values("y", Interval::new(0.0, 1.0))
            .shape("z", spec("[2]"))
            .policy(Policy::Aggregate);
        let x = ShapeHandle::new([4]);
        let y = HostTensor::from_shape_vec([2], vec![0.5, 1.5]).unwrap();
        let z = ShapeHandle::new([2]);
        let err = sig.check_args(&[Arg::shape(&x), Arg::tensor(&y), Arg::shape(&z)]).unwrap_err();
        let params: Vec<_> = err.param_errors().iter().map(|e| e.param.as_str()).collect();
        assert_eq!(params, ["x", "y"]);
    }

    #[test]
    fn test_fail_fast_stops_at_first() {
        let sig = Signature::new().shape("x", spec("[3]")).shape("y", spec("[3]"));
        let (x, y) = (ShapeHandle::new([4]), ShapeHandle::new([5]));
        let err = sig.check_args(&[Arg::shape(&x), Arg::shape(&y)]).unwrap_err();
        assert_eq!(err.param_errors().len(), 1);
        assert_eq!(err.param_errors()[0].param, "x");
    }

    #[test]
    fn test_values_need_data() {
        let sig = Signature::new().values("x", Interval::new(0.0, 9.0));
        let h = ShapeHandle::new([2]);
        assert!(matches!(
            sig.check_args(&[Arg::shape(&h)]),
            Err(CallError::Param(ParamError { error: ArgError::NoValues, .. }))
        ));
    }

    #[test]
    fn test_scalar_param() {
        let sig = Signature::new().param("alpha", ParamSpec::Scalar(Interval::new(0.0, 1.0)));
        assert!(sig.check_args(&[Arg::scalar(0.25)]).is_ok());
        assert!(matches!(
            sig.check_args(&[Arg::scalar(1.0)]),
            Err(CallError::Param(ParamError { error: ArgError::Range(RangeError::OutOfInterval { .. }), .. }))
        ));
        let t = HostTensor::scalar(0.5);
        assert!(matches!(
            sig.check_args(&[Arg::tensor(&t)]),
            Err(CallError::Param(ParamError { error: ArgError::NotAScalar, .. }))
        ));
    }

    #[test]
    fn test_return_sees_argument_bindings() {
        let sig = Signature::new()
            .shape("x", spec("[N, 3]"))
            .returns(ParamSpec::Shape(spec("[N]")));
        let x = HostTensor::zeros([5, 3]);

        assert!(sig.call(&[Arg::tensor(&x)], || HostTensor::zeros([5])).is_ok());

        let err = sig.call(&[Arg::tensor(&x)], || HostTensor::zeros([4])).unwrap_err();
        assert!(matches!(err, CallError::Param(ParamError { ref param, .. }) if param == RETURN));
    }

    #[test]
    fn test_argument_failure_skips_body() {
        let sig = Signature::new().shape("x", spec("[2]"));
        let x = HostTensor::zeros([3]);
        let mut ran = false;
        let _ = sig.call(&[Arg::tensor(&x)], || {
            ran = true;
            0.0
        });
        assert!(!ran);
    }

    #[test]
    fn test_json_round_trip() {
        let sig = matmul()
            .param("scale", ParamSpec::Scalar(Interval::at_least(0.0)))
            .returns(ParamSpec::ShapeAndValues { shape: spec("[:8, :8]"), values: Interval::all() })
            .policy(Policy::Aggregate);
        let json = ser::to_json(&sig).unwrap();
        let back: Signature = ser::from_json(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{ "params": [ { "name": "x", "spec": { "Shape": "AnyRank" } } ] }"#;
        let sig: Signature = ser::from_json(json).unwrap();
        assert_eq!(sig.policy, Policy::FailFast);
        assert_eq!(sig.config, StoreConfig::default());
        assert!(sig.returns.is_none());
    }
}
