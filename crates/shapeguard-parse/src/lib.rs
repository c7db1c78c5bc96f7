//! # shapeguard parse
//!
//! Text front end for shapeguard: size expressions and shape specs.
//!
//! ## Example
//!
//! ```rust
//! use shapeguard_parse::prelude::*;
//!
//! let expr = parse_expr("X + 2").unwrap();
//! assert_eq!(expr.to_string(), "X + 2");
//!
//! let spec = parse_shape_spec("[*, X, Y - 1]").unwrap();
//! assert_eq!(spec.rank(), Some(3));
//! ```

pub mod lexer;
pub mod parser;
pub mod dsl;

pub mod prelude {
    pub use crate::lexer::{Token, Lexer, Loc, Spanned};
    pub use crate::parser::{Parser, ParseError, ParseResult, parse_expr};
    pub use crate::dsl::{
        build_dimension_spec, parse_shape_spec, parse_concrete_shape, SpecToken, DslError, DslResult,
    };
    pub use crate::spec;
}
