//! Hyproj: composable projections and specifications.
//!
//! A unit is a pure mapping defined once and usable two ways: as a compiled function, and as an
//! expression tree that can be spliced into a larger tree. Units nest, combine and take
//! parameters; the tree form of any such construction is a single inlined lambda with no
//! reference left to the wrappers themselves.
//!
//!  - [`Projection`]: `source -> result`, chainable with `apply_to` and `to`.
//!  - [`Specification`]: `source -> bool`, closed under `and`, `or` and `not`.
//!  - [`factory`]: one- and two-parameter factories producing either kind, with value and
//!    deferred binding and partial application.
//!  - [`rewrite`]: the unit-aware passes and the [`UnitRewriter`](rewrite::UnitRewriter)
//!    pipeline every unit runs its tree through.
//!
//! Trees reference units through literals and the descriptors of [`Unit`]; trees built that way
//! still compile and run unchanged, while their rewritten form inlines every reference.
//!
//! Example
//! ```
//! use hyexpr::prelude::*;
//! use hyproj::prelude::*;
//!
//! let len = DeclaringType::of(Ty::Str).property("length", Ty::Int, |v| {
//!     Ok(Value::Int(v.as_str().map(|s| s.len() as i64).unwrap_or(0)))
//! });
//! let is_a = Specification::new(LambdaExpr::with_param("x", Ty::Str, |x| {
//!     x.equals(Expr::constant("A"))
//! }))
//! .unwrap();
//! let is_short = Specification::new(LambdaExpr::with_param("x", Ty::Str, |x| {
//!     x.member(&len).equals(Expr::constant(1i64))
//! }))
//! .unwrap();
//!
//! let both = is_a.and(&is_short).unwrap();
//! assert!(both.is_satisfied_by(Value::str("A")).unwrap());
//! assert_eq!(
//!     both.expression().unwrap().to_string(),
//!     r#"x => (x == "A") && (x.length == 1)"#
//! );
//! ```

/// Reconstruction of trees from compiled functions.
pub mod decompiler;
/// Parameterized unit factories.
pub mod factory;
pub mod projection;
/// Unit-aware rewriting passes and pipeline.
pub mod rewrite;
pub mod specification;
/// Shared unit machinery.
pub mod unit;
pub mod utils;

pub use projection::Projection;
pub use specification::Specification;
pub use unit::Unit;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::decompiler::{Decompiler, DecompilerRef};
    pub use crate::factory::{
        Argument, Bind, Captured, Deferred, Factory, Factory2, ProjectionFactory,
        ProjectionFactory2, SpecificationFactory, SpecificationFactory2,
    };
    pub use crate::projection::Projection;
    pub use crate::rewrite::{RewriteOptions, UnitRewriter, references_units};
    pub use crate::specification::Specification;
    pub use crate::unit::{Compiled, Unit};
    pub use crate::utils::Lazy;
}
