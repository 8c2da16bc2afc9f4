//! Hyexpr: typed expression trees for composable units of logic.
//!
//! This crate provides the tree model and the generic machinery that unit-level rewriting is
//! built on:
//!  - [`expr`]: nodes (literals, parameters, member reads, calls, operators, lambdas,
//!    invocations, conditionals), static typing, pretty-printing and compilation to [`Func`].
//!  - [`visitor`]: the [`Rewriter`](visitor::Rewriter) trait with default structural recursion
//!    and read-only traversal helpers.
//!  - [`rewrite`]: the partial evaluator, substitution passes, composite pipelines and the
//!    lambda algebra (`and`, `or`, `not`, `apply_to`, `project_to`).
//!
//! Semantics
//!  - Parameters compare by identity. Substituting one parameter never touches another that
//!    happens to share its name.
//!  - Folding is conservative: only literals and member chains rooted in a literal or a static
//!    member have a rewrite-time value.
//!
//! Example
//! ```
//! use hyexpr::prelude::*;
//!
//! let len = DeclaringType::of(Ty::Str).property("length", Ty::Int, |v| {
//!     Ok(Value::Int(v.as_str().map(|s| s.len() as i64).unwrap_or(0)))
//! });
//! let f = LambdaExpr::with_param("x", Ty::Str, |x| x.member(&len) + Expr::constant(1i64));
//! assert_eq!(f.to_string(), "x => x.length + 1");
//! assert_eq!(compile(&f).call1(Value::str("ab")).unwrap(), Value::Int(3));
//! ```

/// Argument and invariant checks.
pub mod defensive;
/// Error type shared by every fallible operation.
pub mod error;
/// Expression nodes, printing and compilation.
pub mod expr;
/// Member and method descriptors.
pub mod member;
/// Lambda parameters and formal parameters.
pub mod param;
/// Partial evaluation, substitution and composition passes.
pub mod rewrite;
/// Static types and unit kinds.
pub mod ty;
/// Runtime values and host objects.
pub mod value;
/// Rewriting visitors and traversal.
pub mod visitor;

pub use value::Func;

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - Tree model: `Expr` and node structs, operators, `LambdaExpr`
    //! - Values, types, members and parameters
    //! - Printing (`PrettyExpr`), compilation (`compile`)
    //! - Traversal and comparison helpers
    pub use crate::error::{Error, Result};
    pub use crate::expr::{
        BinaryExpr, BinaryOp, CallExpr, ConditionalExpr, Expr, ExprType, InvokeExpr, LambdaExpr,
        Literal, MemberExpr, UnaryExpr, UnaryOp, compile::compile, pretty::PrettyExpr,
    };
    pub use crate::member::{DeclaringType, Member, MemberKind, Method};
    pub use crate::param::{FormalParam, Param};
    pub use crate::ty::{Ty, UnitKind};
    pub use crate::value::{Func, Object, ObjectRef, Record, Value};
    pub use crate::visitor::{
        Rewriter, WalkControl, any_node, compare_expressions, count_param, free_params, walk,
    };
}
