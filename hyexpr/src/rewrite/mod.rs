//! Generic rewriting passes and the lambda algebra.
//!
//! - [`eval`]: partial evaluator (`try_evaluate`, `evaluate`, `evaluate_not_null`).
//! - [`substitute`]: parameter substitution by identity.
//! - [`captured`]: binding of closure-captured formal parameters.
//! - [`composite`]: ordered pipelines of rewriters.
//! - [`compose`]: `and`/`or`/`not` and precomposition/postcomposition of lambdas.
pub mod captured;
pub mod compose;
pub mod composite;
pub mod eval;
pub mod substitute;

pub use captured::{ReplaceCapturedArgument, bind_argument, bind_arguments};
pub use composite::{BoxedRewriter, CompositeRewriter};
pub use eval::{evaluate, evaluate_not_null, is_foldable, try_evaluate};
pub use substitute::{ReplaceParam, apply_lambda, substitute};
