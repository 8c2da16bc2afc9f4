//! Argument and invariant checks shared by constructors and passes.
use crate::{
    error::{Error, Result},
    expr::{Expr, LambdaExpr},
};

/// Require a lambda with exactly one parameter.
pub fn single_param_lambda(lambda: LambdaExpr, argument: &'static str) -> Result<LambdaExpr> {
    if lambda.arity() != 1 {
        return Err(Error::InvalidArgument {
            argument,
            reason: format!(
                "expected a single-parameter lambda, got `{lambda}` with {} parameter(s)",
                lambda.arity()
            ),
        });
    }
    Ok(lambda)
}

/// Invariant violation on a node of unexpected shape.
#[inline]
pub fn unexpected(expr: &Expr, expected: &'static str) -> Error {
    Error::UnsupportedShape {
        expr: expr.to_string(),
        expected,
    }
}
