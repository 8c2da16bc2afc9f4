//! Lambda-level composition: the algebra units are built on.
//!
//! All helpers take single-parameter lambdas and produce a new lambda; inputs are never modified.
use crate::{
    error::Result,
    expr::{BinaryOp, Expr, LambdaExpr},
    rewrite::substitute::substitute,
};

fn combine(lhs: &LambdaExpr, rhs: &LambdaExpr, op: BinaryOp) -> Result<LambdaExpr> {
    let param = lhs.single_param()?;
    let rhs_param = rhs.single_param()?;
    let rhs_body = substitute(&rhs.body, rhs_param, Expr::param(param))?;
    Ok(LambdaExpr::new(
        [param.clone()],
        Expr::binary(op, (*lhs.body).clone(), rhs_body),
    ))
}

/// `x => lhs(x) && rhs(x)`, sharing the left-hand parameter.
pub fn and(lhs: &LambdaExpr, rhs: &LambdaExpr) -> Result<LambdaExpr> {
    combine(lhs, rhs, BinaryOp::AndAlso)
}

/// `x => lhs(x) || rhs(x)`, sharing the left-hand parameter.
pub fn or(lhs: &LambdaExpr, rhs: &LambdaExpr) -> Result<LambdaExpr> {
    combine(lhs, rhs, BinaryOp::OrElse)
}

/// `x => !predicate(x)`.
pub fn not(predicate: &LambdaExpr) -> Result<LambdaExpr> {
    let param = predicate.single_param()?;
    Ok(LambdaExpr::new(
        [param.clone()],
        !(*predicate.body).clone(),
    ))
}

/// Precompose: given `f: s => r` and `g: p => s`, build `p => f(g(p))`.
pub fn apply_to(f: &LambdaExpr, g: &LambdaExpr) -> Result<LambdaExpr> {
    let f_param = f.single_param()?;
    let g_param = g.single_param()?;
    let body = substitute(&f.body, f_param, (*g.body).clone())?;
    Ok(LambdaExpr::new([g_param.clone()], body))
}

/// Postcompose: given `f: s => r` and `g: r => d`, build `s => g(f(s))`.
pub fn project_to(f: &LambdaExpr, g: &LambdaExpr) -> Result<LambdaExpr> {
    let f_param = f.single_param()?;
    let g_param = g.single_param()?;
    let body = substitute(&g.body, g_param, (*f.body).clone())?;
    Ok(LambdaExpr::new([f_param.clone()], body))
}
