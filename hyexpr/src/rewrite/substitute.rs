//! Parameter substitution.
use crate::{
    error::Result,
    expr::{Expr, LambdaExpr},
    param::Param,
    visitor::{Rewriter, walk_lambda},
};

/// Replaces every occurrence of one parameter with a replacement subtree.
///
/// Occurrences are matched by parameter identity, never by name. The replacement is inserted as
/// is; it is not visited again. When the replacement is itself a parameter, lambdas declaring the
/// target declare the replacement instead.
#[derive(Debug, Clone)]
pub struct ReplaceParam {
    target: Param,
    replacement: Expr,
}

impl ReplaceParam {
    pub fn new(target: &Param, replacement: Expr) -> Self {
        Self {
            target: target.clone(),
            replacement,
        }
    }
}

impl Rewriter for ReplaceParam {
    fn rewrite_param(&self, param: &Param) -> Result<Expr> {
        if *param == self.target {
            Ok(self.replacement.clone())
        } else {
            Ok(Expr::Param(param.clone()))
        }
    }

    fn rewrite_lambda_node(&self, node: &LambdaExpr) -> Result<Expr> {
        let rewritten = walk_lambda(self, node)?;
        match (rewritten, &self.replacement) {
            (Expr::Lambda(mut lambda), Expr::Param(renamed)) => {
                for p in lambda.params.iter_mut().filter(|p| **p == self.target) {
                    *p = renamed.clone();
                }
                Ok(Expr::Lambda(lambda))
            }
            (other, _) => Ok(other),
        }
    }
}

/// `body` with `param` replaced by `replacement`.
pub fn substitute(body: &Expr, param: &Param, replacement: Expr) -> Result<Expr> {
    ReplaceParam::new(param, replacement).rewrite(body)
}

/// Body of a single-parameter lambda applied to `argument`.
pub fn apply_lambda(lambda: &LambdaExpr, argument: Expr) -> Result<Expr> {
    let param = lambda.single_param()?;
    substitute(&lambda.body, param, argument)
}
