//! Captured-argument binding.
use crate::{
    error::Result,
    expr::{Expr, MemberExpr},
    param::FormalParam,
    visitor::{Rewriter, walk_member},
};

/// Replaces closure reads of a captured formal parameter with a replacement subtree.
///
/// A read matches when the member has the formal parameter's name and type, its target is a
/// literal, and its declaring type is a synthesized closure container. Same-named fields of
/// ordinary types are left alone.
#[derive(Debug, Clone)]
pub struct ReplaceCapturedArgument {
    param: FormalParam,
    replacement: Expr,
}

impl ReplaceCapturedArgument {
    pub fn new(param: FormalParam, replacement: Expr) -> Self {
        Self { param, replacement }
    }

    fn matches(&self, node: &MemberExpr) -> bool {
        node.member.name() == &*self.param.name
            && *node.member.ty() == self.param.ty
            && matches!(node.target.as_deref(), Some(Expr::Literal(_)))
            && node.member.declaring().is_synthesized()
    }
}

impl Rewriter for ReplaceCapturedArgument {
    fn rewrite_member(&self, node: &MemberExpr) -> Result<Expr> {
        if self.matches(node) {
            return Ok(self.replacement.clone());
        }
        walk_member(self, node)
    }
}

/// Bind one captured argument.
pub fn bind_argument(expr: &Expr, param: &FormalParam, argument: Expr) -> Result<Expr> {
    ReplaceCapturedArgument::new(param.clone(), argument).rewrite(expr)
}

/// Bind two captured arguments, first then second.
pub fn bind_arguments(
    expr: &Expr,
    (param1, argument1): (&FormalParam, Expr),
    (param2, argument2): (&FormalParam, Expr),
) -> Result<Expr> {
    let first = bind_argument(expr, param1, argument1)?;
    bind_argument(&first, param2, argument2)
}
