//! Unit-aware rewriting.
//!
//! The default pipeline runs, in order: factory resolution, combinator resolution, then
//! inlining of specifications and of projections. Each pass works over the previous pass's
//! output, and each pass visits again whatever it splices in, so nested units are flattened in
//! a single run.
use std::fmt;

use hyexpr::{
    error::{Error, Result},
    expr::{Expr, LambdaExpr},
    rewrite::{BoxedRewriter, CompositeRewriter},
    visitor::{Rewriter, any_node},
};
use log::{debug, warn};

pub mod factory;
pub mod inline;
pub mod operators;

pub use factory::FactoryResolver;
pub use inline::{ProjectionInliner, SpecificationInliner, UnitInliner};
pub use operators::CombinatorResolver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Fail when the output still references a unit or factory type.
    pub verify: bool,
}

/// Pipeline turning unit references into plain trees.
pub struct UnitRewriter {
    pipeline: CompositeRewriter,
    options: RewriteOptions,
}

impl UnitRewriter {
    pub fn new() -> Self {
        Self::with_options(RewriteOptions::default())
    }

    pub fn with_options(options: RewriteOptions) -> Self {
        Self {
            pipeline: default_pipeline(),
            options,
        }
    }

    /// Custom pipeline, run in the given order.
    pub fn with_passes(passes: impl IntoIterator<Item = BoxedRewriter>) -> Self {
        Self {
            pipeline: CompositeRewriter::new(passes),
            options: RewriteOptions::default(),
        }
    }

    pub fn options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }
}

impl Default for UnitRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UnitRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitRewriter")
            .field("pipeline", &self.pipeline)
            .field("options", &self.options)
            .finish()
    }
}

fn default_pipeline() -> CompositeRewriter {
    CompositeRewriter::default()
        .then(FactoryResolver)
        .then(CombinatorResolver)
        .then(SpecificationInliner::new())
        .then(ProjectionInliner::new())
}

impl Rewriter for UnitRewriter {
    fn rewrite(&self, expr: &Expr) -> Result<Expr> {
        debug!("rewriting `{expr}`");
        let rewritten = self.pipeline.rewrite(expr)?;
        if self.options.verify && references_units(&rewritten) {
            warn!("unit reference left in `{rewritten}`");
            return Err(Error::ResidualUnitReference {
                expr: rewritten.to_string(),
            });
        }
        debug!("rewrote into `{rewritten}`");
        Ok(rewritten)
    }
}

/// Whether any node of `expr` still references a unit or factory type.
pub fn references_units(expr: &Expr) -> bool {
    any_node(expr, |node| match node {
        Expr::Literal(lit) => lit.ty.unit_kind().is_some(),
        Expr::Param(param) => param.ty().unit_kind().is_some(),
        Expr::Member(node) => {
            node.member.ty().unit_kind().is_some()
                || node.member.declaring().unit_kind().is_some()
        }
        Expr::Call(node) => {
            node.method.ret().unit_kind().is_some()
                || node.method.declaring().unit_kind().is_some()
        }
        Expr::Binary(node) => node
            .method
            .as_ref()
            .is_some_and(|m| m.declaring().unit_kind().is_some()),
        Expr::Unary(node) => node
            .method
            .as_ref()
            .is_some_and(|m| m.declaring().unit_kind().is_some()),
        _ => false,
    })
}

static DEFAULT: once_cell::sync::Lazy<UnitRewriter> = once_cell::sync::Lazy::new(UnitRewriter::new);

/// Run the default pipeline over an expression.
pub fn rewrite(expr: &Expr) -> Result<Expr> {
    DEFAULT.rewrite(expr)
}

/// Run the default pipeline over a lambda.
pub fn rewrite_lambda(lambda: &LambdaExpr) -> Result<LambdaExpr> {
    DEFAULT.rewrite_lambda(lambda)
}
