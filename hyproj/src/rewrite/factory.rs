//! Factory-invocation resolver.
//!
//! A `bind` or `bind_first` call on a factory whose receiver folds is performed at rewrite
//! time. Arguments that fold are bound by value. A parameterless lambda is bound as a deferred
//! accessor. Any other argument is bound as a deferred accessor over its subtree, so reads of
//! enclosing lambda parameters survive into the produced tree.
use hyexpr::{
    defensive::unexpected,
    error::Result,
    expr::{CallExpr, Expr},
    rewrite::{evaluate_not_null, try_evaluate},
    visitor::{Rewriter, walk_call},
};
use log::trace;

use crate::factory::{Argument, BIND, BIND_FIRST, Deferred, as_bindable};

#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryResolver;

fn is_binding(node: &CallExpr) -> bool {
    node.method
        .declaring()
        .unit_kind()
        .is_some_and(|kind| kind.is_factory())
        && matches!(node.method.name(), BIND | BIND_FIRST)
}

impl FactoryResolver {
    fn argument(&self, arg: &Expr) -> Result<Argument> {
        let arg = self.rewrite(arg)?;
        if let Some(value) = try_evaluate(&arg)? {
            return Ok(Argument::Value(value));
        }
        match arg {
            Expr::Lambda(accessor) if accessor.arity() == 0 => {
                Deferred::from_expr(accessor).map(Argument::Deferred)
            }
            subtree => Ok(Argument::Deferred(Deferred::from_subtree(subtree))),
        }
    }
}

impl Rewriter for FactoryResolver {
    fn rewrite_call(&self, node: &CallExpr) -> Result<Expr> {
        if !is_binding(node) {
            return walk_call(self, node);
        }
        let Some(receiver) = node.target.as_deref() else {
            return Err(unexpected(&Expr::Call(node.clone()), "a factory receiver"));
        };
        let receiver = self.rewrite(receiver)?;
        let value = evaluate_not_null(&receiver)?;
        let factory = as_bindable(&value).ok_or_else(|| unexpected(&receiver, "a factory"))?;
        let args = node
            .args
            .iter()
            .map(|arg| self.argument(arg))
            .collect::<Result<Vec<_>>>()?;
        let bound = factory.bind_arguments(args)?;
        let ty = bound.ty();
        trace!("resolved `{}` into {ty}", node.method.name());
        self.rewrite(&Expr::literal(bound, ty))
    }
}
