//! Rewriting visitors over expression trees.
//!
//! A [`Rewriter`] maps a tree to a new tree. Each node kind has a hook; the default hook rebuilds
//! the node from its rewritten children through the matching `walk_*` function, so an
//! implementation only overrides the node kinds it cares about and calls `walk_*` to fall back to
//! structural recursion.
//!
//! Re-visiting
//! - A rule that produces a new subtree and wants it processed again calls `self.rewrite(..)` on
//!   it. This re-runs only the current rewriter; pipelines compose rewriters with
//!   [`CompositeRewriter`](crate::rewrite::composite::CompositeRewriter).
//!
//! Read-only traversal lives in [`walk`]: a pre-order iterator with an explicit stack, plus
//! structural comparison and parameter queries.
//!
//! Example: double every integer literal
//! ```
//! use hyexpr::prelude::*;
//! use hyexpr::visitor::Rewriter;
//!
//! struct Double;
//! impl Rewriter for Double {
//!     fn rewrite_literal(&self, lit: &Literal) -> Result<Expr> {
//!         Ok(match lit.value {
//!             Value::Int(i) => Expr::constant(i * 2),
//!             _ => Expr::Literal(lit.clone()),
//!         })
//!     }
//! }
//!
//! let lambda = LambdaExpr::with_param("x", Ty::Int, |x| x + Expr::constant(21i64));
//! let doubled = Double.rewrite_lambda(&lambda).unwrap();
//! assert_eq!(doubled.to_string(), "x => x + 42");
//! ```
pub mod walk;

pub use walk::*;

use crate::{
    error::{Error, Result},
    expr::{
        BinaryExpr, CallExpr, ConditionalExpr, Expr, InvokeExpr, LambdaExpr, Literal, MemberExpr,
        UnaryExpr,
    },
    param::Param,
};

/// Tree-to-tree rewriting visitor.
pub trait Rewriter {
    /// Entry point; dispatches on the node kind.
    fn rewrite(&self, expr: &Expr) -> Result<Expr> {
        dispatch(self, expr)
    }

    fn rewrite_literal(&self, lit: &Literal) -> Result<Expr> {
        Ok(Expr::Literal(lit.clone()))
    }

    fn rewrite_param(&self, param: &Param) -> Result<Expr> {
        Ok(Expr::Param(param.clone()))
    }

    fn rewrite_member(&self, node: &MemberExpr) -> Result<Expr> {
        walk_member(self, node)
    }

    fn rewrite_call(&self, node: &CallExpr) -> Result<Expr> {
        walk_call(self, node)
    }

    fn rewrite_binary(&self, node: &BinaryExpr) -> Result<Expr> {
        walk_binary(self, node)
    }

    fn rewrite_unary(&self, node: &UnaryExpr) -> Result<Expr> {
        walk_unary(self, node)
    }

    fn rewrite_lambda_node(&self, node: &LambdaExpr) -> Result<Expr> {
        walk_lambda(self, node)
    }

    fn rewrite_invoke(&self, node: &InvokeExpr) -> Result<Expr> {
        walk_invoke(self, node)
    }

    fn rewrite_conditional(&self, node: &ConditionalExpr) -> Result<Expr> {
        walk_conditional(self, node)
    }

    /// Rewrite a lambda and require the result to still be a lambda.
    fn rewrite_lambda(&self, lambda: &LambdaExpr) -> Result<LambdaExpr> {
        match self.rewrite(&Expr::Lambda(lambda.clone()))? {
            Expr::Lambda(lambda) => Ok(lambda),
            other => Err(Error::UnsupportedShape {
                expr: other.to_string(),
                expected: "a lambda",
            }),
        }
    }
}

/// Call the hook matching the node kind.
pub fn dispatch<R: Rewriter + ?Sized>(r: &R, expr: &Expr) -> Result<Expr> {
    match expr {
        Expr::Literal(lit) => r.rewrite_literal(lit),
        Expr::Param(p) => r.rewrite_param(p),
        Expr::Member(m) => r.rewrite_member(m),
        Expr::Call(c) => r.rewrite_call(c),
        Expr::Binary(b) => r.rewrite_binary(b),
        Expr::Unary(u) => r.rewrite_unary(u),
        Expr::Lambda(l) => r.rewrite_lambda_node(l),
        Expr::Invoke(i) => r.rewrite_invoke(i),
        Expr::Conditional(c) => r.rewrite_conditional(c),
    }
}

fn rewrite_boxed<R: Rewriter + ?Sized>(r: &R, expr: &Expr) -> Result<Box<Expr>> {
    r.rewrite(expr).map(Box::new)
}

fn rewrite_all<R: Rewriter + ?Sized>(r: &R, exprs: &[Expr]) -> Result<Vec<Expr>> {
    exprs.iter().map(|e| r.rewrite(e)).collect()
}

pub fn walk_member<R: Rewriter + ?Sized>(r: &R, node: &MemberExpr) -> Result<Expr> {
    Ok(Expr::Member(MemberExpr {
        target: node
            .target
            .as_deref()
            .map(|t| rewrite_boxed(r, t))
            .transpose()?,
        member: node.member.clone(),
    }))
}

pub fn walk_call<R: Rewriter + ?Sized>(r: &R, node: &CallExpr) -> Result<Expr> {
    Ok(Expr::Call(CallExpr {
        target: node
            .target
            .as_deref()
            .map(|t| rewrite_boxed(r, t))
            .transpose()?,
        method: node.method.clone(),
        args: rewrite_all(r, &node.args)?,
    }))
}

pub fn walk_binary<R: Rewriter + ?Sized>(r: &R, node: &BinaryExpr) -> Result<Expr> {
    Ok(Expr::Binary(BinaryExpr {
        op: node.op,
        lhs: rewrite_boxed(r, &node.lhs)?,
        rhs: rewrite_boxed(r, &node.rhs)?,
        method: node.method.clone(),
    }))
}

pub fn walk_unary<R: Rewriter + ?Sized>(r: &R, node: &UnaryExpr) -> Result<Expr> {
    Ok(Expr::Unary(UnaryExpr {
        op: node.op,
        operand: rewrite_boxed(r, &node.operand)?,
        method: node.method.clone(),
        ty: node.ty.clone(),
    }))
}

pub fn walk_lambda<R: Rewriter + ?Sized>(r: &R, node: &LambdaExpr) -> Result<Expr> {
    Ok(Expr::Lambda(LambdaExpr {
        params: node.params.clone(),
        body: rewrite_boxed(r, &node.body)?,
    }))
}

pub fn walk_invoke<R: Rewriter + ?Sized>(r: &R, node: &InvokeExpr) -> Result<Expr> {
    Ok(Expr::Invoke(InvokeExpr {
        callee: rewrite_boxed(r, &node.callee)?,
        args: rewrite_all(r, &node.args)?,
    }))
}

pub fn walk_conditional<R: Rewriter + ?Sized>(r: &R, node: &ConditionalExpr) -> Result<Expr> {
    Ok(Expr::Conditional(ConditionalExpr {
        test: rewrite_boxed(r, &node.test)?,
        if_true: rewrite_boxed(r, &node.if_true)?,
        if_false: rewrite_boxed(r, &node.if_false)?,
    }))
}

impl<R: Rewriter + ?Sized> Rewriter for &R {
    fn rewrite(&self, expr: &Expr) -> Result<Expr> {
        (**self).rewrite(expr)
    }
}

impl<R: Rewriter + ?Sized> Rewriter for Box<R> {
    fn rewrite(&self, expr: &Expr) -> Result<Expr> {
        (**self).rewrite(expr)
    }
}
