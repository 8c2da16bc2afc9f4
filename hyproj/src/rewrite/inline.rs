//! Unit-invocation inliner.
//!
//! Rules, first match wins, default recursion otherwise:
//! 1. `unit.evaluate(arg)`, through the evaluation member then invoked or as a direct method
//!    call, whose receiver folds to a unit (or already is a single-parameter lambda): the unit's
//!    body with its parameter replaced by `arg`, visited again.
//! 2. A bare read of the evaluation member on such a receiver: the receiver, visited again.
//! 3. A literal or member read of the unit type that folds: the unit's lambda, visited again.
//! 4. A conversion through a method declared by the unit type: the operand, visited again.
//!
//! Receivers that do not fold are left to default recursion.
use std::{fmt, marker::PhantomData};

use hyexpr::{
    error::Result,
    expr::{CallExpr, Expr, InvokeExpr, LambdaExpr, Literal, MemberExpr, UnaryExpr, UnaryOp},
    member::{Member, Method},
    rewrite::{apply_lambda, try_evaluate},
    visitor::{Rewriter, walk_call, walk_invoke, walk_member, walk_unary},
};
use log::trace;

use crate::{
    projection::Projection,
    specification::Specification,
    unit::{Unit, fold_unit},
};

/// Inliner for units of kind `U`.
pub struct UnitInliner<U> {
    unit: PhantomData<fn() -> U>,
}

pub type ProjectionInliner = UnitInliner<Projection>;
pub type SpecificationInliner = UnitInliner<Specification>;

impl<U> UnitInliner<U> {
    pub const fn new() -> Self {
        Self { unit: PhantomData }
    }
}

impl<U> Default for UnitInliner<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Clone for UnitInliner<U> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<U: Unit> fmt::Debug for UnitInliner<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitInliner<{}>", U::KIND)
    }
}

impl<U: Unit> UnitInliner<U> {
    fn is_evaluate_member(member: &Member) -> bool {
        member.is_declared_by(U::KIND) && member.name() == U::EVALUATE
    }

    fn is_evaluate_method(method: &Method) -> bool {
        method.is_declared_by(U::KIND) && method.name() == U::EVALUATE
    }

    /// Lambda denoted by a receiver, if known at rewrite time.
    fn receiver_lambda(receiver: &Expr) -> Result<Option<LambdaExpr>> {
        match receiver {
            Expr::Lambda(lambda) if lambda.arity() == 1 => Ok(Some(lambda.clone())),
            other => fold_unit::<U>(other),
        }
    }

    fn inline_call(&self, receiver: &Expr, arg: &Expr) -> Result<Option<Expr>> {
        let Some(lambda) = Self::receiver_lambda(receiver)? else {
            return Ok(None);
        };
        trace!("inlining `{lambda}` applied to `{arg}`");
        let body = apply_lambda(&lambda, arg.clone())?;
        self.rewrite(&body).map(Some)
    }

    fn is_receiver(receiver: &Expr) -> Result<bool> {
        Ok(match receiver {
            Expr::Lambda(lambda) => lambda.arity() == 1,
            other => try_evaluate(other)?.is_some(),
        })
    }
}

impl<U: Unit> Rewriter for UnitInliner<U> {
    fn rewrite_invoke(&self, node: &InvokeExpr) -> Result<Expr> {
        if let (Expr::Member(callee), [arg]) = (&*node.callee, node.args.as_slice()) {
            if let Some(receiver) = callee.target.as_deref() {
                if Self::is_evaluate_member(&callee.member) {
                    if let Some(inlined) = self.inline_call(receiver, arg)? {
                        return Ok(inlined);
                    }
                }
            }
        }
        walk_invoke(self, node)
    }

    fn rewrite_call(&self, node: &CallExpr) -> Result<Expr> {
        if let (Some(receiver), [arg]) = (node.target.as_deref(), node.args.as_slice()) {
            if Self::is_evaluate_method(&node.method) {
                if let Some(inlined) = self.inline_call(receiver, arg)? {
                    return Ok(inlined);
                }
            }
        }
        walk_call(self, node)
    }

    fn rewrite_member(&self, node: &MemberExpr) -> Result<Expr> {
        if let Some(receiver) = node.target.as_deref() {
            if Self::is_evaluate_member(&node.member) && Self::is_receiver(receiver)? {
                trace!("unwrapping `{}` reference", U::EVALUATE);
                return self.rewrite(receiver);
            }
        }
        if node.member.ty().declares(U::KIND) {
            if let Some(lambda) = fold_unit::<U>(&Expr::Member(node.clone()))? {
                trace!("splicing {} read as `{lambda}`", U::KIND);
                return self.rewrite(&Expr::Lambda(lambda));
            }
        }
        walk_member(self, node)
    }

    fn rewrite_literal(&self, lit: &Literal) -> Result<Expr> {
        if lit.ty.declares(U::KIND) {
            if let Some(lambda) = fold_unit::<U>(&Expr::Literal(lit.clone()))? {
                trace!("splicing {} literal as `{lambda}`", U::KIND);
                return self.rewrite(&Expr::Lambda(lambda));
            }
        }
        Ok(Expr::Literal(lit.clone()))
    }

    fn rewrite_unary(&self, node: &UnaryExpr) -> Result<Expr> {
        if node.op == UnaryOp::Convert
            && node
                .method
                .as_ref()
                .is_some_and(|m| m.is_declared_by(U::KIND))
        {
            return self.rewrite(&node.operand);
        }
        walk_unary(self, node)
    }
}
