//! Specification combinator resolver.
//!
//! `a & b`, `a && b`, `a | b`, `a || b` and `!a` over specifications, when bound to the
//! specification's own operator methods, become a single lambda combining the operands'
//! bodies. Each operand is either folded to a specification or rewritten until it is a lambda.
use hyexpr::{
    defensive::unexpected,
    error::Result,
    expr::{BinaryExpr, BinaryOp, Expr, LambdaExpr, UnaryExpr, UnaryOp},
    member::Method,
    rewrite::compose,
    ty::UnitKind,
    visitor::{Rewriter, walk_binary, walk_unary},
};
use log::trace;

use crate::{
    specification::{AND, NOT, OR, Specification},
    unit::fold_unit,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CombinatorResolver;

fn is_combinator(method: Option<&Method>, name: &str) -> bool {
    method.is_some_and(|m| m.is_declared_by(UnitKind::Specification) && m.name() == name)
}

/// Peel conversions through methods of specification types.
fn strip_conversions(mut expr: &Expr) -> &Expr {
    while let Expr::Unary(UnaryExpr {
        op: UnaryOp::Convert,
        operand,
        method: Some(method),
        ..
    }) = expr
    {
        if !method.is_declared_by(UnitKind::Specification) {
            break;
        }
        expr = &**operand;
    }
    expr
}

impl CombinatorResolver {
    fn operand(&self, expr: &Expr) -> Result<LambdaExpr> {
        let expr = strip_conversions(expr);
        if let Some(lambda) = fold_unit::<Specification>(expr)? {
            return Ok(lambda);
        }
        let rewritten = self.rewrite(expr)?;
        match strip_conversions(&rewritten) {
            Expr::Lambda(lambda) if lambda.arity() == 1 => Ok(lambda.clone()),
            other => fold_unit::<Specification>(other)?
                .ok_or_else(|| unexpected(other, "a specification or a predicate lambda")),
        }
    }
}

impl Rewriter for CombinatorResolver {
    fn rewrite_binary(&self, node: &BinaryExpr) -> Result<Expr> {
        let name = match node.op {
            BinaryOp::And | BinaryOp::AndAlso => AND,
            BinaryOp::Or | BinaryOp::OrElse => OR,
            _ => return walk_binary(self, node),
        };
        if !is_combinator(node.method.as_ref(), name) {
            return walk_binary(self, node);
        }
        let lhs = self.operand(&node.lhs)?;
        let rhs = self.operand(&node.rhs)?;
        let combined = if name == AND {
            compose::and(&lhs, &rhs)?
        } else {
            compose::or(&lhs, &rhs)?
        };
        trace!("resolved `{name}` into `{combined}`");
        self.rewrite(&Expr::Lambda(combined))
    }

    fn rewrite_unary(&self, node: &UnaryExpr) -> Result<Expr> {
        if node.op != UnaryOp::Not || !is_combinator(node.method.as_ref(), NOT) {
            return walk_unary(self, node);
        }
        let negated = compose::not(&self.operand(&node.operand)?)?;
        trace!("resolved `{NOT}` into `{negated}`");
        self.rewrite(&Expr::Lambda(negated))
    }
}
