//! Partial evaluator: rewrite-time folding of literal-rooted member chains.
//!
//! A node folds when it is a literal, or a chain of field/property reads whose root is a literal
//! or a static member. Calls, operators, lambdas and invocations never fold, so folding never runs
//! user code beyond member getters.
use log::trace;
use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    expr::Expr,
    member::Member,
    value::Value,
};

/// Fold `expr` if it has a value known at rewrite time.
///
/// Returns `Ok(None)` when the node is not foldable. Errors only come from member getters.
pub fn try_evaluate(expr: &Expr) -> Result<Option<Value>> {
    match expr {
        Expr::Literal(lit) => Ok(Some(lit.value.clone())),
        Expr::Member(_) => {
            let mut chain: SmallVec<[&Member; 8]> = SmallVec::new();
            let mut cursor = expr;
            let mut value = loop {
                match cursor {
                    Expr::Member(m) => {
                        chain.push(&m.member);
                        match m.target.as_deref() {
                            Some(target) => cursor = target,
                            None => break None,
                        }
                    }
                    Expr::Literal(lit) => break Some(lit.value.clone()),
                    _ => {
                        trace!("`{expr}` is rooted in `{cursor}` and does not fold");
                        return Ok(None);
                    }
                }
            };

            // Root to leaf; a static root reads with no target.
            for member in chain.iter().rev() {
                value = Some(member.read(value.as_ref())?);
            }
            Ok(value)
        }
        _ => Ok(None),
    }
}

/// Fold `expr` or fail with [`Error::Unfoldable`].
pub fn evaluate(expr: &Expr) -> Result<Value> {
    try_evaluate(expr)?.ok_or_else(|| Error::Unfoldable {
        expr: expr.to_string(),
    })
}

/// Fold `expr`, additionally failing with [`Error::NullValue`] on `null`.
pub fn evaluate_not_null(expr: &Expr) -> Result<Value> {
    match evaluate(expr)? {
        Value::Null => Err(Error::NullValue {
            expr: expr.to_string(),
        }),
        value => Ok(value),
    }
}

/// Whether `expr` folds. Getter failures count as not foldable.
pub fn is_foldable(expr: &Expr) -> bool {
    matches!(try_evaluate(expr), Ok(Some(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn holder() -> (DeclaringType, Member) {
        let ty = DeclaringType::new("Holder");
        let a = ty.field("a", Ty::Str);
        (ty, a)
    }

    #[test]
    fn literal_folds() {
        let e = Expr::constant("constant");
        assert_eq!(try_evaluate(&e).unwrap(), Some(Value::str("constant")));
    }

    #[test]
    fn static_field_and_property_fold() {
        let ty = DeclaringType::new("Statics");
        let field = ty.static_field("field", Ty::Str, Value::str("constant"));
        let prop = ty.static_property("prop", Ty::Str, || Ok(Value::str("constant")));
        assert_eq!(
            evaluate(&Expr::static_member(&field)).unwrap(),
            Value::str("constant")
        );
        assert_eq!(
            evaluate(&Expr::static_member(&prop)).unwrap(),
            Value::str("constant")
        );
    }

    #[test]
    fn nested_static_chain_folds() {
        let (ty, a) = holder();
        let instance = Value::object(Record::new(ty.clone(), [("a", Value::str("A"))]));
        let statics = DeclaringType::new("Statics");
        let instance = statics.static_field("instance", ty.ty().clone(), instance);
        let e = Expr::static_member(&instance).member(&a);
        assert_eq!(evaluate(&e).unwrap(), Value::str("A"));
    }

    #[test]
    fn literal_rooted_chain_replays_root_to_leaf() {
        let (inner_ty, a) = holder();
        let outer_ty = DeclaringType::new("Outer");
        let inner = outer_ty.field("inner", inner_ty.ty().clone());
        let root = Record::new(
            outer_ty,
            [(
                "inner",
                Value::object(Record::new(inner_ty, [("a", Value::str("nested"))])),
            )],
        );
        let e = Expr::constant(Value::object(root)).member(&inner).member(&a);
        assert_eq!(evaluate(&e).unwrap(), Value::str("nested"));
    }

    #[test]
    fn parameter_rooted_chain_does_not_fold() {
        let (ty, a) = holder();
        let x = Param::new("x", ty.ty().clone());
        let e = Expr::param(&x).member(&a);
        assert_eq!(try_evaluate(&e).unwrap(), None);
        assert!(evaluate(&e).unwrap_err().is_unfoldable());
    }

    #[test]
    fn calls_do_not_fold() {
        let ty = DeclaringType::new("Statics");
        let f = ty.static_method("make", [], Ty::Str, |_| Ok(Value::str("constant")));
        assert!(!is_foldable(&Expr::static_call(&f, [])));
    }

    #[test]
    fn null_is_rejected_when_required() {
        let e = Expr::null(Ty::Str);
        assert_eq!(evaluate(&e).unwrap(), Value::Null);
        assert!(evaluate_not_null(&e).unwrap_err().is_null_value());
    }
}
