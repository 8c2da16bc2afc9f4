mod common;

use std::sync::Arc;

use common::*;
use hyexpr::prelude::*;
use hyproj::prelude::*;
use hyproj::rewrite::ProjectionInliner;

#[test]
fn nested_projection_is_inlined() {
    let p1 = length_projection();
    let p2 = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        p1.invoke_expr(x) + Expr::constant(1i64)
    }))
    .unwrap();

    assert_eq!(text(&p2), "x => x.length + 1");
    assert_eq!(both(&p2, Value::str("ab")), Value::Int(3));
    assert!(!references_units(&p2.as_ast().unwrap()));
}

#[test]
fn direct_call_is_inlined() {
    let p1 = length_projection();
    let p2 = Projection::new(LambdaExpr::with_param("y", Ty::Str, |y| {
        p1.call_expr(y) * Expr::constant(2i64)
    }))
    .unwrap();

    assert_eq!(text(&p2), "y => y.length * 2");
    assert_eq!(both(&p2, Value::str("abc")), Value::Int(6));
}

#[test]
fn three_levels_flatten_in_one_pass() {
    let p1 = length_projection();
    let p2 = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        p1.invoke_expr(x) + Expr::constant(1i64)
    }))
    .unwrap();
    let p3 = Projection::new(LambdaExpr::with_param("s", Ty::Str, |s| {
        p2.call_expr(s) * Expr::constant(2i64)
    }))
    .unwrap();

    assert_eq!(text(&p3), "s => (s.length + 1) * 2");
    assert_eq!(both(&p3, Value::str("abcd")), Value::Int(10));
}

#[test]
fn bare_references_and_conversions_become_the_lambda() {
    let p1 = length_projection();
    let inliner = ProjectionInliner::new();

    for reference in [p1.literal(), p1.function_expr(), p1.convert_expr()] {
        let out = inliner.rewrite(&reference).unwrap();
        assert_eq!(out.to_string(), "x => x.length");
        assert!(!references_units(&out));
    }
}

#[test]
fn function_reference_passed_to_host_method() {
    let p1 = length_projection();
    let apply = DeclaringType::new("Host").static_method(
        "apply",
        [Ty::func([Ty::Str], Ty::Int), Ty::Str],
        Ty::Int,
        |args| args[0].as_func().unwrap().call1(args[1].clone()),
    );
    let p2 = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        Expr::static_call(&apply, [p1.function_expr(), x])
    }))
    .unwrap();

    assert_eq!(text(&p2), "x => Host.apply(x => x.length, x)");
    assert_eq!(both(&p2, Value::str("abc")), Value::Int(3));
    assert!(!references_units(&p2.as_ast().unwrap()));
}

#[test]
fn rewriting_is_idempotent() {
    let p1 = length_projection();
    let p2 = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        p1.invoke_expr(x) + Expr::constant(1i64)
    }))
    .unwrap();

    let once = p2.expression().unwrap();
    let twice = UnitRewriter::new().rewrite_lambda(&once).unwrap();
    assert!(compare_expressions(&once.into(), &twice.into()));
}

#[test]
fn expression_is_memoized() {
    let p1 = length_projection();
    let a = p1.expression().unwrap();
    let b = p1.expression().unwrap();
    // Same parameter identity on every access.
    assert_eq!(a.params[0].id(), b.params[0].id());
}

#[test]
fn chaining_composes_both_forms() {
    let name = name();
    let length = length_projection();

    let name_length = length
        .apply_to(LambdaExpr::with_param("p", person_ty().ty().clone(), |p| {
            p.member(&name)
        }))
        .unwrap();
    assert_eq!(text(&name_length), "p => p.name.length");
    assert_eq!(both(&name_length, person("Ann", "A")), Value::Int(3));

    let doubled = length
        .to(LambdaExpr::with_param("n", Ty::Int, |n| n * Expr::constant(2i64)))
        .unwrap();
    assert_eq!(text(&doubled), "x => x.length * 2");
    assert_eq!(doubled.result(), &Ty::Int);
    assert_eq!(both(&doubled, Value::str("abc")), Value::Int(6));

    let name_of = Projection::new(LambdaExpr::with_param("p", person_ty().ty().clone(), |p| {
        p.member(&name)
    }))
    .unwrap();
    let chained = name_of.to_projection(&length);
    assert_eq!(text(&chained), "p => p.name.length");
    assert_eq!(chained.source(), person_ty().ty());
    assert_eq!(both(&chained, person("Bob", "B")), Value::Int(3));
}

#[test]
fn chaining_with_compiled_functions() {
    let length = length_projection();
    let plus_one = Compiled::new(Func::unary(|n| match n {
        Value::Int(n) => Ok(Value::Int(n + 1)),
        other => Err(Error::TypeMismatch {
            expected: "int".into(),
            found: other.ty().to_string(),
        }),
    }))
    .with_expression(LambdaExpr::with_param("n", Ty::Int, |n| {
        n + Expr::constant(1i64)
    }));

    let chained = length.to_fn(Ty::Int, plus_one).unwrap();
    assert_eq!(text(&chained), "x => x.length + 1");
    assert_eq!(both(&chained, Value::str("ab")), Value::Int(3));
}

#[test]
fn function_backed_projection_uses_decompiler() {
    let tree = LambdaExpr::with_param("x", Ty::Str, |x| x.member(&length()));
    let decompiler: DecompilerRef = Arc::new(move |_: &Func| -> Result<LambdaExpr> { Ok(tree.clone()) });
    let func = Func::unary(|x| Ok(Value::Int(x.as_str().map(|s| s.len() as i64).unwrap_or(0))));

    let p = Projection::with_fn(
        Ty::Str,
        Ty::Int,
        Compiled::new(func).with_decompiler(decompiler),
    )
    .unwrap();
    assert_eq!(text(&p), "x => x.length");
    assert_eq!(both(&p, Value::str("abcd")), Value::Int(4));
}

#[test]
fn function_without_tree_is_rejected() {
    let func = Func::unary(|x| Ok(x.clone()));
    let err = Projection::with_fn(Ty::Str, Ty::Str, Compiled::new(func)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { argument: "expression", .. }));

    let binary = Func::new(2, |args| Ok(args[0].clone()));
    let err = Projection::with_fn(Ty::Str, Ty::Str, Compiled::new(binary)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { argument: "func", .. }));
}

#[test]
fn multi_parameter_body_is_rejected() {
    let lambda = LambdaExpr::with_params2(("a", Ty::Int), ("b", Ty::Int), |a, b| a + b);
    assert!(matches!(
        Projection::new(lambda),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn null_unit_fails_rewriting_only() {
    let evaluate = Projection::evaluate_member(&Ty::Str, &Ty::Int);
    let null = Expr::null(Ty::projection(Ty::Str, Ty::Int));
    let p = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        null.member(&evaluate).invoke([x])
    }))
    .unwrap();

    assert!(matches!(p.expression(), Err(Error::NullValue { .. })));
    // Not published: a second access fails the same way.
    assert!(matches!(p.expression(), Err(Error::NullValue { .. })));
}
