mod common;

use common::*;
use hyexpr::prelude::*;
use hyexpr::rewrite::BoxedRewriter;
use hyproj::prelude::*;
use hyproj::rewrite::{FactoryResolver, ProjectionInliner, SpecificationInliner, rewrite};

/// `f => f.evaluate("ab")` over an unknown projection.
fn unknown_projection_call() -> LambdaExpr {
    let evaluate = Projection::evaluate_member(&Ty::Str, &Ty::Int);
    LambdaExpr::with_param("f", Ty::projection(Ty::Str, Ty::Int), |f| {
        f.member(&evaluate).invoke([Expr::constant("ab")])
    })
}

#[test]
fn unfoldable_receivers_are_left_alone() {
    let lambda = unknown_projection_call();
    let out = UnitRewriter::new().rewrite_lambda(&lambda).unwrap();
    assert!(compare_expressions(&lambda.into(), &out.clone().into()));
    assert!(references_units(&out.into()));
}

#[test]
fn verify_rejects_residual_references() {
    let verified = UnitRewriter::with_options(RewriteOptions { verify: true });
    assert!(matches!(
        verified.rewrite_lambda(&unknown_projection_call()),
        Err(Error::ResidualUnitReference { .. })
    ));

    let p1 = length_projection();
    let clean = LambdaExpr::with_param("x", Ty::Str, |x| p1.invoke_expr(x));
    let out = verified.rewrite_lambda(&clean).unwrap();
    assert_eq!(out.to_string(), "x => x.length");
}

#[test]
fn custom_pipeline_runs_only_its_passes() {
    let (p1, a) = (length_projection(), is("A"));
    let lambda = LambdaExpr::with_param("x", Ty::Str, |x| {
        a.call_expr(x.clone()) & p1.invoke_expr(x).equals(Expr::constant(1i64))
    });

    let projections_only =
        UnitRewriter::with_passes([Box::new(ProjectionInliner::new()) as BoxedRewriter]);
    let out = projections_only.rewrite_lambda(&lambda).unwrap();
    assert!(references_units(&out.clone().into()));
    assert!(out.to_string().ends_with("& (x.length == 1)"));

    let verified = UnitRewriter::with_passes([
        Box::new(SpecificationInliner::new()) as BoxedRewriter,
        Box::new(ProjectionInliner::new()),
    ])
    .options(RewriteOptions { verify: true });
    let out = verified.rewrite_lambda(&lambda).unwrap();
    assert_eq!(out.to_string(), r#"x => (x == "A") & (x.length == 1)"#);
}

#[test]
fn default_rewrite_is_idempotent() {
    let (a, short) = (is("A"), has_length(1));
    let tree = Specification::and_expr(a.literal(), Specification::not_expr(short.literal()).unwrap())
        .unwrap();

    let once = rewrite(&tree).unwrap();
    assert_eq!(once.to_string(), r#"x => (x == "A") && !(x.length == 1)"#);
    let twice = rewrite(&once).unwrap();
    assert!(compare_expressions(&once, &twice));
}

#[test]
fn null_factory_receiver_is_an_error() {
    let factory = equals_factory();
    let tree = Expr::null(factory.signature()).call(&factory.bind_method(), [Expr::constant("A")]);
    assert!(matches!(
        FactoryResolver.rewrite(&tree),
        Err(Error::NullValue { .. })
    ));
}

#[test]
fn non_factory_receiver_is_an_error() {
    let factory = equals_factory();
    let tree = Expr::constant("A").call(&factory.bind_method(), [Expr::constant("A")]);
    assert!(matches!(
        FactoryResolver.rewrite(&tree),
        Err(Error::UnsupportedShape { .. })
    ));
}

#[test]
fn null_specification_literal_is_an_error() {
    let null = Expr::null(Ty::specification(Ty::Str));
    assert!(matches!(
        SpecificationInliner::new().rewrite(&null),
        Err(Error::NullValue { .. })
    ));
}

#[test]
fn projection_of_wrong_kind_is_a_type_error() {
    // A projection literal mislabeled as a specification.
    let mislabeled = Expr::literal(
        Value::object(length_projection()),
        Ty::specification(Ty::Str),
    );
    assert!(matches!(
        SpecificationInliner::new().rewrite(&mislabeled),
        Err(Error::TypeMismatch { .. })
    ));
}
