use hyexpr::prelude::*;
use hyexpr::rewrite::{
    CompositeRewriter, ReplaceCapturedArgument, ReplaceParam, bind_arguments, compose,
};

fn string_ty() -> DeclaringType {
    DeclaringType::of(Ty::Str)
}

fn length() -> Member {
    string_ty().property("length", Ty::Int, |v| {
        Ok(Value::Int(v.as_str().map(|s| s.len() as i64).unwrap_or(0)))
    })
}

/// A closure `z => z + x` whose `x` was captured from a builder argument.
fn captured_closure(x: &str) -> (LambdaExpr, FormalParam) {
    let closure = DeclaringType::closure("<>c__DisplayClass0");
    let field = closure.field("x", Ty::Str);
    let container = Value::object(Record::new(closure.clone(), [("x", Value::str(x))]));
    let lambda = LambdaExpr::with_param("z", Ty::Str, |z| {
        z + Expr::literal(container, closure.ty().clone()).member(&field)
    });
    (lambda, FormalParam::new("x", Ty::Str))
}

#[test]
fn composite_empty_is_identity() {
    let lambda = LambdaExpr::with_param("x", Ty::Str, |x| x + Expr::constant("A"));
    let out = CompositeRewriter::default().rewrite_lambda(&lambda).unwrap();
    assert_eq!(out.to_string(), r#"x => x + "A""#);
    assert!(compare_expressions(&lambda.into(), &out.into()));
}

#[test]
fn composite_runs_passes_in_order() {
    let lambda = LambdaExpr::with_param("x", Ty::Str, |x| x + Expr::constant("A"));
    let p = Param::new("p", Ty::Str);
    let q = Param::new("q", Ty::Str);
    let pipeline = CompositeRewriter::default()
        .then(ReplaceParam::new(&lambda.params[0], Expr::param(&p)))
        .then(ReplaceParam::new(&p, Expr::param(&q)));
    assert_eq!(pipeline.len(), 2);
    let out = pipeline.rewrite_lambda(&lambda).unwrap();
    assert_eq!(out.to_string(), r#"q => q + "A""#);
}

#[test]
fn captured_argument_is_replaced_and_compiles() {
    let (lambda, x) = captured_closure("TEMP");
    assert_eq!(lambda.to_string(), r#"z => z + x"#);

    let fixture = DeclaringType::new("Fixture");
    let a = fixture.field("A", Ty::Str);
    let receiver = Value::object(Record::new(fixture.clone(), [("A", Value::str("A"))]));
    let accessor = Expr::literal(receiver, fixture.ty().clone()).member(&a);

    let out = ReplaceCapturedArgument::new(x, accessor)
        .rewrite_lambda(&lambda)
        .unwrap();
    assert_eq!(out.to_string(), "z => z + Fixture.A");
    assert_eq!(compile(&out).call1(Value::str("B")).unwrap(), Value::str("BA"));
}

#[test]
fn same_named_field_of_ordinary_type_is_not_captured() {
    let plain = DeclaringType::new("Plain");
    let field = plain.field("x", Ty::Str);
    let record = Value::object(Record::new(plain.clone(), [("x", Value::str("kept"))]));
    let lambda = LambdaExpr::with_param("z", Ty::Str, |z| {
        z + Expr::literal(record, plain.ty().clone()).member(&field)
    });
    let out = ReplaceCapturedArgument::new(FormalParam::new("x", Ty::Str), Expr::constant("bound"))
        .rewrite_lambda(&lambda)
        .unwrap();
    assert!(compare_expressions(&lambda.into(), &out.into()));
}

#[test]
fn captured_read_with_other_type_is_not_replaced() {
    let (lambda, _) = captured_closure("TEMP");
    let out = ReplaceCapturedArgument::new(FormalParam::new("x", Ty::Int), Expr::constant(1i64))
        .rewrite_lambda(&lambda)
        .unwrap();
    assert_eq!(out.to_string(), "z => z + x");
}

#[test]
fn two_arguments_bind_independently() {
    let closure = DeclaringType::closure("<>c__DisplayClass1");
    let a = closure.field("a", Ty::Str);
    let b = closure.field("b", Ty::Int);
    let container = Value::object(Record::new(
        closure.clone(),
        [("a", Value::str("?")), ("b", Value::Int(0))],
    ));
    let lit = Expr::literal(container, closure.ty().clone());
    let lambda = LambdaExpr::with_param("s", Ty::Str, |s| {
        s.equals(lit.clone().member(&a))
            .and_also(Expr::constant(3i64).greater_than(lit.member(&b)))
    });
    let out = bind_arguments(
        &lambda.into(),
        (&FormalParam::new("a", Ty::Str), Expr::constant("A")),
        (&FormalParam::new("b", Ty::Int), Expr::constant(2i64)),
    )
    .unwrap();
    assert_eq!(out.to_string(), r#"s => (s == "A") && (3 > 2)"#);
}

#[test]
fn substitution_matches_application() {
    // compile(substitute(body, p, r)) == compile(p => body)(eval(r))
    let len = length();
    let lambda = LambdaExpr::with_param("s", Ty::Str, |s| s.member(&len) + Expr::constant(1i64));
    let replacement = Expr::constant("abc");
    let substituted =
        hyexpr::rewrite::substitute(&lambda.body, &lambda.params[0], replacement.clone()).unwrap();
    assert_eq!(count_param(&substituted, &lambda.params[0]), 0);

    let direct = compile(&LambdaExpr::nullary(substituted)).call(&[]).unwrap();
    let applied = compile(&lambda).call1(Value::str("abc")).unwrap();
    assert_eq!(direct, applied);
    assert_eq!(direct, Value::Int(4));
}

#[test]
fn composed_predicates_agree_with_their_parts() {
    let len = length();
    let a = LambdaExpr::with_param("x", Ty::Str, |x| x.equals(Expr::constant("A")));
    let b = LambdaExpr::with_param("y", Ty::Str, |y| y.member(&len).equals(Expr::constant(1i64)));
    let and = compile(&compose::and(&a, &b).unwrap());
    let or = compile(&compose::or(&a, &b).unwrap());
    let not = compile(&compose::not(&a).unwrap());
    let (fa, fb) = (compile(&a), compile(&b));

    for input in ["A", "B", "AB", ""] {
        let x = Value::str(input);
        let va = fa.call1(x.clone()).unwrap().as_bool().unwrap();
        let vb = fb.call1(x.clone()).unwrap().as_bool().unwrap();
        assert_eq!(and.call1(x.clone()).unwrap(), Value::Bool(va && vb));
        assert_eq!(or.call1(x.clone()).unwrap(), Value::Bool(va || vb));
        assert_eq!(not.call1(x).unwrap(), Value::Bool(!va));
    }
}
