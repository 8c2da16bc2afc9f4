mod common;

use std::sync::{
    Arc,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};

use common::*;
use hyexpr::prelude::*;
use hyproj::factory::as_bindable;
use hyproj::prelude::*;

fn is_satisfied_by() -> Method {
    Specification::evaluate_method(&Ty::Str, &Ty::Bool)
}

#[test]
fn immediate_binding_keeps_closure_read() {
    let spec = equals_factory().bind("A");

    assert_eq!(text(&spec), "x => x == param1");
    assert!(both(&spec, Value::str("A")).expect_bool("test").unwrap());
    assert!(!both(&spec, Value::str("B")).expect_bool("test").unwrap());
}

#[test]
fn deferred_binding_splices_accessor_body() {
    let settings = DeclaringType::new("Settings");
    let value = settings.field("value", Ty::Str);
    let record = Value::object(Record::new(settings.clone(), [("value", Value::str("A"))]));
    let accessor = LambdaExpr::nullary(Expr::literal(record, settings.ty().clone()).member(&value));

    let spec = equals_factory().bind_deferred(Deferred::from_expr(accessor).unwrap());
    assert_eq!(text(&spec), "x => x == Settings.value");
    assert!(both(&spec, Value::str("A")).expect_bool("test").unwrap());
}

#[test]
fn deferred_function_is_read_on_every_call() {
    let counter = Arc::new(AtomicI64::new(1));
    let add = ProjectionFactory::new(
        FormalParam::new("offset", Ty::Int),
        Ty::Int,
        Ty::Int,
        |offset| Ok(LambdaExpr::with_param("x", Ty::Int, |x| x + offset.expr())),
    );
    let accessor = {
        let counter = counter.clone();
        Func::nullary(move || Ok(Value::Int(counter.load(Ordering::SeqCst))))
    };

    let projection = add.bind_deferred(Deferred::from_fn(accessor));
    assert_eq!(projection.evaluate(Value::Int(1)).unwrap(), Value::Int(2));
    counter.store(10, Ordering::SeqCst);
    assert_eq!(projection.evaluate(Value::Int(1)).unwrap(), Value::Int(11));

    // No tree and no decompiler for the accessor.
    assert!(matches!(
        projection.expression(),
        Err(Error::DecompilerUnavailable)
    ));
}

#[test]
fn accessor_must_be_parameterless() {
    let lambda = LambdaExpr::with_param("x", Ty::Str, |x| x);
    assert!(matches!(
        Deferred::from_expr(lambda),
        Err(Error::InvalidArgument { argument: "accessor", .. })
    ));
}

#[test]
fn two_parameter_bindings() {
    let factory = concat_factory();

    let full = factory.bind("A", "B");
    assert_eq!(text(&full), "x => x == (first + second)");
    assert!(both(&full, Value::str("AB")).expect_bool("test").unwrap());

    let partial = factory.bind_first("A");
    assert_eq!(partial.param().name.as_ref(), "second");
    assert_eq!(
        partial.signature(),
        Ty::specification_factory([Ty::Str], Ty::Str)
    );
    let spec = partial.bind("C");
    assert!(both(&spec, Value::str("AC")).expect_bool("test").unwrap());

    let first = Deferred::from_expr(LambdaExpr::nullary(Expr::constant("D"))).unwrap();
    let spec = factory.bind_first_deferred(first).bind("E");
    assert_eq!(text(&spec), r#"x => x == ("D" + second)"#);
    assert!(both(&spec, Value::str("DE")).expect_bool("test").unwrap());

    let spec = factory.apply(
        Argument::value("F"),
        Deferred::from_expr(LambdaExpr::nullary(Expr::constant("G")))
            .unwrap()
            .into(),
    );
    assert_eq!(text(&spec), r#"x => x == (first + "G")"#);
}

#[test]
fn binding_in_tree_resolves_to_the_bound_unit() {
    let factory = equals_factory();
    let outer = Specification::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        factory
            .bind_expr(Expr::constant("A"))
            .call(&is_satisfied_by(), [x])
    }))
    .unwrap();

    assert_eq!(text(&outer), "x => x == param1");
    assert!(!references_units(&outer.as_ast().unwrap()));
    assert!(both(&outer, Value::str("A")).expect_bool("test").unwrap());
    assert!(!both(&outer, Value::str("B")).expect_bool("test").unwrap());
}

#[test]
fn binding_in_tree_to_enclosing_parameter_is_deferred() {
    let factory = equals_factory();
    let outer = Specification::new(LambdaExpr::with_param("p", person_ty().ty().clone(), |p| {
        factory
            .bind_expr(p.member(&name()))
            .call(&is_satisfied_by(), [Expr::constant("Ann")])
    }))
    .unwrap();

    assert_eq!(text(&outer), r#"p => "Ann" == p.name"#);
    assert!(both(&outer, person("Ann", "")).expect_bool("test").unwrap());
    assert!(!both(&outer, person("Bob", "")).expect_bool("test").unwrap());
}

#[test]
fn every_foldability_combination_of_two_parameters() {
    let factory = concat_factory();
    let constant = |s: &str| Expr::constant(s);
    let cases: [(bool, bool, &str); 4] = [
        (true, true, "p => p.name == (first + second)"),
        (true, false, "p => p.name == (first + p.nick)"),
        (false, true, "p => p.name == (p.nick + second)"),
        (false, false, "p => p.name == (p.nick + p.nick)"),
    ];
    let people = [person("AB", "A"), person("AA", "A"), person("BB", "B")];

    for (first_folds, second_folds, expected) in cases {
        let outer = Specification::new(LambdaExpr::with_param("p", person_ty().ty().clone(), |p| {
            let nick_read = p.clone().member(&nick());
            let first = if first_folds { constant("A") } else { nick_read.clone() };
            let second = if second_folds { constant("B") } else { nick_read };
            factory
                .bind_expr(first, second)
                .call(&is_satisfied_by(), [p.member(&name())])
        }))
        .unwrap();

        assert_eq!(text(&outer), expected);
        assert!(!references_units(&outer.as_ast().unwrap()));
        for input in &people {
            both(&outer, input.clone());
        }
    }
}

#[test]
fn partial_binding_in_tree() {
    let factory = concat_factory();
    let bind = factory.bind_first("").bind_method();
    let outer = Specification::new(LambdaExpr::with_param("p", person_ty().ty().clone(), |p| {
        factory
            .bind_first_expr(Expr::constant("A"))
            .call(&bind, [p.clone().member(&nick())])
            .call(&is_satisfied_by(), [p.member(&name())])
    }))
    .unwrap();

    assert_eq!(text(&outer), "p => p.name == (first + p.nick)");
    assert!(both(&outer, person("AB", "B")).expect_bool("test").unwrap());
    assert!(!both(&outer, person("AB", "C")).expect_bool("test").unwrap());
}

#[test]
fn function_builders_back_the_compiled_form() {
    let calls = Arc::new(AtomicUsize::new(0));
    let factory = SpecificationFactory::with_fns(
        FormalParam::new("param1", Ty::Str),
        Ty::Str,
        Ty::Bool,
        {
            let calls = calls.clone();
            move |param1| {
                calls.fetch_add(1, Ordering::SeqCst);
                let expected = param1.get()?;
                Ok(Func::unary(move |x| Ok(Value::Bool(*x == expected))))
            }
        },
        |param1| {
            Ok(LambdaExpr::with_param("x", Ty::Str, |x| {
                x.equals(param1.expr())
            }))
        },
    );

    let spec = factory.bind("A");
    assert!(spec.is_satisfied_by(Value::str("A")).unwrap());
    assert!(!spec.is_satisfied_by(Value::str("B")).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(text(&spec), "x => x == param1");
}

#[test]
fn function_builder_with_decompiler() {
    let decompiler: DecompilerRef = Arc::new(|_: &Func| -> Result<LambdaExpr> {
        Ok(LambdaExpr::with_param("x", Ty::Str, |x| {
            x.member(&length())
        }))
    });
    let factory = ProjectionFactory::with_fn(
        FormalParam::new("unused", Ty::Int),
        Ty::Str,
        Ty::Int,
        |_| Ok(Func::unary(|x| Ok(Value::Int(x.as_str().map(|s| s.len() as i64).unwrap_or(0))))),
        decompiler,
    );

    let projection = factory.bind(0i64);
    assert_eq!(text(&projection), "x => x.length");
    assert_eq!(both(&projection, Value::str("abc")), Value::Int(3));
}

#[test]
fn runtime_binding_checks_arity() {
    let value = Value::object(concat_factory());
    let factory = as_bindable(&value).unwrap();
    assert_eq!(factory.arity(), 2);

    assert!(matches!(
        factory.bind_arguments(vec![]),
        Err(Error::ArityMismatch { expected: 2, found: 0 })
    ));

    let partial = factory.bind_arguments(vec![Argument::value("A")]).unwrap();
    assert_eq!(as_bindable(&partial).unwrap().arity(), 1);
    assert!(as_bindable(&Value::str("A")).is_none());

    let spec = as_bindable(&partial)
        .unwrap()
        .bind_arguments(vec![Argument::value("B")])
        .unwrap();
    let spec = spec.downcast_ref::<Specification>().unwrap();
    assert!(spec.is_satisfied_by(Value::str("AB")).unwrap());
}

#[test]
fn factory_signatures() {
    let factory = concat_factory();
    assert_eq!(factory.params().len(), 2);
    assert_eq!(factory.signature().unit_kind(), Some(UnitKind::SpecificationFactory));
    assert_eq!(
        Value::object(factory.clone()).ty(),
        Ty::specification_factory([Ty::Str, Ty::Str], Ty::Str)
    );
}
