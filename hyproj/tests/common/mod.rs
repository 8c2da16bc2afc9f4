#![allow(dead_code)]

use hyexpr::prelude::*;
use hyproj::prelude::*;

pub fn length() -> Member {
    DeclaringType::of(Ty::Str).property("length", Ty::Int, |v| {
        Ok(Value::Int(v.as_str().map(|s| s.len() as i64).unwrap_or(0)))
    })
}

pub fn person_ty() -> DeclaringType {
    DeclaringType::new("Person")
}

pub fn name() -> Member {
    person_ty().field("name", Ty::Str)
}

pub fn nick() -> Member {
    person_ty().field("nick", Ty::Str)
}

pub fn person(name: &str, nick: &str) -> Value {
    Value::object(Record::new(
        person_ty(),
        [("name", Value::str(name)), ("nick", Value::str(nick))],
    ))
}

/// `x => x.length`
pub fn length_projection() -> Projection {
    Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| x.member(&length()))).unwrap()
}

/// `x => x == value`
pub fn is(value: &str) -> Specification {
    let value = value.to_string();
    Specification::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        x.equals(Expr::constant(value))
    }))
    .unwrap()
}

/// `x => x.length == n`
pub fn has_length(n: i64) -> Specification {
    Specification::new(LambdaExpr::with_param("x", Ty::Str, |x| {
        x.member(&length()).equals(Expr::constant(n))
    }))
    .unwrap()
}

/// `x => x == param1`
pub fn equals_factory() -> SpecificationFactory {
    SpecificationFactory::new(
        FormalParam::new("param1", Ty::Str),
        Ty::Str,
        Ty::Bool,
        |param1| {
            Ok(LambdaExpr::with_param("x", Ty::Str, |x| {
                x.equals(param1.expr())
            }))
        },
    )
}

/// `x => x == first + second`
pub fn concat_factory() -> SpecificationFactory2 {
    SpecificationFactory2::new(
        [
            FormalParam::new("first", Ty::Str),
            FormalParam::new("second", Ty::Str),
        ],
        Ty::Str,
        Ty::Bool,
        |first, second| {
            Ok(LambdaExpr::with_param("x", Ty::Str, |x| {
                x.equals(first.expr() + second.expr())
            }))
        },
    )
}

/// Text of a rewritten unit.
pub fn text<U: Unit>(unit: &U) -> String {
    unit.expression().unwrap().to_string()
}

/// Run both representations of a unit on `input` and require them to agree.
pub fn both<U: Unit>(unit: &U, input: Value) -> Value {
    let compiled = unit.evaluate(input.clone()).unwrap();
    let rewritten = compile(&unit.expression().unwrap()).call1(input).unwrap();
    assert_eq!(compiled, rewritten, "representations of `{}` disagree", text(unit));
    compiled
}
