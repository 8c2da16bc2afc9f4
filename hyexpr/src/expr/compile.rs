//! Compilation of lambdas into callable [`Func`] values.
//!
//! The compiled form is a tree-walking closure: the lambda is shared (`Arc`) and each call binds
//! the arguments in a small scope stack keyed by parameter identity. Nested lambdas evaluate to
//! [`Value::Func`] closures capturing the enclosing scope.
//!
//! Operator semantics ([`apply_binary`], [`apply_unary`], [`convert_value`]) are exposed so the
//! rest of the crate agrees with compiled functions on what an operator computes.
use std::sync::Arc;

use log::trace;
use smallvec::SmallVec;

use crate::{
    error::{Error, Result},
    expr::{BinaryOp, Expr, LambdaExpr, UnaryOp},
    param::Param,
    ty::Ty,
    value::{Func, Value},
};

/// Bound parameters, innermost last.
#[derive(Clone, Default)]
pub struct Scope {
    bindings: SmallVec<[(Param, Value); 4]>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, param: &Param, value: Value) {
        self.bindings.push((param.clone(), value));
    }

    pub fn lookup(&self, param: &Param) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == param)
            .map(|(_, v)| v)
    }
}

/// Compile a lambda into a function of the same arity.
pub fn compile(lambda: &LambdaExpr) -> Func {
    trace!("compiling `{lambda}`");
    closure(Arc::new(lambda.clone()), Scope::new())
}

fn closure(lambda: Arc<LambdaExpr>, captured: Scope) -> Func {
    Func::new(lambda.arity(), move |args| {
        let mut scope = captured.clone();
        for (param, arg) in lambda.params.iter().zip(args) {
            scope.bind(param, arg.clone());
        }
        eval(&lambda.body, &scope)
    })
}

/// Evaluate an expression under the given scope.
pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value> {
    match expr {
        Expr::Literal(lit) => Ok(lit.value.clone()),
        Expr::Param(p) => scope
            .lookup(p)
            .cloned()
            .ok_or_else(|| Error::UnboundParameter {
                name: p.name().to_string(),
            }),
        Expr::Member(m) => {
            let target = m.target.as_deref().map(|t| eval(t, scope)).transpose()?;
            m.member.read(target.as_ref())
        }
        Expr::Call(c) => {
            let target = c.target.as_deref().map(|t| eval(t, scope)).transpose()?;
            let args = c
                .args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>>>()?;
            c.method.invoke(target.as_ref(), &args)
        }
        Expr::Binary(b) => {
            if let Some(method) = &b.method {
                let lhs = eval(&b.lhs, scope)?;
                let rhs = eval(&b.rhs, scope)?;
                return method.invoke(None, &[lhs, rhs]);
            }
            match b.op {
                BinaryOp::AndAlso => {
                    if !eval(&b.lhs, scope)?.expect_bool("&&")? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(eval(&b.rhs, scope)?.expect_bool("&&")?))
                }
                BinaryOp::OrElse => {
                    if eval(&b.lhs, scope)?.expect_bool("||")? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(eval(&b.rhs, scope)?.expect_bool("||")?))
                }
                op => apply_binary(op, &eval(&b.lhs, scope)?, &eval(&b.rhs, scope)?),
            }
        }
        Expr::Unary(u) => {
            let operand = eval(&u.operand, scope)?;
            match &u.method {
                Some(method) => method.invoke(None, &[operand]),
                None => apply_unary(u.op, &operand, &u.ty),
            }
        }
        Expr::Lambda(l) => Ok(Value::Func(closure(Arc::new(l.clone()), scope.clone()))),
        Expr::Invoke(i) => {
            let callee = eval(&i.callee, scope)?;
            let args = i
                .args
                .iter()
                .map(|a| eval(a, scope))
                .collect::<Result<Vec<_>>>()?;
            match callee {
                Value::Func(func) => func.call(&args),
                other => Err(Error::TypeMismatch {
                    expected: "function".into(),
                    found: other.ty().to_string(),
                }),
            }
        }
        Expr::Conditional(c) => {
            if eval(&c.test, scope)?.expect_bool("?:")? {
                eval(&c.if_true, scope)
            } else {
                eval(&c.if_false, scope)
            }
        }
    }
}

fn invalid(op: impl ToString, operands: &[&Value]) -> Error {
    Error::InvalidOperands {
        op: op.to_string(),
        operands: operands
            .iter()
            .map(|v| format!("`{v}`"))
            .collect::<Vec<_>>()
            .join(" and "),
    }
}

/// Built-in semantics of a binary operator on two evaluated operands.
pub fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    use BinaryOp::*;
    use Value::*;

    let value = match (op, lhs, rhs) {
        (Equal, l, r) => Bool(l == r),
        (NotEqual, l, r) => Bool(l != r),

        (AndAlso | And, Bool(l), Bool(r)) => Bool(*l && *r),
        (OrElse | Or, Bool(l), Bool(r)) => Bool(*l || *r),
        (And, Int(l), Int(r)) => Int(l & r),
        (Or, Int(l), Int(r)) => Int(l | r),

        (Add, Str(l), r) => Str(format!("{l}{}", plain(r)).into()),
        (Add, l, Str(r)) => Str(format!("{}{r}", plain(l)).into()),

        (Add, Int(l), Int(r)) => Int(l.wrapping_add(*r)),
        (Sub, Int(l), Int(r)) => Int(l.wrapping_sub(*r)),
        (Mul, Int(l), Int(r)) => Int(l.wrapping_mul(*r)),
        (Div | Rem, Int(_), Int(0)) => return Err(invalid(op, &[lhs, rhs])),
        (Div, Int(l), Int(r)) => Int(l.wrapping_div(*r)),
        (Rem, Int(l), Int(r)) => Int(l.wrapping_rem(*r)),

        (Less, Str(l), Str(r)) => Bool(l < r),
        (LessEqual, Str(l), Str(r)) => Bool(l <= r),
        (Greater, Str(l), Str(r)) => Bool(l > r),
        (GreaterEqual, Str(l), Str(r)) => Bool(l >= r),

        (Less, Int(l), Int(r)) => Bool(l < r),
        (LessEqual, Int(l), Int(r)) => Bool(l <= r),
        (Greater, Int(l), Int(r)) => Bool(l > r),
        (GreaterEqual, Int(l), Int(r)) => Bool(l >= r),

        (_, l, r) => match (l.as_float(), r.as_float()) {
            (Some(l), Some(r)) => match op {
                Add => Float(l + r),
                Sub => Float(l - r),
                Mul => Float(l * r),
                Div => Float(l / r),
                Rem => Float(l % r),
                Less => Bool(l < r),
                LessEqual => Bool(l <= r),
                Greater => Bool(l > r),
                GreaterEqual => Bool(l >= r),
                _ => return Err(invalid(op, &[lhs, rhs])),
            },
            _ => return Err(invalid(op, &[lhs, rhs])),
        },
    };
    Ok(value)
}

// Strings concatenate without quotes.
fn plain(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Built-in semantics of a unary operator.
pub fn apply_unary(op: UnaryOp, operand: &Value, ty: &Ty) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Negate, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
        (UnaryOp::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Convert, v) => convert_value(v, ty),
        _ => Err(invalid(op, &[operand])),
    }
}

/// Built-in conversion of a value to `ty`.
pub fn convert_value(value: &Value, ty: &Ty) -> Result<Value> {
    match (value, ty) {
        (Value::Int(i), Ty::Float) => Ok(Value::Float(*i as f64)),
        (Value::Float(x), Ty::Int) => Ok(Value::Int(*x as i64)),
        (Value::Null, _) => Ok(Value::Null),
        (v, ty) if ty.accepts(&v.ty()) => Ok(v.clone()),
        (v, ty) => Err(Error::TypeMismatch {
            expected: ty.to_string(),
            found: v.ty().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::DeclaringType;

    #[test]
    fn compiled_lambda_binds_arguments_by_identity() {
        // x => y => x - y, where the inner parameter shadows by name only
        let x = Param::new("x", Ty::Int);
        let y = Param::new("x", Ty::Int);
        let inner = Expr::lambda([y.clone()], Expr::param(&x) - Expr::param(&y));
        let outer = LambdaExpr::new([x], inner);
        let f = compile(&outer);
        let g = f.call1(Value::Int(10)).unwrap();
        let g = g.as_func().unwrap();
        assert_eq!(g.call1(Value::Int(3)).unwrap(), Value::Int(7));
    }

    #[test]
    fn short_circuit_skips_failing_rhs() {
        let lambda = LambdaExpr::with_param("x", Ty::Bool, |x| {
            x.and_also(Expr::constant(1i64).div(Expr::constant(0i64)).equals(Expr::constant(1i64)))
        });
        let f = compile(&lambda);
        assert_eq!(f.call1(Value::Bool(false)).unwrap(), Value::Bool(false));
        assert!(f.call1(Value::Bool(true)).unwrap_err().is_invalid_operands());
    }

    #[test]
    fn unbound_parameter_is_reported() {
        let stray = Param::new("y", Ty::Int);
        let lambda = LambdaExpr::with_param("x", Ty::Int, |x| x + Expr::param(&stray));
        let err = compile(&lambda).call1(Value::Int(1)).unwrap_err();
        assert_eq!(err, Error::UnboundParameter { name: "y".into() });
    }

    #[test]
    fn operator_method_is_preferred() {
        let vec = DeclaringType::new("Vec2");
        let plus = vec.static_method("op_Addition", [Ty::Int, Ty::Int], Ty::Int, |args| {
            Ok(Value::Int(args[0].as_int().unwrap_or(0) * 100 + args[1].as_int().unwrap_or(0)))
        });
        let lambda = LambdaExpr::with_param("x", Ty::Int, |x| {
            Expr::binary_with(BinaryOp::Add, x, Expr::constant(2i64), &plus)
        });
        assert_eq!(compile(&lambda).call1(Value::Int(1)).unwrap(), Value::Int(102));
    }

    #[test]
    fn arithmetic_and_comparison() {
        assert_eq!(
            apply_binary(BinaryOp::Add, &Value::Int(1), &Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            apply_binary(BinaryOp::Add, &Value::str("a"), &Value::Int(1)).unwrap(),
            Value::str("a1")
        );
        assert_eq!(
            apply_binary(BinaryOp::Less, &Value::str("a"), &Value::str("b")).unwrap(),
            Value::Bool(true)
        );
        assert!(apply_binary(BinaryOp::Sub, &Value::str("a"), &Value::Int(1)).is_err());
    }
}
