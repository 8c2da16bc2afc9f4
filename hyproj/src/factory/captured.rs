//! Arguments handed to factory builders.
//!
//! A builder receives each bound argument as a [`Captured`]: the value itself and the tree a
//! closure would use to read it, i.e. a field read on a synthesized closure container. Trees
//! built from [`Captured::expr`] therefore look exactly like closures capturing the factory
//! parameter, which is what deferred binding later rewrites.
use std::fmt;

use hyexpr::{
    error::Result,
    expr::Expr,
    member::DeclaringType,
    param::FormalParam,
    value::{Func, Record, Value},
};
use strum::EnumIs;

#[derive(Clone, EnumIs)]
enum Source {
    Value(Value),
    /// Read through an accessor each time the value is needed.
    Accessor(Func),
}

/// One factory argument as seen by a builder.
#[derive(Clone)]
pub struct Captured {
    param: FormalParam,
    source: Source,
}

impl Captured {
    pub(crate) fn value(param: FormalParam, value: Value) -> Self {
        Self {
            param,
            source: Source::Value(value),
        }
    }

    pub(crate) fn accessor(param: FormalParam, accessor: Func) -> Self {
        Self {
            param,
            source: Source::Accessor(accessor),
        }
    }

    /// Formal parameter this argument is bound to.
    #[inline]
    pub fn param(&self) -> &FormalParam {
        &self.param
    }

    /// Whether the argument is read through an accessor rather than known up front.
    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.source.is_accessor()
    }

    /// Current value. For deferred arguments this runs the accessor, which fails when it reads
    /// parameters that are only bound later.
    pub fn get(&self) -> Result<Value> {
        match &self.source {
            Source::Value(value) => Ok(value.clone()),
            Source::Accessor(accessor) => accessor.call(&[]),
        }
    }

    /// Closure read of the argument.
    pub fn expr(&self) -> Expr {
        let container = DeclaringType::closure(format!("<closure>{}", self.param.name));
        let field = container.field(self.param.name.clone(), self.param.ty.clone());
        let stored = match &self.source {
            Source::Value(value) => value.clone(),
            Source::Accessor(_) => Value::Null,
        };
        let record = Record::new(container.clone(), [(self.param.name.clone(), stored)]);
        Expr::literal(Value::object(record), container.ty().clone()).member(&field)
    }
}

impl fmt::Debug for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Value(value) => write!(f, "Captured({} = {value})", self.param),
            Source::Accessor(_) => write!(f, "Captured({} = <deferred>)", self.param),
        }
    }
}

#[cfg(test)]
mod tests {
    use hyexpr::{rewrite::bind_argument, ty::Ty};

    use super::*;

    #[test]
    fn closure_read_prints_parameter_name_and_folds() {
        let captured = Captured::value(FormalParam::new("param1", Ty::Str), Value::str("A"));
        let read = captured.expr();
        assert_eq!(read.to_string(), "param1");
        assert_eq!(
            hyexpr::rewrite::evaluate(&read).unwrap(),
            Value::str("A")
        );
    }

    #[test]
    fn closure_read_is_replaced_by_binding() {
        let param = FormalParam::new("p", Ty::Int);
        let captured = Captured::accessor(param.clone(), Func::nullary(|| Ok(Value::Int(1))));
        let tree = captured.expr() + Expr::constant(1i64);
        let bound = bind_argument(&tree, &param, Expr::constant(41i64)).unwrap();
        assert_eq!(bound.to_string(), "41 + 1");
        assert_eq!(captured.get().unwrap(), Value::Int(1));
    }
}
