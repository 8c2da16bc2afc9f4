//! Arguments whose value is not known when a factory is bound.
use std::fmt;

use hyexpr::{
    error::{Error, Result},
    expr::{Expr, LambdaExpr, compile::compile},
    ty::Ty,
    value::{Func, Value},
};
use strum::EnumIs;

use crate::{decompiler::decompile, unit::Compiled};

/// Zero-argument accessor bound in place of a factory argument.
///
/// Its tree (the accessor's body) replaces the closure reads of the parameter in the built
/// expression; its function is run whenever the compiled form needs the value.
#[derive(Clone)]
pub struct Deferred(Compiled);

impl Deferred {
    /// From an accessor tree `() => body`. The function is compiled from it.
    pub fn from_expr(accessor: LambdaExpr) -> Result<Self> {
        if accessor.arity() != 0 {
            return Err(Error::InvalidArgument {
                argument: "accessor",
                reason: format!("expected a parameterless lambda, got `{accessor}`"),
            });
        }
        Ok(Self::from_tree(accessor))
    }

    /// From an accessor function with an optional tree or decompiler.
    pub fn from_compiled(compiled: Compiled) -> Result<Self> {
        compiled.check(0)?;
        Ok(Self(compiled))
    }

    /// From an accessor function alone. Its tree is unavailable, so only the compiled form of
    /// units bound with it can be used.
    pub fn from_fn(accessor: Func) -> Self {
        Self(Compiled::new(accessor))
    }

    /// Accessor for a subtree that may read parameters of an enclosing lambda.
    pub(crate) fn from_subtree(body: Expr) -> Self {
        Self::from_tree(LambdaExpr::nullary(body))
    }

    fn from_tree(accessor: LambdaExpr) -> Self {
        Self(Compiled::new(compile(&accessor)).with_expression(accessor))
    }

    #[inline]
    pub fn func(&self) -> &Func {
        &self.0.func
    }

    /// Run the accessor.
    pub fn get(&self) -> Result<Value> {
        self.0.func.call(&[])
    }

    /// Body of the accessor tree, decompiling when needed.
    pub fn body(&self) -> Result<Expr> {
        let tree = match &self.0.expression {
            Some(tree) => tree.clone(),
            None => decompile(self.0.decompiler.as_ref(), &self.0.func)?,
        };
        Ok(*tree.body)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.expression {
            Some(tree) => write!(f, "Deferred(`{tree}`)"),
            None => write!(f, "Deferred({:?})", self.0.func),
        }
    }
}

/// Argument given to a factory binding.
#[derive(Clone, Debug, EnumIs)]
pub enum Argument {
    Value(Value),
    Deferred(Deferred),
}

impl Argument {
    /// Classify a runtime argument: a parameterless function passed where `ty` is not a function
    /// type is an accessor.
    pub fn from_runtime(value: &Value, ty: &Ty) -> Self {
        match value {
            Value::Func(func) if func.arity() == 0 && !ty.is_func() => {
                Argument::Deferred(Deferred::from_fn(func.clone()))
            }
            other => Argument::Value(other.clone()),
        }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Argument::Value(value.into())
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl From<Deferred> for Argument {
    fn from(value: Deferred) -> Self {
        Argument::Deferred(value)
    }
}
