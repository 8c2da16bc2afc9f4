//! Projections: pure mappings `source -> result`.
use std::{fmt, sync::Arc};

use hyexpr::{
    defensive::single_param_lambda,
    error::Result,
    expr::{LambdaExpr, compile::compile},
    rewrite::compose,
    ty::{Ty, UnitKind},
    value::{Func, Object, Value},
};

use crate::{
    unit::{Compiled, DualRepr, Unit, UnitCore, core_from_compiled, core_from_expr, debug_unit},
    utils::Lazy,
};

/// Mapping from a source value to a result, usable as a function and as a tree.
///
/// ```
/// use hyexpr::prelude::*;
/// use hyproj::prelude::*;
///
/// let len = DeclaringType::of(Ty::Str).property("length", Ty::Int, |v| {
///     Ok(Value::Int(v.as_str().map(|s| s.len() as i64).unwrap_or(0)))
/// });
/// let p1 = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| x.member(&len))).unwrap();
/// let p2 = Projection::new(LambdaExpr::with_param("x", Ty::Str, |x| {
///     p1.invoke_expr(x) + Expr::constant(1i64)
/// }))
/// .unwrap();
///
/// assert_eq!(p2.expression().unwrap().to_string(), "x => x.length + 1");
/// assert_eq!(p2.evaluate(Value::str("ab")).unwrap(), Value::Int(3));
/// ```
#[derive(Clone)]
pub struct Projection(Arc<UnitCore>);

impl Projection {
    /// From a single-parameter lambda. The function is compiled from it.
    pub fn new(expression: LambdaExpr) -> Result<Self> {
        core_from_expr(expression).map(Self::from_core)
    }

    /// From a compiled function with an optional tree; without one, the decompiler is required.
    pub fn with_fn(source: Ty, result: Ty, compiled: Compiled) -> Result<Self> {
        core_from_compiled(source, result, compiled).map(Self::from_core)
    }

    /// Alias of [`Unit::evaluate`].
    #[inline]
    pub fn project(&self, input: Value) -> Result<Value> {
        self.evaluate(input)
    }

    fn derive(source: Ty, result: Ty, repr: DualRepr) -> Self {
        Self::from_core(UnitCore::new(source, result, repr))
    }

    /// Precompose with `expression: p => source`, giving `p => result`.
    pub fn apply_to(&self, expression: LambdaExpr) -> Result<Projection> {
        let expression = single_param_lambda(expression, "expression")?;
        let source = expression.params[0].ty().clone();
        let compiled = Compiled::new(compile(&expression)).with_expression(expression);
        Ok(self.precompose(source, compiled))
    }

    /// Precompose with a compiled function.
    pub fn apply_to_fn(&self, source: Ty, compiled: Compiled) -> Result<Projection> {
        compiled.check(1)?;
        Ok(self.precompose(source, compiled))
    }

    /// Precompose with another projection.
    pub fn apply_to_projection(&self, inner: &Projection) -> Projection {
        let (outer, inner_expr, inner_fn) = (self.clone(), inner.clone(), inner.clone());
        let outer_fn = self.clone();
        Self::derive(
            inner.source().clone(),
            self.result().clone(),
            DualRepr::new(
                Lazy::new(move || compose::apply_to(&outer.expression()?, &inner_expr.expression()?)),
                Lazy::new(move || Ok(chain(inner_fn.as_function()?, outer_fn.as_function()?))),
            ),
        )
    }

    /// Postcompose with `expression: result => d`, giving `source => d`.
    pub fn to(&self, expression: LambdaExpr) -> Result<Projection> {
        let expression = single_param_lambda(expression, "expression")?;
        let result = expression.body.ty();
        let compiled = Compiled::new(compile(&expression)).with_expression(expression);
        Ok(self.postcompose(result, compiled))
    }

    /// Postcompose with a compiled function.
    pub fn to_fn(&self, result: Ty, compiled: Compiled) -> Result<Projection> {
        compiled.check(1)?;
        Ok(self.postcompose(result, compiled))
    }

    /// Postcompose with another projection.
    pub fn to_projection(&self, outer: &Projection) -> Projection {
        outer.apply_to_projection(self)
    }

    fn precompose(&self, source: Ty, compiled: Compiled) -> Projection {
        let (outer, outer_fn) = (self.clone(), self.clone());
        let inner = compiled.func.clone();
        Self::derive(
            source,
            self.result().clone(),
            DualRepr::new(
                Lazy::new(move || compose::apply_to(&outer.expression()?, &compiled.tree()?)),
                Lazy::new(move || Ok(chain(inner.clone(), outer_fn.as_function()?))),
            ),
        )
    }

    fn postcompose(&self, result: Ty, compiled: Compiled) -> Projection {
        let (inner, inner_fn) = (self.clone(), self.clone());
        let outer = compiled.func.clone();
        Self::derive(
            self.source().clone(),
            result,
            DualRepr::new(
                Lazy::new(move || compose::project_to(&inner.expression()?, &compiled.tree()?)),
                Lazy::new(move || Ok(chain(inner_fn.as_function()?, outer.clone()))),
            ),
        )
    }
}

/// `x => outer(inner(x))`.
pub(crate) fn chain(inner: Func, outer: Func) -> Func {
    Func::unary(move |x| outer.call1(inner.call1(x.clone())?))
}

impl Unit for Projection {
    const KIND: UnitKind = UnitKind::Projection;
    const EVALUATE: &'static str = "evaluate";

    #[inline]
    fn core(&self) -> &UnitCore {
        &self.0
    }

    fn from_core(core: UnitCore) -> Self {
        Self(Arc::new(core))
    }

    fn unit_ty(source: &Ty, result: &Ty) -> Ty {
        Ty::projection(source.clone(), result.clone())
    }

    fn factory_ty(params: Vec<Ty>, source: &Ty, result: &Ty) -> Ty {
        Ty::projection_factory(params, source.clone(), result.clone())
    }
}

impl Object for Projection {
    fn ty(&self) -> Ty {
        self.signature()
    }

    fn same(&self, other: &dyn Object) -> bool {
        other
            .downcast_ref::<Projection>()
            .is_some_and(|other| Arc::ptr_eq(&self.0, &other.0))
    }
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_unit(self, f)
    }
}
