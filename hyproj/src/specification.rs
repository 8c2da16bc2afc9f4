//! Specifications: predicates `source -> bool`, closed under `and`, `or` and `not`.
use std::{fmt, sync::Arc};

use hyexpr::{
    defensive::single_param_lambda,
    error::{Error, Result},
    expr::{BinaryOp, Expr, LambdaExpr, UnaryOp, compile::compile},
    member::{DeclaringType, Method},
    rewrite::compose,
    ty::{Ty, UnitKind},
    value::{Func, Object, Value},
};

use crate::{
    projection::{Projection, chain},
    unit::{
        Compiled, DualRepr, Unit, UnitCore, core_from_compiled, core_from_expr, debug_unit,
        downcast_unit,
    },
    utils::Lazy,
};

/// Names of the combinator methods declared by specification types.
pub const AND: &str = "and";
pub const OR: &str = "or";
pub const NOT: &str = "not";

/// Predicate over a source value, usable as a function and as a tree.
#[derive(Clone)]
pub struct Specification(Arc<UnitCore>);

impl Specification {
    /// From a single-parameter boolean lambda. The function is compiled from it.
    pub fn new(expression: LambdaExpr) -> Result<Self> {
        let core = core_from_expr(expression)?;
        check_predicate(&core.result)?;
        Ok(Self::from_core(core))
    }

    /// From a compiled predicate with an optional tree; without one, the decompiler is required.
    pub fn with_fn(source: Ty, compiled: Compiled) -> Result<Self> {
        core_from_compiled(source, Ty::Bool, compiled).map(Self::from_core)
    }

    /// Run the compiled predicate.
    pub fn is_satisfied_by(&self, input: Value) -> Result<bool> {
        self.evaluate(input)?.expect_bool(Self::EVALUATE)
    }

    fn derive(source: Ty, repr: DualRepr) -> Self {
        Self::from_core(UnitCore::new(source, Ty::Bool, repr))
    }

    fn check_same_source(&self, other: &Specification) -> Result<()> {
        if self.source() != other.source() {
            return Err(Error::TypeMismatch {
                expected: self.signature().to_string(),
                found: other.signature().to_string(),
            });
        }
        Ok(())
    }

    /// Both predicates hold. The function short-circuits.
    pub fn and(&self, other: &Specification) -> Result<Specification> {
        self.check_same_source(other)?;
        let (lhs, rhs) = (self.clone(), other.clone());
        let (lhs_fn, rhs_fn) = (self.clone(), other.clone());
        Ok(Self::derive(
            self.source().clone(),
            DualRepr::new(
                Lazy::new(move || compose::and(&lhs.expression()?, &rhs.expression()?)),
                Lazy::new(move || {
                    let (lhs, rhs) = (lhs_fn.as_function()?, rhs_fn.as_function()?);
                    Ok(Func::unary(move |x| {
                        Ok(Value::Bool(
                            lhs.call1(x.clone())?.expect_bool(AND)?
                                && rhs.call1(x.clone())?.expect_bool(AND)?,
                        ))
                    }))
                }),
            ),
        ))
    }

    /// Either predicate holds. The function short-circuits.
    pub fn or(&self, other: &Specification) -> Result<Specification> {
        self.check_same_source(other)?;
        let (lhs, rhs) = (self.clone(), other.clone());
        let (lhs_fn, rhs_fn) = (self.clone(), other.clone());
        Ok(Self::derive(
            self.source().clone(),
            DualRepr::new(
                Lazy::new(move || compose::or(&lhs.expression()?, &rhs.expression()?)),
                Lazy::new(move || {
                    let (lhs, rhs) = (lhs_fn.as_function()?, rhs_fn.as_function()?);
                    Ok(Func::unary(move |x| {
                        Ok(Value::Bool(
                            lhs.call1(x.clone())?.expect_bool(OR)?
                                || rhs.call1(x.clone())?.expect_bool(OR)?,
                        ))
                    }))
                }),
            ),
        ))
    }

    /// The predicate does not hold.
    pub fn not(&self) -> Specification {
        let (inner, inner_fn) = (self.clone(), self.clone());
        Self::derive(
            self.source().clone(),
            DualRepr::new(
                Lazy::new(move || compose::not(&inner.expression()?)),
                Lazy::new(move || {
                    let inner = inner_fn.as_function()?;
                    Ok(Func::unary(move |x| {
                        Ok(Value::Bool(!inner.call1(x.clone())?.expect_bool(NOT)?))
                    }))
                }),
            ),
        )
    }

    /// Precompose with `expression: p => source`, giving a predicate over `p`.
    pub fn apply_to(&self, expression: LambdaExpr) -> Result<Specification> {
        let expression = single_param_lambda(expression, "expression")?;
        let source = expression.params[0].ty().clone();
        let compiled = Compiled::new(compile(&expression)).with_expression(expression);
        Ok(self.precompose(source, compiled))
    }

    /// Precompose with a compiled function.
    pub fn apply_to_fn(&self, source: Ty, compiled: Compiled) -> Result<Specification> {
        compiled.check(1)?;
        Ok(self.precompose(source, compiled))
    }

    /// Precompose with a projection.
    pub fn apply_to_projection(&self, projection: &Projection) -> Result<Specification> {
        if projection.result() != self.source() {
            return Err(Error::TypeMismatch {
                expected: self.source().to_string(),
                found: projection.result().to_string(),
            });
        }
        let (outer, outer_fn) = (self.clone(), self.clone());
        let (inner, inner_fn) = (projection.clone(), projection.clone());
        Ok(Self::derive(
            projection.source().clone(),
            DualRepr::new(
                Lazy::new(move || compose::apply_to(&outer.expression()?, &inner.expression()?)),
                Lazy::new(move || Ok(chain(inner_fn.as_function()?, outer_fn.as_function()?))),
            ),
        ))
    }

    fn precompose(&self, source: Ty, compiled: Compiled) -> Specification {
        let (outer, outer_fn) = (self.clone(), self.clone());
        let inner = compiled.func.clone();
        Self::derive(
            source,
            DualRepr::new(
                Lazy::new(move || compose::apply_to(&outer.expression()?, &compiled.tree()?)),
                Lazy::new(move || Ok(chain(inner.clone(), outer_fn.as_function()?))),
            ),
        )
    }

    // Combinators in trees

    /// Operator method `and` of `Specification<source>`.
    pub fn and_method(source: &Ty) -> Method {
        binary_method(source, AND, |lhs, rhs| lhs.and(rhs))
    }

    /// Operator method `or` of `Specification<source>`.
    pub fn or_method(source: &Ty) -> Method {
        binary_method(source, OR, |lhs, rhs| lhs.or(rhs))
    }

    /// Operator method `not` of `Specification<source>`.
    pub fn not_method(source: &Ty) -> Method {
        let ty = Ty::specification(source.clone());
        DeclaringType::of(ty.clone()).static_method(NOT, [ty.clone()], ty, |args| {
            Ok(Value::object(downcast_unit::<Specification>(&args[0])?.not()))
        })
    }

    /// `lhs & rhs` bound to [`Specification::and_method`].
    pub fn and_expr(lhs: Expr, rhs: Expr) -> Result<Expr> {
        let method = Self::and_method(&source_of(&lhs)?);
        Ok(Expr::binary_with(BinaryOp::And, lhs, rhs, &method))
    }

    /// `lhs | rhs` bound to [`Specification::or_method`].
    pub fn or_expr(lhs: Expr, rhs: Expr) -> Result<Expr> {
        let method = Self::or_method(&source_of(&lhs)?);
        Ok(Expr::binary_with(BinaryOp::Or, lhs, rhs, &method))
    }

    /// `!operand` bound to [`Specification::not_method`].
    pub fn not_expr(operand: Expr) -> Result<Expr> {
        let method = Self::not_method(&source_of(&operand)?);
        Ok(Expr::unary_with(UnaryOp::Not, operand, &method))
    }
}

fn check_predicate(result: &Ty) -> Result<()> {
    if Ty::Bool.accepts(result) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: Ty::Bool.to_string(),
            found: result.to_string(),
        })
    }
}

fn source_of(expr: &Expr) -> Result<Ty> {
    match expr.ty() {
        Ty::Specification(source) => Ok(*source),
        other => Err(Error::TypeMismatch {
            expected: "Specification<_>".into(),
            found: other.to_string(),
        }),
    }
}

fn binary_method<F>(source: &Ty, name: &'static str, combine: F) -> Method
where
    F: Fn(&Specification, &Specification) -> Result<Specification> + Send + Sync + 'static,
{
    let ty = Ty::specification(source.clone());
    DeclaringType::of(ty.clone()).static_method(name, [ty.clone(), ty.clone()], ty, move |args| {
        let lhs = downcast_unit::<Specification>(&args[0])?;
        let rhs = downcast_unit::<Specification>(&args[1])?;
        Ok(Value::object(combine(lhs, rhs)?))
    })
}

impl Unit for Specification {
    const KIND: UnitKind = UnitKind::Specification;
    const EVALUATE: &'static str = "is_satisfied_by";

    #[inline]
    fn core(&self) -> &UnitCore {
        &self.0
    }

    fn from_core(core: UnitCore) -> Self {
        Self(Arc::new(core))
    }

    fn unit_ty(source: &Ty, _: &Ty) -> Ty {
        Ty::specification(source.clone())
    }

    fn factory_ty(params: Vec<Ty>, source: &Ty, _: &Ty) -> Ty {
        Ty::specification_factory(params, source.clone())
    }
}

impl Object for Specification {
    fn ty(&self) -> Ty {
        self.signature()
    }

    fn same(&self, other: &dyn Object) -> bool {
        other
            .downcast_ref::<Specification>()
            .is_some_and(|other| Arc::ptr_eq(&self.0, &other.0))
    }
}

impl fmt::Debug for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_unit(self, f)
    }
}
