//! Units: values that exist both as a tree and as a compiled function.
//!
//! A unit owns a [`DualRepr`], a pair of publish-once lazies:
//! - the expression, a single-parameter lambda already run through the unit rewriter, so it holds
//!   no reference to any unit wrapper once forced;
//! - the compiled function, taken as supplied or compiled from the *pre-rewrite* tree.
//!
//! Both forms must agree on every input. This is stated, not enforced.
//!
//! The [`Unit`] trait carries everything projections and specifications share: accessors, the
//! member and method descriptors trees use to reference a unit, and the builders producing
//! such references. Concrete units are cheap to clone (`Arc`).
use std::{fmt, sync::Arc};

use hyexpr::{
    defensive::single_param_lambda,
    error::{Error, Result},
    expr::{Expr, LambdaExpr, compile::compile},
    member::{DeclaringType, Member, Method},
    ty::{Ty, UnitKind},
    rewrite::try_evaluate,
    value::{Func, Object, Value},
};
use log::debug;

use crate::{
    decompiler::{DecompilerRef, decompile},
    rewrite,
    utils::Lazy,
};

/// Name of the conversion method turning a unit into its compiled function.
pub const TO_FUNCTION: &str = "to_function";

/// A compiled function with an optional tree form.
///
/// When `expression` is absent the tree is reconstructed on demand by `decompiler`.
#[derive(Clone)]
pub struct Compiled {
    pub func: Func,
    pub expression: Option<LambdaExpr>,
    pub decompiler: Option<DecompilerRef>,
}

impl Compiled {
    pub fn new(func: Func) -> Self {
        Self {
            func,
            expression: None,
            decompiler: None,
        }
    }

    pub fn with_expression(mut self, expression: LambdaExpr) -> Self {
        self.expression = Some(expression);
        self
    }

    pub fn with_decompiler(mut self, decompiler: DecompilerRef) -> Self {
        self.decompiler = Some(decompiler);
        self
    }

    /// Tree form, decompiling the function when no expression was supplied.
    pub fn tree(&self) -> Result<LambdaExpr> {
        match &self.expression {
            Some(expression) => Ok(expression.clone()),
            None => decompile(self.decompiler.as_ref(), &self.func),
        }
    }

    /// Reject a function whose tree could never be produced, or whose arity is wrong.
    pub(crate) fn check(&self, arity: usize) -> Result<()> {
        if self.func.arity() != arity {
            return Err(Error::InvalidArgument {
                argument: "func",
                reason: format!("expected arity {arity}, got {}", self.func.arity()),
            });
        }
        match &self.expression {
            Some(expression) if expression.arity() != arity => Err(Error::InvalidArgument {
                argument: "expression",
                reason: format!(
                    "expected {arity} parameter(s), got {} in `{expression}`",
                    expression.arity()
                ),
            }),
            Some(_) => Ok(()),
            None if self.decompiler.is_none() => Err(Error::InvalidArgument {
                argument: "expression",
                reason: "required when no decompiler is given".into(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiled")
            .field("func", &self.func)
            .field("expression", &self.expression.as_ref().map(|e| e.to_string()))
            .field("decompiler", &self.decompiler.is_some())
            .finish()
    }
}

/// Memoized tree and compiled function of one unit.
pub struct DualRepr {
    expression: Lazy<LambdaExpr>,
    function: Lazy<Func>,
}

impl DualRepr {
    /// Pair two lazies as is. The expression lazy must yield a rewritten tree.
    pub fn new(expression: Lazy<LambdaExpr>, function: Lazy<Func>) -> Self {
        Self {
            expression,
            function,
        }
    }

    /// From a tree: the expression is the rewritten tree, the function compiles the original.
    pub fn from_expr(raw: LambdaExpr) -> Self {
        let raw = Arc::new(raw);
        Self::new(
            Lazy::new({
                let raw = raw.clone();
                move || rewrite::rewrite_lambda(&raw)
            }),
            Lazy::new(move || Ok(compile(&raw))),
        )
    }

    /// From a compiled function; the tree is the supplied one or a decompiled one, rewritten.
    pub fn from_compiled(compiled: Compiled) -> Self {
        let func = compiled.func.clone();
        Self::new(
            Lazy::new(move || rewrite::rewrite_lambda(&compiled.tree()?)),
            Lazy::ready(func),
        )
    }

    /// From producers of a raw tree and of a function; the tree is rewritten once produced.
    pub fn produced<E, F>(raw: E, function: F) -> Self
    where
        E: Fn() -> Result<LambdaExpr> + Send + Sync + 'static,
        F: Fn() -> Result<Func> + Send + Sync + 'static,
    {
        Self::new(
            Lazy::new(move || rewrite::rewrite_lambda(&raw()?)),
            Lazy::new(function),
        )
    }

    pub fn expression(&self) -> Result<&LambdaExpr> {
        let first = !self.expression.is_ready();
        let expression = self.expression.force()?;
        if first {
            debug!("materialized expression `{expression}`");
        }
        Ok(expression)
    }

    pub fn function(&self) -> Result<&Func> {
        let first = !self.function.is_ready();
        let function = self.function.force()?;
        if first {
            debug!("materialized function of arity {}", function.arity());
        }
        Ok(function)
    }

    /// Expression if already materialized.
    pub fn peek_expression(&self) -> Option<&LambdaExpr> {
        self.expression.get()
    }
}

/// State shared by every unit kind.
pub struct UnitCore {
    pub source: Ty,
    pub result: Ty,
    pub repr: DualRepr,
}

impl UnitCore {
    pub fn new(source: Ty, result: Ty, repr: DualRepr) -> Self {
        Self {
            source,
            result,
            repr,
        }
    }
}

/// Downcast a value to a unit of kind `U`.
pub fn downcast_unit<U: Unit>(value: &Value) -> Result<&U> {
    value.downcast_ref::<U>().ok_or_else(|| Error::TypeMismatch {
        expected: U::KIND.to_string(),
        found: value.ty().to_string(),
    })
}

/// Lambda of a node that folds to a unit of kind `U`, or `None` when the node does not fold.
pub fn fold_unit<U: Unit>(expr: &Expr) -> Result<Option<LambdaExpr>> {
    match try_evaluate(expr)? {
        None => Ok(None),
        Some(Value::Null) => Err(Error::NullValue {
            expr: expr.to_string(),
        }),
        Some(value) => downcast_unit::<U>(&value)?.expression().map(Some),
    }
}

/// Behavior shared by projections and specifications.
pub trait Unit: Object + Clone {
    const KIND: UnitKind;
    /// Name of the evaluation member and method.
    const EVALUATE: &'static str;

    fn core(&self) -> &UnitCore;

    fn from_core(core: UnitCore) -> Self;

    /// Unit type for the given source and result.
    fn unit_ty(source: &Ty, result: &Ty) -> Ty;

    /// Type of a factory producing this kind of unit from `params`.
    fn factory_ty(params: Vec<Ty>, source: &Ty, result: &Ty) -> Ty;

    #[inline]
    fn source(&self) -> &Ty {
        &self.core().source
    }

    #[inline]
    fn result(&self) -> &Ty {
        &self.core().result
    }

    fn signature(&self) -> Ty {
        Self::unit_ty(self.source(), self.result())
    }

    /// Rewritten single-parameter lambda.
    fn expression(&self) -> Result<LambdaExpr> {
        self.core().repr.expression().cloned()
    }

    /// Rewritten tree as an expression node.
    fn as_ast(&self) -> Result<Expr> {
        self.expression().map(Expr::Lambda)
    }

    fn as_function(&self) -> Result<Func> {
        self.core().repr.function().cloned()
    }

    /// Run the compiled function.
    fn evaluate(&self, input: Value) -> Result<Value> {
        self.core().repr.function()?.call1(input)
    }

    // Tree references

    /// Literal holding this unit.
    fn literal(&self) -> Expr {
        Expr::literal(Value::object(self.clone()), self.signature())
    }

    /// `unit.evaluate` read then invoked: `unit.evaluate(arg)` through the member.
    fn invoke_expr(&self, arg: Expr) -> Expr {
        let member = Self::evaluate_member(self.source(), self.result());
        self.literal().member(&member).invoke([arg])
    }

    /// `unit.evaluate(arg)` as a direct method call.
    fn call_expr(&self, arg: Expr) -> Expr {
        let method = Self::evaluate_method(self.source(), self.result());
        self.literal().call(&method, [arg])
    }

    /// Bare reference to the evaluation member.
    fn function_expr(&self) -> Expr {
        let member = Self::evaluate_member(self.source(), self.result());
        self.literal().member(&member)
    }

    /// Conversion of the unit to its function type.
    fn convert_expr(&self) -> Expr {
        let method = Self::to_function_method(self.source(), self.result());
        let ty = Ty::func([self.source().clone()], self.result().clone());
        Expr::convert(self.literal(), ty, Some(&method))
    }

    // Descriptors

    /// Member reading the compiled function of a unit.
    fn evaluate_member(source: &Ty, result: &Ty) -> Member {
        let declaring = DeclaringType::of(Self::unit_ty(source, result));
        let ty = Ty::func([source.clone()], result.clone());
        declaring.property(Self::EVALUATE, ty, |target| {
            Ok(Value::Func(downcast_unit::<Self>(target)?.as_function()?))
        })
    }

    /// Method running a unit on one argument.
    fn evaluate_method(source: &Ty, result: &Ty) -> Method {
        let declaring = DeclaringType::of(Self::unit_ty(source, result));
        declaring.method(
            Self::EVALUATE,
            [source.clone()],
            result.clone(),
            |target, args| downcast_unit::<Self>(target)?.evaluate(args[0].clone()),
        )
    }

    /// Conversion method from a unit to its compiled function.
    fn to_function_method(source: &Ty, result: &Ty) -> Method {
        let unit_ty = Self::unit_ty(source, result);
        let declaring = DeclaringType::of(unit_ty.clone());
        let ty = Ty::func([source.clone()], result.clone());
        declaring.static_method(TO_FUNCTION, [unit_ty], ty, |args| {
            Ok(Value::Func(downcast_unit::<Self>(&args[0])?.as_function()?))
        })
    }
}

/// Build the core of a unit from a raw tree.
pub(crate) fn core_from_expr(expression: LambdaExpr) -> Result<UnitCore> {
    let expression = single_param_lambda(expression, "expression")?;
    let source = expression.params[0].ty().clone();
    let result = expression.body.ty();
    Ok(UnitCore::new(source, result, DualRepr::from_expr(expression)))
}

/// Build the core of a unit from a compiled function.
pub(crate) fn core_from_compiled(source: Ty, result: Ty, compiled: Compiled) -> Result<UnitCore> {
    compiled.check(1)?;
    Ok(UnitCore::new(source, result, DualRepr::from_compiled(compiled)))
}

/// Shared `Debug` rendering: the signature plus the expression once materialized.
pub(crate) fn debug_unit<U: Unit>(unit: &U, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match unit.core().repr.peek_expression() {
        Some(expression) => write!(f, "{}(`{expression}`)", unit.signature()),
        None => write!(f, "{}(<pending>)", unit.signature()),
    }
}
