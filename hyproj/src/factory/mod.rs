//! Parameterized unit factories.
//!
//! A factory turns argument values into a unit. It is created from an expression builder (the
//! function form is compiled from the built tree), or from a function builder plus either an
//! expression builder or a decompiler.
//!
//! Binding
//! - [`Factory::bind`] binds the only parameter and yields a unit; [`Factory2::bind`] binds both.
//! - [`Factory2::bind_first`] binds the first parameter and yields a one-parameter factory.
//! - The `*_deferred` variants bind a [`Deferred`] accessor instead of a value. The built tree
//!   then has every closure read of that parameter replaced by the accessor's body, while the
//!   function form reads the accessor on each call.
//!
//! Deferred binding caveat: builders that branch on the argument *value* see the accessor's
//! value at the time the tree is built, but the function form branches on each call. The two
//! forms can disagree when the accessor's value changes between the two moments.
//!
//! Trees reference factories through [`Factory::bind_expr`] and friends; the factory-invocation
//! resolver rewrites those calls into literals holding the bound unit.
use std::{fmt, marker::PhantomData, sync::Arc};

use hyexpr::{
    defensive::single_param_lambda,
    error::{Error, Result},
    expr::{Expr, LambdaExpr, compile::compile},
    member::{DeclaringType, Method},
    param::FormalParam,
    rewrite::bind_argument,
    ty::Ty,
    value::{Func, Object, Value},
};
use log::trace;

use crate::{
    decompiler::{DecompilerRef, decompile},
    projection::Projection,
    specification::Specification,
    unit::{DualRepr, Unit, UnitCore},
};

pub mod captured;
pub mod deferred;

pub use captured::Captured;
pub use deferred::{Argument, Deferred};

/// Name of the method binding every remaining parameter.
pub const BIND: &str = "bind";
/// Name of the method binding the first parameter of a two-parameter factory.
pub const BIND_FIRST: &str = "bind_first";

type ExprBuilder = Arc<dyn Fn(&[Captured]) -> Result<LambdaExpr> + Send + Sync>;
type FnBuilder = Arc<dyn Fn(&[Captured]) -> Result<Func> + Send + Sync>;

enum Builders {
    Expr(ExprBuilder),
    Fn {
        expr: Option<ExprBuilder>,
        func: FnBuilder,
        decompiler: Option<DecompilerRef>,
    },
}

impl Builders {
    fn build_expr(&self, args: &[Captured]) -> Result<LambdaExpr> {
        let expression = match self {
            Builders::Expr(build) | Builders::Fn {
                expr: Some(build), ..
            } => build(args)?,
            Builders::Fn {
                func, decompiler, ..
            } => decompile(decompiler.as_ref(), &func(args)?)?,
        };
        single_param_lambda(expression, "expression")
    }

    fn build_fn(&self, args: &[Captured]) -> Result<Func> {
        match self {
            Builders::Expr(build) => Ok(compile(&build(args)?)),
            Builders::Fn { func, .. } => func(args),
        }
    }
}

/// Builders, declared parameters and the arguments bound so far (in parameter order).
struct FactoryCore {
    builders: Arc<Builders>,
    params: Arc<[FormalParam]>,
    bound: Vec<Argument>,
    source: Ty,
    result: Ty,
}

impl FactoryCore {
    fn new(builders: Builders, params: Vec<FormalParam>, source: Ty, result: Ty) -> Self {
        Self {
            builders: Arc::new(builders),
            params: params.into(),
            bound: Vec::new(),
            source,
            result,
        }
    }

    fn remaining(&self) -> &[FormalParam] {
        &self.params[self.bound.len()..]
    }

    fn remaining_tys(&self) -> Vec<Ty> {
        self.remaining().iter().map(|p| p.ty.clone()).collect()
    }

    fn append(&self, args: Vec<Argument>) -> FactoryCore {
        trace!(
            "binding {} of {} remaining argument(s)",
            args.len(),
            self.remaining().len()
        );
        let mut bound = self.bound.clone();
        bound.extend(args);
        FactoryCore {
            builders: self.builders.clone(),
            params: self.params.clone(),
            bound,
            source: self.source.clone(),
            result: self.result.clone(),
        }
    }

    /// Unit for a fully bound core.
    fn realize<U: Unit>(&self) -> U {
        let bindings: Arc<[(FormalParam, Argument)]> = self
            .params
            .iter()
            .cloned()
            .zip(self.bound.iter().cloned())
            .collect();
        let deferred = bindings.iter().any(|(_, a)| a.is_deferred());

        let raw = {
            let (builders, bindings) = (self.builders.clone(), bindings.clone());
            move || {
                let captured: Vec<Captured> = bindings
                    .iter()
                    .map(|(param, argument)| match argument {
                        Argument::Value(value) => Captured::value(param.clone(), value.clone()),
                        Argument::Deferred(accessor) => {
                            Captured::accessor(param.clone(), accessor.func().clone())
                        }
                    })
                    .collect();
                let mut expression = builders.build_expr(&captured)?;
                for (param, argument) in bindings.iter() {
                    if let Argument::Deferred(accessor) = argument {
                        trace!("binding deferred `{param}` in `{expression}`");
                        let body = bind_argument(&expression.body, param, accessor.body()?)?;
                        expression.body = Box::new(body);
                    }
                }
                Ok(expression)
            }
        };

        let function = {
            let builders = self.builders.clone();
            move || {
                if !deferred {
                    return builders.build_fn(&resolved(&bindings)?);
                }
                let (builders, bindings) = (builders.clone(), bindings.clone());
                Ok(Func::unary(move |x| {
                    builders.build_fn(&resolved(&bindings)?)?.call1(x.clone())
                }))
            }
        };

        U::from_core(UnitCore::new(
            self.source.clone(),
            self.result.clone(),
            DualRepr::produced(raw, function),
        ))
    }
}

/// Arguments with every accessor read.
fn resolved(bindings: &[(FormalParam, Argument)]) -> Result<Vec<Captured>> {
    bindings
        .iter()
        .map(|(param, argument)| {
            let value = match argument {
                Argument::Value(value) => value.clone(),
                Argument::Deferred(accessor) => accessor.get()?,
            };
            Ok(Captured::value(param.clone(), value))
        })
        .collect()
}

/// Factory operations reachable without knowing the unit kind.
pub trait Bind: Object {
    /// Number of parameters still unbound.
    fn arity(&self) -> usize;

    /// Bind leading parameters. Binding all of them yields a unit, fewer a smaller factory.
    fn bind_arguments(&self, args: Vec<Argument>) -> Result<Value>;
}

/// View a value as a factory of any kind and arity.
pub fn as_bindable(value: &Value) -> Option<&dyn Bind> {
    let object = value.as_object()?;
    if let Some(factory) = object.downcast_ref::<ProjectionFactory>() {
        return Some(factory);
    }
    if let Some(factory) = object.downcast_ref::<ProjectionFactory2>() {
        return Some(factory);
    }
    if let Some(factory) = object.downcast_ref::<SpecificationFactory>() {
        return Some(factory);
    }
    if let Some(factory) = object.downcast_ref::<SpecificationFactory2>() {
        return Some(factory);
    }
    None
}

/// Binding method declared by a factory type; its invoker binds at run time.
fn binding_method(factory_ty: Ty, name: &'static str, params: Vec<Ty>, ret: Ty) -> Method {
    let tys = params.clone();
    DeclaringType::of(factory_ty).method(name, params, ret, move |target, args| {
        let factory = as_bindable(target).ok_or_else(|| Error::TypeMismatch {
            expected: "factory".into(),
            found: target.ty().to_string(),
        })?;
        let args = args
            .iter()
            .zip(&tys)
            .map(|(value, ty)| Argument::from_runtime(value, ty))
            .collect();
        factory.bind_arguments(args)
    })
}

fn check_arity(expected: usize, found: usize) -> Result<()> {
    if found == 0 || found > expected {
        return Err(Error::ArityMismatch { expected, found });
    }
    Ok(())
}

/// One-parameter factory.
pub struct Factory<U> {
    core: Arc<FactoryCore>,
    unit: PhantomData<fn() -> U>,
}

/// Two-parameter factory.
pub struct Factory2<U> {
    core: Arc<FactoryCore>,
    unit: PhantomData<fn() -> U>,
}

pub type ProjectionFactory = Factory<Projection>;
pub type ProjectionFactory2 = Factory2<Projection>;
pub type SpecificationFactory = Factory<Specification>;
pub type SpecificationFactory2 = Factory2<Specification>;

impl<U> Clone for Factory<U> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            unit: PhantomData,
        }
    }
}

impl<U> Clone for Factory2<U> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            unit: PhantomData,
        }
    }
}

impl<U: Unit> Factory<U> {
    fn from_core(core: FactoryCore) -> Self {
        Self {
            core: Arc::new(core),
            unit: PhantomData,
        }
    }

    /// From an expression builder; the function form compiles each built tree.
    pub fn new<B>(param: FormalParam, source: Ty, result: Ty, build: B) -> Self
    where
        B: Fn(&Captured) -> Result<LambdaExpr> + Send + Sync + 'static,
    {
        let build: ExprBuilder = Arc::new(move |args| build(&args[0]));
        Self::from_core(FactoryCore::new(
            Builders::Expr(build),
            vec![param],
            source,
            result,
        ))
    }

    /// From a function builder and an expression builder.
    pub fn with_fns<F, B>(param: FormalParam, source: Ty, result: Ty, func: F, build: B) -> Self
    where
        F: Fn(&Captured) -> Result<Func> + Send + Sync + 'static,
        B: Fn(&Captured) -> Result<LambdaExpr> + Send + Sync + 'static,
    {
        let func: FnBuilder = Arc::new(move |args| func(&args[0]));
        let build: ExprBuilder = Arc::new(move |args| build(&args[0]));
        Self::from_core(FactoryCore::new(
            Builders::Fn {
                expr: Some(build),
                func,
                decompiler: None,
            },
            vec![param],
            source,
            result,
        ))
    }

    /// From a function builder; trees are decompiled from the built functions.
    pub fn with_fn<F>(
        param: FormalParam,
        source: Ty,
        result: Ty,
        func: F,
        decompiler: DecompilerRef,
    ) -> Self
    where
        F: Fn(&Captured) -> Result<Func> + Send + Sync + 'static,
    {
        let func: FnBuilder = Arc::new(move |args| func(&args[0]));
        Self::from_core(FactoryCore::new(
            Builders::Fn {
                expr: None,
                func,
                decompiler: Some(decompiler),
            },
            vec![param],
            source,
            result,
        ))
    }

    /// The parameter still to bind.
    pub fn param(&self) -> &FormalParam {
        &self.core.remaining()[0]
    }

    pub fn source(&self) -> &Ty {
        &self.core.source
    }

    pub fn result(&self) -> &Ty {
        &self.core.result
    }

    pub fn signature(&self) -> Ty {
        U::factory_ty(self.core.remaining_tys(), &self.core.source, &self.core.result)
    }

    /// Unit for `value`.
    pub fn bind(&self, value: impl Into<Value>) -> U {
        self.apply(Argument::Value(value.into()))
    }

    /// Unit whose argument is read through `accessor`.
    pub fn bind_deferred(&self, accessor: Deferred) -> U {
        self.apply(Argument::Deferred(accessor))
    }

    pub fn apply(&self, argument: Argument) -> U {
        self.core.append(vec![argument]).realize()
    }

    /// Literal holding this factory.
    pub fn literal(&self) -> Expr {
        Expr::literal(Value::object(self.clone()), self.signature())
    }

    /// Descriptor of [`BIND`] on this factory's type.
    pub fn bind_method(&self) -> Method {
        binding_method(
            self.signature(),
            BIND,
            self.core.remaining_tys(),
            U::unit_ty(&self.core.source, &self.core.result),
        )
    }

    /// `factory.bind(arg)`.
    pub fn bind_expr(&self, arg: Expr) -> Expr {
        self.literal().call(&self.bind_method(), [arg])
    }
}

impl<U: Unit> Factory2<U> {
    fn from_core(core: FactoryCore) -> Self {
        Self {
            core: Arc::new(core),
            unit: PhantomData,
        }
    }

    /// From an expression builder; the function form compiles each built tree.
    pub fn new<B>(params: [FormalParam; 2], source: Ty, result: Ty, build: B) -> Self
    where
        B: Fn(&Captured, &Captured) -> Result<LambdaExpr> + Send + Sync + 'static,
    {
        let build: ExprBuilder = Arc::new(move |args| build(&args[0], &args[1]));
        Self::from_core(FactoryCore::new(
            Builders::Expr(build),
            params.into(),
            source,
            result,
        ))
    }

    /// From a function builder and an expression builder.
    pub fn with_fns<F, B>(
        params: [FormalParam; 2],
        source: Ty,
        result: Ty,
        func: F,
        build: B,
    ) -> Self
    where
        F: Fn(&Captured, &Captured) -> Result<Func> + Send + Sync + 'static,
        B: Fn(&Captured, &Captured) -> Result<LambdaExpr> + Send + Sync + 'static,
    {
        let func: FnBuilder = Arc::new(move |args| func(&args[0], &args[1]));
        let build: ExprBuilder = Arc::new(move |args| build(&args[0], &args[1]));
        Self::from_core(FactoryCore::new(
            Builders::Fn {
                expr: Some(build),
                func,
                decompiler: None,
            },
            params.into(),
            source,
            result,
        ))
    }

    /// From a function builder; trees are decompiled from the built functions.
    pub fn with_fn<F>(
        params: [FormalParam; 2],
        source: Ty,
        result: Ty,
        func: F,
        decompiler: DecompilerRef,
    ) -> Self
    where
        F: Fn(&Captured, &Captured) -> Result<Func> + Send + Sync + 'static,
    {
        let func: FnBuilder = Arc::new(move |args| func(&args[0], &args[1]));
        Self::from_core(FactoryCore::new(
            Builders::Fn {
                expr: None,
                func,
                decompiler: Some(decompiler),
            },
            params.into(),
            source,
            result,
        ))
    }

    pub fn params(&self) -> &[FormalParam] {
        self.core.remaining()
    }

    pub fn source(&self) -> &Ty {
        &self.core.source
    }

    pub fn result(&self) -> &Ty {
        &self.core.result
    }

    pub fn signature(&self) -> Ty {
        U::factory_ty(self.core.remaining_tys(), &self.core.source, &self.core.result)
    }

    /// Unit for both values.
    pub fn bind(&self, first: impl Into<Value>, second: impl Into<Value>) -> U {
        self.apply(
            Argument::Value(first.into()),
            Argument::Value(second.into()),
        )
    }

    /// Unit whose arguments are both read through accessors.
    pub fn bind_deferred(&self, first: Deferred, second: Deferred) -> U {
        self.apply(Argument::Deferred(first), Argument::Deferred(second))
    }

    /// Unit for any mix of values and accessors.
    pub fn apply(&self, first: Argument, second: Argument) -> U {
        self.core.append(vec![first, second]).realize()
    }

    /// One-parameter factory with the first parameter bound to `value`.
    pub fn bind_first(&self, value: impl Into<Value>) -> Factory<U> {
        self.apply_first(Argument::Value(value.into()))
    }

    /// One-parameter factory with the first parameter read through `accessor`.
    pub fn bind_first_deferred(&self, accessor: Deferred) -> Factory<U> {
        self.apply_first(Argument::Deferred(accessor))
    }

    pub fn apply_first(&self, argument: Argument) -> Factory<U> {
        Factory::from_core(self.core.append(vec![argument]))
    }

    /// Literal holding this factory.
    pub fn literal(&self) -> Expr {
        Expr::literal(Value::object(self.clone()), self.signature())
    }

    /// Descriptor of [`BIND`] on this factory's type.
    pub fn bind_method(&self) -> Method {
        binding_method(
            self.signature(),
            BIND,
            self.core.remaining_tys(),
            U::unit_ty(&self.core.source, &self.core.result),
        )
    }

    /// Descriptor of [`BIND_FIRST`] on this factory's type.
    pub fn bind_first_method(&self) -> Method {
        let remaining = self.core.remaining_tys();
        let rest = remaining[1..].to_vec();
        binding_method(
            self.signature(),
            BIND_FIRST,
            remaining[..1].to_vec(),
            U::factory_ty(rest, &self.core.source, &self.core.result),
        )
    }

    /// `factory.bind(first, second)`.
    pub fn bind_expr(&self, first: Expr, second: Expr) -> Expr {
        self.literal().call(&self.bind_method(), [first, second])
    }

    /// `factory.bind_first(first)`.
    pub fn bind_first_expr(&self, first: Expr) -> Expr {
        self.literal().call(&self.bind_first_method(), [first])
    }
}

impl<U: Unit> Bind for Factory<U> {
    fn arity(&self) -> usize {
        self.core.remaining().len()
    }

    fn bind_arguments(&self, args: Vec<Argument>) -> Result<Value> {
        check_arity(1, args.len())?;
        let core = self.core.append(args);
        Ok(Value::object(core.realize::<U>()))
    }
}

impl<U: Unit> Bind for Factory2<U> {
    fn arity(&self) -> usize {
        self.core.remaining().len()
    }

    fn bind_arguments(&self, args: Vec<Argument>) -> Result<Value> {
        check_arity(2, args.len())?;
        let core = self.core.append(args);
        if core.remaining().is_empty() {
            Ok(Value::object(core.realize::<U>()))
        } else {
            Ok(Value::object(Factory::<U>::from_core(core)))
        }
    }
}

impl<U: Unit> Object for Factory<U> {
    fn ty(&self) -> Ty {
        self.signature()
    }

    fn same(&self, other: &dyn Object) -> bool {
        other
            .downcast_ref::<Factory<U>>()
            .is_some_and(|other| Arc::ptr_eq(&self.core, &other.core))
    }
}

impl<U: Unit> Object for Factory2<U> {
    fn ty(&self) -> Ty {
        self.signature()
    }

    fn same(&self, other: &dyn Object) -> bool {
        other
            .downcast_ref::<Factory2<U>>()
            .is_some_and(|other| Arc::ptr_eq(&self.core, &other.core))
    }
}

impl<U: Unit> fmt::Debug for Factory<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}

impl<U: Unit> fmt::Debug for Factory2<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}
