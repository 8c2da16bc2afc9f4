//! Runtime values: literals held by the tree and results produced by compiled functions.
//!
//! Role
//! - [`Value`] is the dynamic value domain shared by the partial evaluator and the compiler.
//! - [`Object`] lets host types (records, unit wrappers, factories) travel inside literals; it is
//!   downcastable so passes can recover the concrete type once a subtree has been folded.
//! - [`Func`] is the compiled-function form: a shareable closure over a slice of arguments.
use std::{fmt, sync::Arc};

use downcast_rs::{DowncastSync, impl_downcast};
use strum::EnumIs;

use crate::{
    error::{Error, Result},
    member::DeclaringType,
    ty::Ty,
};

/// Host object stored inside a [`Value::Object`].
///
/// Implementors must be immutable once shared; equality defaults to identity.
pub trait Object: DowncastSync + fmt::Debug {
    /// Static type of the object, used for literal typing and capability queries.
    fn ty(&self) -> Ty;

    /// Human readable form used when printing literals.
    fn describe(&self) -> String {
        self.ty().to_string()
    }

    /// Identity comparison unless overridden.
    fn same(&self, other: &dyn Object) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn Object)
    }
}
impl_downcast!(sync Object);

pub type ObjectRef = Arc<dyn Object>;

type FuncImpl = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// Compiled function: a fixed-arity closure producing a [`Value`].
#[derive(Clone)]
pub struct Func {
    arity: usize,
    inner: Arc<FuncImpl>,
}

impl Func {
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            arity,
            inner: Arc::new(f),
        }
    }

    /// Zero-argument accessor.
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(0, move |_| f())
    }

    /// Single-argument function.
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new(1, move |args| f(&args[0]))
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Call with an argument slice; the slice length must match the arity.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if args.len() != self.arity {
            return Err(Error::ArityMismatch {
                expected: self.arity,
                found: args.len(),
            });
        }
        (self.inner)(args)
    }

    /// Convenience for single-argument functions.
    #[inline]
    pub fn call1(&self, arg: Value) -> Result<Value> {
        self.call(std::slice::from_ref(&arg))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Func) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func/{}", self.arity)
    }
}

/// Dynamic value.
#[derive(Clone, EnumIs)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<[Value]>),
    Func(Func),
    Object(ObjectRef),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn object<O: Object>(object: O) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Type inferred from the value itself.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Null => Ty::Any,
            Value::Bool(_) => Ty::Bool,
            Value::Int(_) => Ty::Int,
            Value::Float(_) => Ty::Float,
            Value::Str(_) => Ty::Str,
            Value::List(items) => Ty::list(items.first().map(Value::ty).unwrap_or(Ty::Any)),
            Value::Func(func) => Ty::func(std::iter::repeat_n(Ty::Any, func.arity()), Ty::Any),
            Value::Object(object) => object.ty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Value::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Downcast the held object to a concrete host type.
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_object().and_then(|o| o.downcast_ref::<T>())
    }

    /// Read a boolean or fail with a typed error.
    pub fn expect_bool(&self, context: &str) -> Result<bool> {
        self.as_bool().ok_or_else(|| Error::TypeMismatch {
            expected: format!("bool ({context})"),
            found: self.ty().to_string(),
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.same(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Func(func) => write!(f, "{func:?}"),
            Value::Object(object) => write!(f, "Object({object:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Func(func) => write!(f, "<func/{}>", func.arity()),
            Value::Object(object) => write!(f, "{}", object.describe()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Func> for Value {
    fn from(value: Func) -> Self {
        Value::Func(value)
    }
}

/// Plain record object: named fields under a declaring type.
///
/// Records whose declaring type is synthesized model closure containers, i.e. the storage a
/// closure uses for the locals it captured.
#[derive(Debug)]
pub struct Record {
    declaring: DeclaringType,
    fields: Vec<(Arc<str>, Value)>,
}

impl Record {
    pub fn new<N, I>(declaring: DeclaringType, fields: I) -> Self
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = (N, Value)>,
    {
        Self {
            declaring,
            fields: fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    #[inline]
    pub fn declaring(&self) -> &DeclaringType {
        &self.declaring
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }
}

impl Object for Record {
    fn ty(&self) -> Ty {
        self.declaring.ty().clone()
    }

    fn describe(&self) -> String {
        self.declaring.name().to_string()
    }
}
