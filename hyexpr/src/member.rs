//! Member and method descriptors referenced by expression nodes.
//!
//! A [`Member`] describes a field or property: its name, value type, declaring type and a getter
//! used both by the partial evaluator (to replay chains of reads) and by compiled functions. A
//! [`Method`] carries an invoker instead. Descriptors are cheap to clone (`Arc`).
use std::{fmt, sync::Arc};

use strum::{Display, EnumIs};

use crate::{
    error::{Error, Result},
    ty::{Ty, UnitKind},
    value::{Record, Value},
};

pub type Getter = Arc<dyn Fn(Option<&Value>) -> Result<Value> + Send + Sync>;
pub type Invoker = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync>;

struct DeclaringData {
    name: Arc<str>,
    ty: Ty,
    synthesized: bool,
}

/// Type that declares a member or method.
///
/// `synthesized` marks closure containers: types generated to hold captured locals rather than
/// types authored by the user. The captured-argument binding pass relies on this flag.
#[derive(Clone)]
pub struct DeclaringType(Arc<DeclaringData>);

impl DeclaringType {
    /// User-authored nominal type.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self(Arc::new(DeclaringData {
            ty: Ty::Named(name.clone()),
            name,
            synthesized: false,
        }))
    }

    /// Declaring type standing for an existing type (e.g. a unit type).
    pub fn of(ty: Ty) -> Self {
        Self(Arc::new(DeclaringData {
            name: ty.to_string().into(),
            ty,
            synthesized: false,
        }))
    }

    /// Synthesized closure container.
    pub fn closure(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self(Arc::new(DeclaringData {
            ty: Ty::Named(name.clone()),
            name,
            synthesized: true,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn ty(&self) -> &Ty {
        &self.0.ty
    }

    #[inline]
    pub fn is_synthesized(&self) -> bool {
        self.0.synthesized
    }

    #[inline]
    pub fn unit_kind(&self) -> Option<UnitKind> {
        self.0.ty.unit_kind()
    }

    /// Instance field stored in a [`Record`] of this type.
    pub fn field(&self, name: impl Into<Arc<str>>, ty: Ty) -> Member {
        let name: Arc<str> = name.into();
        let key = name.clone();
        let getter: Getter = Arc::new(move |target| {
            let record = target
                .and_then(|t| t.downcast_ref::<Record>())
                .ok_or_else(|| Error::MemberAccess {
                    member: key.to_string(),
                    target: target.map(|t| t.to_string()).unwrap_or_default(),
                })?;
            record
                .field(&key)
                .cloned()
                .ok_or_else(|| Error::MemberAccess {
                    member: key.to_string(),
                    target: record.declaring().name().to_string(),
                })
        });
        Member::new(self.clone(), name, ty, MemberKind::Field, false, getter)
    }

    /// Instance property computed from the target value.
    pub fn property<F>(&self, name: impl Into<Arc<str>>, ty: Ty, get: F) -> Member
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        let name: Arc<str> = name.into();
        let key = name.clone();
        let getter: Getter = Arc::new(move |target| match target {
            Some(target) => get(target),
            None => Err(Error::MemberAccess {
                member: key.to_string(),
                target: "<static>".into(),
            }),
        });
        Member::new(self.clone(), name, ty, MemberKind::Property, false, getter)
    }

    /// Static field holding a fixed value.
    pub fn static_field(&self, name: impl Into<Arc<str>>, ty: Ty, value: Value) -> Member {
        let getter: Getter = Arc::new(move |_| Ok(value.clone()));
        Member::new(self.clone(), name.into(), ty, MemberKind::Field, true, getter)
    }

    /// Static property computed on every read.
    pub fn static_property<F>(&self, name: impl Into<Arc<str>>, ty: Ty, get: F) -> Member
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        let getter: Getter = Arc::new(move |_| get());
        Member::new(
            self.clone(),
            name.into(),
            ty,
            MemberKind::Property,
            true,
            getter,
        )
    }

    /// Instance method; the invoker receives the evaluated target and arguments.
    pub fn method<F>(
        &self,
        name: impl Into<Arc<str>>,
        params: impl IntoIterator<Item = Ty>,
        ret: Ty,
        invoke: F,
    ) -> Method
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let name: Arc<str> = name.into();
        let key = name.clone();
        let invoker: Invoker = Arc::new(move |target, args| match target {
            Some(target) => invoke(target, args),
            None => Err(Error::MemberAccess {
                member: key.to_string(),
                target: "<static>".into(),
            }),
        });
        Method::new(self.clone(), name, params, ret, false, invoker)
    }

    /// Static method (also used for operator and conversion methods).
    pub fn static_method<F>(
        &self,
        name: impl Into<Arc<str>>,
        params: impl IntoIterator<Item = Ty>,
        ret: Ty,
        invoke: F,
    ) -> Method
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let invoker: Invoker = Arc::new(move |_, args| invoke(args));
        Method::new(self.clone(), name.into(), params, ret, true, invoker)
    }
}

impl PartialEq for DeclaringType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name
                && self.0.synthesized == other.0.synthesized
                && self.0.ty == other.0.ty)
    }
}

impl Eq for DeclaringType {}

impl fmt::Debug for DeclaringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthesized() {
            write!(f, "closure {}", self.name())
        } else {
            write!(f, "{}", self.name())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum MemberKind {
    Field,
    Property,
}

struct MemberData {
    name: Arc<str>,
    ty: Ty,
    declaring: DeclaringType,
    kind: MemberKind,
    is_static: bool,
    getter: Getter,
}

/// Field or property descriptor.
#[derive(Clone)]
pub struct Member(Arc<MemberData>);

impl Member {
    pub fn new(
        declaring: DeclaringType,
        name: Arc<str>,
        ty: Ty,
        kind: MemberKind,
        is_static: bool,
        getter: Getter,
    ) -> Self {
        Self(Arc::new(MemberData {
            name,
            ty,
            declaring,
            kind,
            is_static,
            getter,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type of the value read through this member.
    #[inline]
    pub fn ty(&self) -> &Ty {
        &self.0.ty
    }

    #[inline]
    pub fn declaring(&self) -> &DeclaringType {
        &self.0.declaring
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.0.kind
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Whether the declaring type is the given unit kind.
    #[inline]
    pub fn is_declared_by(&self, kind: UnitKind) -> bool {
        self.0.declaring.ty().declares(kind)
    }

    /// Read the member. Static members take no target, instance members require one.
    pub fn read(&self, target: Option<&Value>) -> Result<Value> {
        if self.0.is_static != target.is_none() {
            return Err(Error::MemberAccess {
                member: self.name().to_string(),
                target: target
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "<static>".into()),
            });
        }
        (self.0.getter)(target)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name
                && self.0.ty == other.0.ty
                && self.0.kind == other.0.kind
                && self.0.is_static == other.0.is_static
                && self.0.declaring == other.0.declaring)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?}::{}: {}",
            self.kind(),
            self.declaring(),
            self.name(),
            self.ty()
        )
    }
}

struct MethodData {
    name: Arc<str>,
    declaring: DeclaringType,
    params: Vec<Ty>,
    ret: Ty,
    is_static: bool,
    invoker: Invoker,
}

/// Method descriptor.
#[derive(Clone)]
pub struct Method(Arc<MethodData>);

impl Method {
    pub fn new(
        declaring: DeclaringType,
        name: Arc<str>,
        params: impl IntoIterator<Item = Ty>,
        ret: Ty,
        is_static: bool,
        invoker: Invoker,
    ) -> Self {
        Self(Arc::new(MethodData {
            name,
            declaring,
            params: params.into_iter().collect(),
            ret,
            is_static,
            invoker,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn declaring(&self) -> &DeclaringType {
        &self.0.declaring
    }

    #[inline]
    pub fn params(&self) -> &[Ty] {
        &self.0.params
    }

    #[inline]
    pub fn ret(&self) -> &Ty {
        &self.0.ret
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    #[inline]
    pub fn is_declared_by(&self, kind: UnitKind) -> bool {
        self.0.declaring.ty().declares(kind)
    }

    /// Invoke with evaluated target and arguments.
    pub fn invoke(&self, target: Option<&Value>, args: &[Value]) -> Result<Value> {
        if args.len() != self.0.params.len() {
            return Err(Error::ArityMismatch {
                expected: self.0.params.len(),
                found: args.len(),
            });
        }
        (self.0.invoker)(target, args)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name
                && self.0.params == other.0.params
                && self.0.ret == other.0.ret
                && self.0.is_static == other.0.is_static
                && self.0.declaring == other.0.declaring)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}::{}(", self.declaring(), self.name())?;
        for (i, p) in self.params().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.ret())
    }
}
