//! Static types carried by expression nodes.
//!
//! Role
//! - Every node of an [`Expr`](crate::expr::Expr) has a static [`Ty`]; rewriting passes use it to
//!   decide whether a subtree denotes one of the composable unit wrappers.
//! - Unit detection is a capability query on the type tag ([`Ty::unit_kind`]) rather than any
//!   form of runtime type introspection.
use std::{fmt, sync::Arc};

use strum::{Display, EnumIs};

/// Kind of composable unit a type (or a member's declaring type) stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum UnitKind {
    /// A mapping `source -> result`.
    Projection,
    /// A predicate `source -> bool`.
    Specification,
    /// A parameterized projection generator.
    ProjectionFactory,
    /// A parameterized specification generator.
    SpecificationFactory,
}

impl UnitKind {
    /// Whether this kind denotes a factory rather than a concrete unit.
    #[inline]
    pub fn is_factory(self) -> bool {
        matches!(
            self,
            UnitKind::ProjectionFactory | UnitKind::SpecificationFactory
        )
    }
}

/// Static type of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum Ty {
    /// Type of expressions that do not produce a meaningful value.
    Void,
    Bool,
    Int,
    Float,
    Str,
    /// Dynamically typed slot; accepts any value.
    Any,
    /// Homogeneous list.
    List(Box<Ty>),
    /// Nominal object type (user records, closure containers, host objects).
    Named(Arc<str>),
    /// Compiled function taking `params` and returning the second component.
    Func(Vec<Ty>, Box<Ty>),
    /// `Projection<source, result>`.
    Projection(Box<Ty>, Box<Ty>),
    /// `Specification<source>`.
    Specification(Box<Ty>),
    /// Factory producing `Projection<source, result>` from `params`.
    ProjectionFactory {
        params: Vec<Ty>,
        source: Box<Ty>,
        result: Box<Ty>,
    },
    /// Factory producing `Specification<source>` from `params`.
    SpecificationFactory { params: Vec<Ty>, source: Box<Ty> },
}

impl Ty {
    /// Nominal type with the given name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Ty::Named(name.into())
    }

    pub fn list(element: Ty) -> Self {
        Ty::List(Box::new(element))
    }

    pub fn func(params: impl IntoIterator<Item = Ty>, ret: Ty) -> Self {
        Ty::Func(params.into_iter().collect(), Box::new(ret))
    }

    pub fn projection(source: Ty, result: Ty) -> Self {
        Ty::Projection(Box::new(source), Box::new(result))
    }

    pub fn specification(source: Ty) -> Self {
        Ty::Specification(Box::new(source))
    }

    pub fn projection_factory(params: impl IntoIterator<Item = Ty>, source: Ty, result: Ty) -> Self {
        Ty::ProjectionFactory {
            params: params.into_iter().collect(),
            source: Box::new(source),
            result: Box::new(result),
        }
    }

    pub fn specification_factory(params: impl IntoIterator<Item = Ty>, source: Ty) -> Self {
        Ty::SpecificationFactory {
            params: params.into_iter().collect(),
            source: Box::new(source),
        }
    }

    /// Capability query: which unit (if any) this type denotes.
    #[inline]
    pub fn unit_kind(&self) -> Option<UnitKind> {
        match self {
            Ty::Projection(..) => Some(UnitKind::Projection),
            Ty::Specification(..) => Some(UnitKind::Specification),
            Ty::ProjectionFactory { .. } => Some(UnitKind::ProjectionFactory),
            Ty::SpecificationFactory { .. } => Some(UnitKind::SpecificationFactory),
            _ => None,
        }
    }

    /// Shorthand for `self.unit_kind() == Some(kind)`.
    #[inline]
    pub fn declares(&self, kind: UnitKind) -> bool {
        self.unit_kind() == Some(kind)
    }

    /// Return type when this is a function type.
    pub fn return_type(&self) -> Option<&Ty> {
        match self {
            Ty::Func(_, ret) => Some(ret),
            _ => None,
        }
    }

    /// Whether a value of type `other` may flow into a slot of this type.
    pub fn accepts(&self, other: &Ty) -> bool {
        matches!(self, Ty::Any) || matches!(other, Ty::Any) || self == other
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Ty]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Ty::Void => write!(f, "void"),
            Ty::Bool => write!(f, "bool"),
            Ty::Int => write!(f, "int"),
            Ty::Float => write!(f, "float"),
            Ty::Str => write!(f, "string"),
            Ty::Any => write!(f, "any"),
            Ty::List(inner) => write!(f, "List<{inner}>"),
            Ty::Named(name) => write!(f, "{name}"),
            Ty::Func(params, ret) => {
                write!(f, "Func<")?;
                list(f, params)?;
                if !params.is_empty() {
                    write!(f, ", ")?;
                }
                write!(f, "{ret}>")
            }
            Ty::Projection(source, result) => write!(f, "Projection<{source}, {result}>"),
            Ty::Specification(source) => write!(f, "Specification<{source}>"),
            Ty::ProjectionFactory {
                params,
                source,
                result,
            } => {
                write!(f, "ProjectionFactory<{source}, {result}, ")?;
                list(f, params)?;
                write!(f, ">")
            }
            Ty::SpecificationFactory { params, source } => {
                write!(f, "SpecificationFactory<{source}, ")?;
                list(f, params)?;
                write!(f, ">")
            }
        }
    }
}
