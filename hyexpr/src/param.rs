//! Lambda parameters and formal parameters.
//!
//! Role
//! - [`Param`] is a lambda parameter. Two references denote the same parameter only if they share
//!   identity; equal names are not enough, which keeps substitution capture-free when two nested
//!   lambdas reuse a name.
//! - [`FormalParam`] describes a declared parameter of a factory builder (name and type). It is
//!   what captured-argument binding compares against.
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::ty::Ty;

#[derive(Debug)]
struct ParamData {
    name: Arc<str>,
    ty: Ty,
}

/// Lambda parameter with identity semantics.
#[derive(Clone)]
pub struct Param(Arc<ParamData>);

impl Param {
    pub fn new(name: impl Into<Arc<str>>, ty: Ty) -> Self {
        Self(Arc::new(ParamData {
            name: name.into(),
            ty,
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

    /// Stable identifier for the lifetime of the parameter.
    #[inline]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Param {}

impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:x}: {}", self.name(), self.id() & 0xffff, self.ty())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Declared parameter of a builder: compared by name and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormalParam {
    pub name: Arc<str>,
    pub ty: Ty,
}

impl FormalParam {
    pub fn new(name: impl Into<Arc<str>>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for FormalParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}
