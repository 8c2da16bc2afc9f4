//! Reconstruction of expression trees from compiled functions.
//!
//! Units created from a compiled function alone need a tree the first time their expression is
//! requested. That tree comes from a [`Decompiler`] supplied by the caller; this crate never
//! inspects compiled code itself and does not validate what the decompiler returns.
use std::sync::Arc;

use hyexpr::{
    error::{Error, Result},
    expr::LambdaExpr,
    value::Func,
};

/// Produces a tree equivalent to a compiled function.
pub trait Decompiler: Send + Sync {
    fn decompile(&self, func: &Func) -> Result<LambdaExpr>;
}

impl<F> Decompiler for F
where
    F: Fn(&Func) -> Result<LambdaExpr> + Send + Sync,
{
    fn decompile(&self, func: &Func) -> Result<LambdaExpr> {
        self(func)
    }
}

pub type DecompilerRef = Arc<dyn Decompiler>;

/// Decompile with an optional decompiler.
pub fn decompile(decompiler: Option<&DecompilerRef>, func: &Func) -> Result<LambdaExpr> {
    let decompiler = decompiler.ok_or(Error::DecompilerUnavailable)?;
    decompiler.decompile(func)
}
