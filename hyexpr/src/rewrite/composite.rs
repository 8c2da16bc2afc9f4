//! Sequential composition of rewriters.
use std::fmt;

use crate::{error::Result, expr::Expr, visitor::Rewriter};

pub type BoxedRewriter = Box<dyn Rewriter + Send + Sync>;

/// Runs an ordered list of rewriters, each over the previous one's output.
#[derive(Default)]
pub struct CompositeRewriter {
    passes: Vec<BoxedRewriter>,
}

impl CompositeRewriter {
    pub fn new(passes: impl IntoIterator<Item = BoxedRewriter>) -> Self {
        Self {
            passes: passes.into_iter().collect(),
        }
    }

    /// Append a pass at the end of the pipeline.
    pub fn then(mut self, pass: impl Rewriter + Send + Sync + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Rewriter for CompositeRewriter {
    fn rewrite(&self, expr: &Expr) -> Result<Expr> {
        let Some((first, rest)) = self.passes.split_first() else {
            return Ok(expr.clone());
        };
        rest.iter()
            .try_fold(first.rewrite(expr)?, |acc, pass| pass.rewrite(&acc))
    }
}

impl fmt::Debug for CompositeRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeRewriter({} passes)", self.passes.len())
    }
}
