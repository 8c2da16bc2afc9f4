//! Read-only traversal helpers.
//!
//! - [`walk`]: iterative pre-order traversal with an explicit stack (no recursion). The visitor
//!   returns whether the children of the current node should be explored, which makes pruning
//!   and early-stopping searches cheap.
//! - [`compare_expressions`]: structural equality up to renaming of lambda parameters.
//! - [`free_params`], [`count_param`]: parameter queries used by the rewriting passes and tests.
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::{expr::Expr, param::Param};

/// Control returned by a [`walk`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Visit the children of this node.
    Continue,
    /// Do not descend into this node.
    Skip,
    /// Stop the whole traversal.
    Stop,
}

impl Expr {
    /// Direct children in evaluation order.
    pub fn children(&self) -> SmallVec<[&Expr; 4]> {
        let mut out = SmallVec::new();
        match self {
            Expr::Literal(_) | Expr::Param(_) => {}
            Expr::Member(m) => out.extend(m.target.as_deref()),
            Expr::Call(c) => {
                out.extend(c.target.as_deref());
                out.extend(c.args.iter());
            }
            Expr::Binary(b) => {
                out.push(&*b.lhs);
                out.push(&*b.rhs);
            }
            Expr::Unary(u) => out.push(&*u.operand),
            Expr::Lambda(l) => out.push(&*l.body),
            Expr::Invoke(i) => {
                out.push(&*i.callee);
                out.extend(i.args.iter());
            }
            Expr::Conditional(c) => {
                out.push(&*c.test);
                out.push(&*c.if_true);
                out.push(&*c.if_false);
            }
        }
        out
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        walk(self, |_| {
            count += 1;
            WalkControl::Continue
        });
        count
    }
}

/// Pre-order traversal; children are visited left to right.
pub fn walk<'e>(root: &'e Expr, mut visit: impl FnMut(&'e Expr) -> WalkControl) {
    let mut stack: SmallVec<[&'e Expr; 16]> = SmallVec::new();
    stack.push(root);

    while let Some(node) = stack.pop() {
        match visit(node) {
            WalkControl::Continue => stack.extend(node.children().into_iter().rev()),
            WalkControl::Skip => {}
            WalkControl::Stop => return,
        }
    }
}

/// Whether any node satisfies `pred`.
pub fn any_node(root: &Expr, mut pred: impl FnMut(&Expr) -> bool) -> bool {
    let mut found = false;
    walk(root, |node| {
        if pred(node) {
            found = true;
            WalkControl::Stop
        } else {
            WalkControl::Continue
        }
    });
    found
}

/// Occurrences of `param` as a node.
pub fn count_param(root: &Expr, param: &Param) -> usize {
    let mut count = 0;
    walk(root, |node| {
        if matches!(node, Expr::Param(p) if p == param) {
            count += 1;
        }
        WalkControl::Continue
    });
    count
}

/// Parameters read in `root` but not declared by a lambda inside it, in first-use order.
pub fn free_params(root: &Expr) -> Vec<Param> {
    fn go(e: &Expr, bound: &mut Vec<Param>, out: &mut Vec<Param>) {
        match e {
            Expr::Param(p) => {
                if !bound.contains(p) && !out.contains(p) {
                    out.push(p.clone());
                }
            }
            Expr::Lambda(l) => {
                let mark = bound.len();
                bound.extend(l.params.iter().cloned());
                go(&l.body, bound, out);
                bound.truncate(mark);
            }
            other => {
                for child in other.children() {
                    go(child, bound, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    go(root, &mut Vec::new(), &mut out);
    out
}

/// Compare two expressions for structural equality.
///
/// Lambda parameters are matched positionally, so `x => x + 1` equals `y => y + 1`. Free
/// parameters compare by identity, literals by value and type, members and methods by
/// descriptor.
pub fn compare_expressions(a: &Expr, b: &Expr) -> bool {
    compare_with(a, b, &mut HashMap::new())
}

fn compare_with(a: &Expr, b: &Expr, renames: &mut HashMap<Param, Param>) -> bool {
    if a.type_() != b.type_() {
        return false;
    }

    fn opt(a: Option<&Expr>, b: Option<&Expr>, renames: &mut HashMap<Param, Param>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => compare_with(a, b, renames),
            _ => false,
        }
    }

    fn all(a: &[Expr], b: &[Expr], renames: &mut HashMap<Param, Param>) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(a, b)| compare_with(a, b, renames))
    }

    match (a, b) {
        (Expr::Literal(a), Expr::Literal(b)) => a.value == b.value && a.ty == b.ty,
        (Expr::Param(a), Expr::Param(b)) => match renames.get(a) {
            Some(mapped) => mapped == b,
            None => a == b,
        },
        (Expr::Member(a), Expr::Member(b)) => {
            a.member == b.member && opt(a.target.as_deref(), b.target.as_deref(), renames)
        }
        (Expr::Call(a), Expr::Call(b)) => {
            a.method == b.method
                && opt(a.target.as_deref(), b.target.as_deref(), renames)
                && all(&a.args, &b.args, renames)
        }
        (Expr::Binary(a), Expr::Binary(b)) => {
            a.op == b.op
                && a.method == b.method
                && compare_with(&a.lhs, &b.lhs, renames)
                && compare_with(&a.rhs, &b.rhs, renames)
        }
        (Expr::Unary(a), Expr::Unary(b)) => {
            a.op == b.op
                && a.method == b.method
                && a.ty == b.ty
                && compare_with(&a.operand, &b.operand, renames)
        }
        (Expr::Lambda(a), Expr::Lambda(b)) => {
            if a.params.len() != b.params.len()
                || a.params.iter().zip(&b.params).any(|(p, q)| p.ty() != q.ty())
            {
                return false;
            }
            let shadowed: Vec<_> = a
                .params
                .iter()
                .zip(&b.params)
                .map(|(p, q)| (p.clone(), renames.insert(p.clone(), q.clone())))
                .collect();
            let same = compare_with(&a.body, &b.body, renames);
            for (p, previous) in shadowed.into_iter().rev() {
                match previous {
                    Some(previous) => renames.insert(p, previous),
                    None => renames.remove(&p),
                };
            }
            same
        }
        (Expr::Invoke(a), Expr::Invoke(b)) => {
            compare_with(&a.callee, &b.callee, renames) && all(&a.args, &b.args, renames)
        }
        (Expr::Conditional(a), Expr::Conditional(b)) => {
            compare_with(&a.test, &b.test, renames)
                && compare_with(&a.if_true, &b.if_true, renames)
                && compare_with(&a.if_false, &b.if_false, renames)
        }
        _ => false,
    }
}
