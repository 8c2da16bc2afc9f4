use strum::EnumIs;
use thiserror::Error;

/// Errors raised while building, rewriting or evaluating expressions.
///
/// Every rewrite failure is fatal: a pass that returns an error leaves no partially rewritten
/// tree behind. Messages embed the textual form of the offending subtree.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum Error {
    /// A rewrite rule required a value known at rewrite time and none could be obtained.
    #[error("Expression `{expr}` cannot be evaluated at rewrite time.")]
    Unfoldable { expr: String },

    /// Folding succeeded but produced `null` where a value was required.
    #[error("Expression `{expr}` evaluated to null where a value was required.")]
    NullValue { expr: String },

    /// A node had a shape the rule does not support. Signals a broken invariant.
    #[error("Unexpected expression `{expr}`: expected {expected}.")]
    UnsupportedShape { expr: String, expected: &'static str },

    /// A constructor or builder was handed an argument it cannot work with.
    #[error("Argument `{argument}` is invalid: {reason}.")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// A bound parameter was read outside of the lambda that declares it.
    #[error("Parameter `{name}` is not bound in the current scope.")]
    UnboundParameter { name: String },

    /// An operator was applied to values it does not support.
    #[error("Operator `{op}` cannot be applied to {operands}.")]
    InvalidOperands { op: String, operands: String },

    /// A function was called with the wrong number of arguments.
    #[error("Function expects {expected} argument(s), got {found}.")]
    ArityMismatch { expected: usize, found: usize },

    /// A member getter could not read from the given target.
    #[error("Member `{member}` cannot be read from `{target}`.")]
    MemberAccess { member: String, target: String },

    /// Two types that must agree do not.
    #[error("Type mismatch: expected `{expected}`, found `{found}`.")]
    TypeMismatch { expected: String, found: String },

    /// An expression had to be reconstructed from a compiled function but no decompiler is set.
    #[error("No decompiler is available to reconstruct an expression from a compiled function.")]
    DecompilerUnavailable,

    /// The decompiler failed to reconstruct an expression.
    #[error("Decompilation failed: {0}")]
    Decompile(String),

    /// A rewrite finished but the result still references a unit wrapper.
    #[error("Rewritten expression `{expr}` still references a unit wrapper.")]
    ResidualUnitReference { expr: String },

    /// Error raised by a host-supplied getter, method or function.
    #[error("{0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, Error>;
