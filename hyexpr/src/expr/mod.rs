//! Expression trees: node definitions, typing and builder helpers.
//!
//! Shape
//! - [`Expr`] is an owned tree of boxed nodes. Subtrees are plain values; rewriting passes build
//!   new trees and never mutate shared ones.
//! - Every node has a static [`Ty`] computed by [`Expr::ty`].
//! - [`ExprType`] is the field-less discriminant of a node, handy for dispatch and printing.
//!
//! Builders
//! - Constructors live on [`Expr`] (`Expr::constant`, `Expr::static_member`, ...), chained
//!   builders on values (`x.member(&len).add(Expr::constant(1))`), and `std::ops` impls give
//!   `!`, `&`, `|`, `+`, `-`, `*` shorthands.
//!
//! Example
//! ```
//! use hyexpr::prelude::*;
//!
//! let is_a = LambdaExpr::with_param("x", Ty::Str, |x| x.equals(Expr::constant("A")));
//! assert_eq!(is_a.to_string(), r#"x => x == "A""#);
//! ```
use std::ops;

use strum::{Display, EnumDiscriminants, EnumIs};

use crate::{
    error::{Error, Result},
    member::{Member, Method},
    param::Param,
    ty::Ty,
    value::Value,
};

pub mod compile;
pub mod pretty;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum BinaryOp {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Sub,
    #[strum(to_string = "*")]
    Mul,
    #[strum(to_string = "/")]
    Div,
    #[strum(to_string = "%")]
    Rem,
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "!=")]
    NotEqual,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = "<=")]
    LessEqual,
    #[strum(to_string = ">")]
    Greater,
    #[strum(to_string = ">=")]
    GreaterEqual,
    /// Short-circuit conjunction.
    #[strum(to_string = "&&")]
    AndAlso,
    /// Short-circuit disjunction.
    #[strum(to_string = "||")]
    OrElse,
    /// Non short-circuit conjunction.
    #[strum(to_string = "&")]
    And,
    /// Non short-circuit disjunction.
    #[strum(to_string = "|")]
    Or,
}

impl BinaryOp {
    /// Whether the operator produces a boolean regardless of its operand types.
    #[inline]
    pub fn is_predicate(self) -> bool {
        use BinaryOp::*;
        matches!(
            self,
            Equal
                | NotEqual
                | Less
                | LessEqual
                | Greater
                | GreaterEqual
                | AndAlso
                | OrElse
                | And
                | Or
        )
    }

    #[inline]
    pub fn is_logical(self) -> bool {
        use BinaryOp::*;
        matches!(self, AndAlso | OrElse | And | Or)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum UnaryOp {
    #[strum(to_string = "!")]
    Not,
    #[strum(to_string = "-")]
    Negate,
    /// Type conversion, possibly through a user conversion method.
    #[strum(to_string = "convert")]
    Convert,
}

/// Literal value with its static type.
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    pub ty: Ty,
}

/// Field or property read. `target` is `None` for static members.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub target: Option<Box<Expr>>,
    pub member: Member,
}

/// Method call. `target` is `None` for static methods.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub target: Option<Box<Expr>>,
    pub method: Method,
    pub args: Vec<Expr>,
}

/// Binary operation, optionally bound to a user-defined operator method.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub method: Option<Method>,
}

/// Unary operation, optionally bound to a user-defined operator or conversion method.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub method: Option<Method>,
    pub ty: Ty,
}

/// Lambda with an ordered parameter list.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<Param>,
    pub body: Box<Expr>,
}

/// Application of a function-valued expression to arguments.
#[derive(Debug, Clone)]
pub struct InvokeExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

/// `test ? if_true : if_false`.
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub test: Box<Expr>,
    pub if_true: Box<Expr>,
    pub if_false: Box<Expr>,
}

/// Expression node.
#[derive(Debug, Clone, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(ExprType), derive(Hash, Display))]
pub enum Expr {
    Literal(Literal),
    Param(Param),
    Member(MemberExpr),
    Call(CallExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Lambda(LambdaExpr),
    Invoke(InvokeExpr),
    Conditional(ConditionalExpr),
}

impl Expr {
    /// Discriminant of this node.
    #[inline]
    pub fn type_(&self) -> ExprType {
        self.into()
    }

    /// Static type of the value this expression produces.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Literal(lit) => lit.ty.clone(),
            Expr::Param(p) => p.ty().clone(),
            Expr::Member(m) => m.member.ty().clone(),
            Expr::Call(c) => c.method.ret().clone(),
            Expr::Binary(b) => match &b.method {
                Some(method) => method.ret().clone(),
                None if b.op.is_predicate() => Ty::Bool,
                None => match (b.lhs.ty(), b.rhs.ty()) {
                    (Ty::Int, Ty::Float) | (Ty::Float, Ty::Int) => Ty::Float,
                    (lhs, _) => lhs,
                },
            },
            Expr::Unary(u) => u.ty.clone(),
            Expr::Lambda(l) => l.ty(),
            Expr::Invoke(i) => i.callee.ty().return_type().cloned().unwrap_or(Ty::Any),
            Expr::Conditional(c) => c.if_true.ty(),
        }
    }

    /// Literal typed from its value.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = value.ty();
        Expr::Literal(Literal { value, ty })
    }

    /// Literal with an explicit static type.
    pub fn literal(value: Value, ty: Ty) -> Self {
        Expr::Literal(Literal { value, ty })
    }

    pub fn null(ty: Ty) -> Self {
        Expr::literal(Value::Null, ty)
    }

    pub fn param(param: &Param) -> Self {
        Expr::Param(param.clone())
    }

    pub fn static_member(member: &Member) -> Self {
        Expr::Member(MemberExpr {
            target: None,
            member: member.clone(),
        })
    }

    pub fn static_call(method: &Method, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call(CallExpr {
            target: None,
            method: method.clone(),
            args: args.into_iter().collect(),
        })
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            method: None,
        })
    }

    /// Binary operation resolved to a user-defined operator method.
    pub fn binary_with(op: BinaryOp, lhs: Expr, rhs: Expr, method: &Method) -> Self {
        Expr::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            method: Some(method.clone()),
        })
    }

    /// Unary operation resolved to a user-defined operator method.
    pub fn unary_with(op: UnaryOp, operand: Expr, method: &Method) -> Self {
        Expr::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            ty: method.ret().clone(),
            method: Some(method.clone()),
        })
    }

    pub fn negate(operand: Expr) -> Self {
        let ty = operand.ty();
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Negate,
            operand: Box::new(operand),
            method: None,
            ty,
        })
    }

    /// Conversion to `ty`, optionally through a conversion method.
    pub fn convert(operand: Expr, ty: Ty, method: Option<&Method>) -> Self {
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Convert,
            operand: Box::new(operand),
            method: method.cloned(),
            ty,
        })
    }

    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Conditional(ConditionalExpr {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    pub fn lambda(params: impl IntoIterator<Item = Param>, body: Expr) -> Self {
        Expr::Lambda(LambdaExpr::new(params, body))
    }

    // Chained builders

    /// Instance member read on this expression.
    pub fn member(self, member: &Member) -> Self {
        Expr::Member(MemberExpr {
            target: Some(Box::new(self)),
            member: member.clone(),
        })
    }

    /// Instance method call on this expression.
    pub fn call(self, method: &Method, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call(CallExpr {
            target: Some(Box::new(self)),
            method: method.clone(),
            args: args.into_iter().collect(),
        })
    }

    /// Invoke this function-valued expression.
    pub fn invoke(self, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Invoke(InvokeExpr {
            callee: Box::new(self),
            args: args.into_iter().collect(),
        })
    }

    pub fn equals(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Equal, self, rhs)
    }

    pub fn not_equals(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::NotEqual, self, rhs)
    }

    pub fn less_than(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Less, self, rhs)
    }

    pub fn less_equal(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::LessEqual, self, rhs)
    }

    pub fn greater_than(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Greater, self, rhs)
    }

    pub fn greater_equal(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::GreaterEqual, self, rhs)
    }

    pub fn and_also(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::AndAlso, self, rhs)
    }

    pub fn or_else(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::OrElse, self, rhs)
    }

    pub fn rem(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Rem, self, rhs)
    }

    pub fn div(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Div, self, rhs)
    }

    // Accessors

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expr::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match self {
            Expr::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn into_lambda(self) -> Result<LambdaExpr> {
        match self {
            Expr::Lambda(lambda) => Ok(lambda),
            other => Err(Error::UnsupportedShape {
                expr: other.to_string(),
                expected: "a lambda",
            }),
        }
    }
}

impl From<LambdaExpr> for Expr {
    fn from(value: LambdaExpr) -> Self {
        Expr::Lambda(value)
    }
}

impl From<Param> for Expr {
    fn from(value: Param) -> Self {
        Expr::Param(value)
    }
}

impl From<&Param> for Expr {
    fn from(value: &Param) -> Self {
        Expr::Param(value.clone())
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Self::Output {
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Not,
            operand: Box::new(self),
            method: None,
            ty: Ty::Bool,
        })
    }
}

macro_rules! impl_binary_ops {
    ($($trait:ident :: $fn:ident => $op:ident),* $(,)?) => {
        $(
            impl ops::$trait for Expr {
                type Output = Expr;

                fn $fn(self, rhs: Expr) -> Self::Output {
                    Expr::binary(BinaryOp::$op, self, rhs)
                }
            }
        )*
    };
}

impl_binary_ops! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    BitAnd::bitand => And,
    BitOr::bitor => Or,
}

impl LambdaExpr {
    pub fn new(params: impl IntoIterator<Item = Param>, body: Expr) -> Self {
        Self {
            params: params.into_iter().collect(),
            body: Box::new(body),
        }
    }

    /// Build a single-parameter lambda, handing the parameter reference to `body`.
    pub fn with_param(name: &str, ty: Ty, body: impl FnOnce(Expr) -> Expr) -> Self {
        let param = Param::new(name, ty);
        let body = body(Expr::param(&param));
        Self::new([param], body)
    }

    /// Build a two-parameter lambda.
    pub fn with_params2(
        (a, a_ty): (&str, Ty),
        (b, b_ty): (&str, Ty),
        body: impl FnOnce(Expr, Expr) -> Expr,
    ) -> Self {
        let a = Param::new(a, a_ty);
        let b = Param::new(b, b_ty);
        let body = body(Expr::param(&a), Expr::param(&b));
        Self::new([a, b], body)
    }

    /// Zero-parameter lambda (an accessor).
    pub fn nullary(body: Expr) -> Self {
        Self::new([], body)
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The only parameter of a single-parameter lambda.
    pub fn single_param(&self) -> Result<&Param> {
        match self.params.as_slice() {
            [p] => Ok(p),
            _ => Err(Error::InvalidArgument {
                argument: "expression",
                reason: format!(
                    "expected a single-parameter lambda, got {} parameter(s) in `{self}`",
                    self.params.len()
                ),
            }),
        }
    }

    /// `Func<params..., ret>`.
    pub fn ty(&self) -> Ty {
        Ty::func(self.params.iter().map(|p| p.ty().clone()), self.body.ty())
    }

    #[inline]
    pub fn body(&self) -> &Expr {
        &self.body
    }
}
