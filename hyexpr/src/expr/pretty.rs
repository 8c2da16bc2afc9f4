//! RcDoc-based pretty-printer with termcolor annotations for `Expr`.
//!
//! Role
//! - Convert an `Expr` into an annotated document; the plain rendering is the canonical textual
//!   form used by error messages, logs and tests.
//! - Provide colored output for terminals (TTY-aware) behind the `color` feature.
//!
//! Textual form
//! - Lambdas print as `x => body`, `(a, b) => body` or `() => body`.
//! - A binary operand that is itself a binary operation is always parenthesized, so
//!   `x => ((a || b) || c)` keeps the grouping the tree actually has.
//! - A member read whose target is a literal closure container prints as the bare member name,
//!   the way a captured local reads in source.
//! - The layout never breaks lines.
use std::fmt;

use pretty::{FmtWrite, RcDoc};

use crate::expr::{Expr, LambdaExpr, UnaryOp};
use crate::value::{Record, Value};

#[cfg(feature = "color")]
use pretty::RenderAnnotated;
#[cfg(feature = "color")]
use std::io::{self, Write};
#[cfg(feature = "color")]
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // commas, periods, `=>`
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword,  // null, true, false
    Operator, // +, ==, &&, !, ?
    Ident,    // parameters and members
    Literal,  // strings, numbers, objects
    Type,     // conversion targets
}

#[cfg(feature = "color")]
impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Literal => {
                s.set_fg(Some(Color::Red));
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
        }
        s
    }
}

pub type Doc = RcDoc<'static, Style>;

fn styled(style: Style, s: impl fmt::Display) -> Doc {
    RcDoc::as_string(s).annotate(style)
}

fn punct(s: &'static str) -> Doc {
    styled(Style::Punct, s)
}

#[inline]
fn lparen(depth: u8) -> Doc {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> Doc {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn op(s: impl fmt::Display) -> Doc {
    styled(Style::Operator, s)
}

fn ident(s: &str) -> Doc {
    styled(Style::Ident, s)
}

fn parens(inner: Doc, depth: u8) -> Doc {
    lparen(depth).append(inner).append(rparen(depth))
}

/// Nodes that never need parentheses as operands or targets.
#[inline]
fn is_atom(e: &Expr) -> bool {
    matches!(
        e,
        Expr::Literal(_) | Expr::Param(_) | Expr::Member(_) | Expr::Call(_) | Expr::Invoke(_)
    )
}

fn atom_doc(e: &Expr, depth: u8) -> Doc {
    if is_atom(e) {
        to_doc_with_depth(e, depth)
    } else {
        parens(to_doc_with_depth(e, depth + 1), depth)
    }
}

fn binary_operand_doc(e: &Expr, depth: u8) -> Doc {
    match e {
        Expr::Binary(_) | Expr::Conditional(_) | Expr::Lambda(_) => {
            parens(to_doc_with_depth(e, depth + 1), depth)
        }
        _ => to_doc_with_depth(e, depth),
    }
}

fn comma_list<'e>(items: impl IntoIterator<Item = &'e Expr>, depth: u8) -> Doc {
    RcDoc::intersperse(
        items.into_iter().map(|e| to_doc_with_depth(e, depth)),
        punct(",").append(RcDoc::space()),
    )
}

fn literal_doc(value: &Value) -> Doc {
    match value {
        Value::Null => styled(Style::Keyword, "null"),
        Value::Bool(b) => styled(Style::Keyword, b),
        other => styled(Style::Literal, other),
    }
}

fn is_closure_container(e: &Expr) -> bool {
    match e {
        Expr::Literal(lit) => lit
            .value
            .downcast_ref::<Record>()
            .is_some_and(|r| r.declaring().is_synthesized()),
        _ => false,
    }
}

fn lambda_doc(lambda: &LambdaExpr, depth: u8) -> Doc {
    let params = match lambda.params.as_slice() {
        [single] => ident(single.name()),
        many => parens(
            RcDoc::intersperse(
                many.iter().map(|p| ident(p.name())),
                punct(",").append(RcDoc::space()),
            ),
            depth,
        ),
    };
    params
        .append(RcDoc::space())
        .append(punct("=>"))
        .append(RcDoc::space())
        .append(to_doc_with_depth(&lambda.body, depth))
        .group()
}

/// Depth-aware variant that colors parentheses by nesting level.
fn to_doc_with_depth(e: &Expr, depth: u8) -> Doc {
    match e {
        Expr::Literal(lit) => literal_doc(&lit.value),
        Expr::Param(p) => ident(p.name()),
        Expr::Member(m) => match &m.target {
            Some(target) if is_closure_container(target) => ident(m.member.name()),
            Some(target) => atom_doc(target, depth)
                .append(punct("."))
                .append(ident(m.member.name())),
            None => styled(Style::Type, m.member.declaring().name())
                .append(punct("."))
                .append(ident(m.member.name())),
        },
        Expr::Call(c) => {
            let head = match &c.target {
                Some(target) => atom_doc(target, depth),
                None => styled(Style::Type, c.method.declaring().name()),
            };
            head.append(punct("."))
                .append(ident(c.method.name()))
                .append(parens(comma_list(&c.args, depth + 1), depth))
                .group()
        }
        Expr::Binary(b) => binary_operand_doc(&b.lhs, depth)
            .append(RcDoc::space())
            .append(op(b.op))
            .append(RcDoc::space())
            .append(binary_operand_doc(&b.rhs, depth))
            .group(),
        Expr::Unary(u) => match u.op {
            UnaryOp::Not | UnaryOp::Negate => op(u.op).append(atom_doc(&u.operand, depth)),
            UnaryOp::Convert => parens(styled(Style::Type, &u.ty), depth)
                .append(atom_doc(&u.operand, depth + 1)),
        },
        Expr::Lambda(l) => lambda_doc(l, depth),
        Expr::Invoke(i) => atom_doc(&i.callee, depth)
            .append(parens(comma_list(&i.args, depth + 1), depth))
            .group(),
        Expr::Conditional(c) => {
            let branch = |e: &Expr| match e {
                Expr::Conditional(_) | Expr::Lambda(_) => {
                    parens(to_doc_with_depth(e, depth + 1), depth)
                }
                _ => to_doc_with_depth(e, depth),
            };
            branch(&c.test)
                .append(RcDoc::space())
                .append(op("?"))
                .append(RcDoc::space())
                .append(branch(&c.if_true))
                .append(RcDoc::space())
                .append(op(":"))
                .append(RcDoc::space())
                .append(branch(&c.if_false))
                .group()
        }
    }
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
#[cfg(feature = "color")]
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

#[cfg(feature = "color")]
impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

#[cfg(feature = "color")]
impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

#[cfg(feature = "color")]
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for expressions.
pub trait PrettyExpr {
    /// Annotated document for this expression.
    fn pretty_doc(&self) -> Doc;

    /// Render with colors to any termcolor writer at the given width.
    #[cfg(feature = "color")]
    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        let mut cw = ColorWriter { out };
        self.pretty_doc().render_raw(width, &mut cw)
    }

    /// Print to stdout with colors (TTY-aware).
    #[cfg(feature = "color")]
    fn pretty_print(&self) -> io::Result<()> {
        let stdout = StandardStream::stdout(ColorChoice::Auto);
        let mut stdout = stdout.lock();
        self.pretty_render_to(terminal_width(), &mut stdout)
    }

    /// Canonical plain textual form.
    fn pretty_string(&self) -> String {
        let mut buf = String::new();
        let _ = self.pretty_doc().render_fmt(80, &mut buf);
        buf
    }
}

impl PrettyExpr for Expr {
    #[inline]
    fn pretty_doc(&self) -> Doc {
        to_doc_with_depth(self, 0)
    }
}

impl PrettyExpr for LambdaExpr {
    #[inline]
    fn pretty_doc(&self) -> Doc {
        lambda_doc(self, 0)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}

impl fmt::Display for LambdaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}
