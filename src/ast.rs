// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::temporal::TemporalOp;
use crate::builtins::Builtin;
use crate::number::Number;
use crate::*;

use core::{cmp, fmt, ops::Deref};

/// Byte range of a node in the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BoolOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl BoolOp {
    pub fn from_text(text: &str) -> Option<BoolOp> {
        Some(match text {
            "<" => BoolOp::Lt,
            "<=" => BoolOp::Le,
            "==" => BoolOp::Eq,
            ">=" => BoolOp::Ge,
            ">" => BoolOp::Gt,
            "!=" => BoolOp::Ne,
            _ => return None,
        })
    }
}

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;
pub type ExprRef = Ref<Expr>;

/// Terminal accessor of a field path.
#[derive(Debug)]
pub enum PathSuffix {
    /// `.length`
    Length { span: Span },

    /// `.every(param => body)`
    Every {
        span: Span,
        param: Rc<str>,
        body: ExprRef,
    },
}

/// Dotted chain of identifiers, optionally ending in `.length` or `.every(...)`.
#[derive(Debug)]
pub struct FieldPath {
    pub span: Span,
    pub segments: Vec<Rc<str>>,
    pub suffix: Option<PathSuffix>,
}

impl FieldPath {
    pub fn root(&self) -> &str {
        self.segments.first().map(|s| s.as_ref()).unwrap_or_default()
    }

    /// The plain dotted path without any suffix.
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug)]
pub enum Expr {
    Null(Span),

    Bool {
        span: Span,
        value: bool,
    },

    Number {
        span: Span,
        value: Number,
    },

    String {
        span: Span,
        value: Rc<str>,
    },

    Path(FieldPath),

    /// `[a, b.c, ...]`
    List {
        span: Span,
        items: Vec<FieldPath>,
    },

    /// A run of `!` operators applied to `expr`.
    Not {
        span: Span,
        negations: u32,
        expr: ExprRef,
    },

    Compare {
        span: Span,
        op: BoolOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },

    And {
        span: Span,
        operands: Vec<ExprRef>,
    },

    Or {
        span: Span,
        operands: Vec<ExprRef>,
    },

    /// `antecedent => consequent`
    Implies {
        span: Span,
        antecedent: ExprRef,
        consequent: ExprRef,
    },

    /// Builtin taking expression operands.
    Call {
        span: Span,
        builtin: Builtin,
        args: Vec<ExprRef>,
    },

    /// `changed`, `previous` or `delta` applied to a field path.
    Temporal {
        span: Span,
        op: TemporalOp,
        path: FieldPath,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Null(span) => *span,
            Expr::Path(path) => path.span,
            Expr::Bool { span, .. }
            | Expr::Number { span, .. }
            | Expr::String { span, .. }
            | Expr::List { span, .. }
            | Expr::Not { span, .. }
            | Expr::Compare { span, .. }
            | Expr::And { span, .. }
            | Expr::Or { span, .. }
            | Expr::Implies { span, .. }
            | Expr::Call { span, .. }
            | Expr::Temporal { span, .. } => *span,
        }
    }
}
