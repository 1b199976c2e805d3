//! Expression nodes.
//!
//! All children are arena indices, not boxes. Expressions are immutable
//! once allocated.

use std::fmt;

use super::operators::{BinaryOp, UnaryOp};
use crate::{ExprId, ExprRange, Name, ParamRange, Span, StmtRange};

/// Expression node: a kind plus its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// A literal carried by an [`ExprKind::Literal`] node.
///
/// Floats are stored as raw bits so the node stays `Eq + Hash`; string
/// literals are interned.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    Int(i64),
    Float(u64),
    Bool(bool),
    Char(char),
    Str(Name),
}

impl Literal {
    /// Construct a float literal from its value.
    pub fn float(value: f64) -> Self {
        Literal::Float(value.to_bits())
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "Int({n})"),
            Literal::Float(bits) => write!(f, "Float({})", f64::from_bits(*bits)),
            Literal::Bool(b) => write!(f, "Bool({b})"),
            Literal::Char(c) => write!(f, "Char({c:?})"),
            Literal::Str(n) => write!(f, "Str({n:?})"),
        }
    }
}

/// Formal parameter of a function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    /// Declared type name; `Name::EMPTY` = untyped.
    pub ty: Name,
}

/// Expression variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum ExprKind {
    /// The `null` literal.
    Null,

    /// Primitive literal.
    Literal(Literal),

    /// Variable or type reference.
    Ident(Name),

    /// Assignment: `target = value`. Valid targets are `Ident`, `Field`
    /// and `Index`; everything else is rejected at evaluation time.
    Assign { target: ExprId, value: ExprId },

    /// Field access: `receiver.field`
    Field { receiver: ExprId, field: Name },

    /// Index access: `receiver[index]`
    Index { receiver: ExprId, index: ExprId },

    /// Object construction: `new Type(args...)`
    New { type_name: Name, args: ExprRange },

    /// Function call: `callee(args...)`
    Call { callee: ExprId, args: ExprRange },

    /// Unary operation: `op operand`
    Unary { op: UnaryOp, operand: ExprId },

    /// Binary operation: `left op right`
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },

    /// Anonymous function: `function (params) : ret { body }`.
    /// Evaluates to a closure capturing its free variables by snapshot.
    AnonFun {
        params: ParamRange,
        /// Return type name; `Name::EMPTY` = unannotated.
        ret_ty: Name,
        body: StmtRange,
    },

    /// Post-increment: `target++`. Yields the old value and stores
    /// `target + 1`.
    PostIncrement(ExprId),

    /// Tuple literal: `[a, b, c]`. Evaluates to a List value.
    Tuple(ExprRange),

    /// `select (binding from source) where predicate`
    Select {
        binding: Name,
        source: ExprId,
        predicate: ExprId,
    },

    /// `mapeach (binding in source) yield_expr`
    MapEach {
        binding: Name,
        source: ExprId,
        yield_expr: ExprId,
    },

    /// `accumulate (acc = init forall each in source) step`
    Accumulate {
        acc: Name,
        init: ExprId,
        each: Name,
        source: ExprId,
        step: ExprId,
    },

    /// `reduce (left, right in source) combine`: parallel associative
    /// reduction producing a one-element Array (empty List for an empty
    /// source).
    Reduce {
        left: Name,
        right: Name,
        source: ExprId,
        combine: ExprId,
    },
}

impl fmt::Debug for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Null => write!(f, "Null"),
            ExprKind::Literal(lit) => write!(f, "Literal({lit:?})"),
            ExprKind::Ident(n) => write!(f, "Ident({n:?})"),
            ExprKind::Assign { target, value } => write!(f, "Assign({target:?}, {value:?})"),
            ExprKind::Field { receiver, field } => write!(f, "Field({receiver:?}, {field:?})"),
            ExprKind::Index { receiver, index } => write!(f, "Index({receiver:?}, {index:?})"),
            ExprKind::New { type_name, args } => write!(f, "New({type_name:?}, {args:?})"),
            ExprKind::Call { callee, args } => write!(f, "Call({callee:?}, {args:?})"),
            ExprKind::Unary { op, operand } => write!(f, "Unary({op:?}, {operand:?})"),
            ExprKind::Binary { op, left, right } => {
                write!(f, "Binary({op:?}, {left:?}, {right:?})")
            }
            ExprKind::AnonFun {
                params,
                ret_ty,
                body,
            } => write!(f, "AnonFun({params:?}, {ret_ty:?}, {body:?})"),
            ExprKind::PostIncrement(target) => write!(f, "PostIncrement({target:?})"),
            ExprKind::Tuple(exprs) => write!(f, "Tuple({exprs:?})"),
            ExprKind::Select {
                binding,
                source,
                predicate,
            } => write!(f, "Select({binding:?}, {source:?}, {predicate:?})"),
            ExprKind::MapEach {
                binding,
                source,
                yield_expr,
            } => write!(f, "MapEach({binding:?}, {source:?}, {yield_expr:?})"),
            ExprKind::Accumulate {
                acc,
                init,
                each,
                source,
                step,
            } => write!(
                f,
                "Accumulate({acc:?}, {init:?}, {each:?}, {source:?}, {step:?})"
            ),
            ExprKind::Reduce {
                left,
                right,
                source,
                combine,
            } => write!(f, "Reduce({left:?}, {right:?}, {source:?}, {combine:?})"),
        }
    }
}

// The arena stores millions of these in hot loops; keep the node compact.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{Expr, ExprKind};

    const _: () = assert!(std::mem::size_of::<ExprKind>() <= 24);
    const _: () = assert!(std::mem::size_of::<Expr>() <= 32);
}
