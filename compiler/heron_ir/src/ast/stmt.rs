//! Statement nodes.
//!
//! The statement set is deliberately small: exactly what function bodies
//! and module initializers need. Statements interact with the machine only
//! through scope push/pop and the return flag.

use std::fmt;

use crate::{ExprId, Name, Span, StmtRange};

/// Statement node: a kind plus its source span.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Statement variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum StmtKind {
    /// `var name = init;` declares in the current scope.
    /// `ExprId::INVALID` = no initializer (binds null).
    VarDecl { name: Name, init: ExprId },

    /// Expression statement, evaluated for effect.
    Expr(ExprId),

    /// `{ ... }` runs its body in a fresh scope.
    Block(StmtRange),

    /// `if (cond) { then } else { els }`.
    /// Empty `els` = no else branch.
    If {
        cond: ExprId,
        then_block: StmtRange,
        else_block: StmtRange,
    },

    /// `while (cond) { body }`
    While { cond: ExprId, body: StmtRange },

    /// `foreach (binding in source) { body }`
    ForEach {
        binding: Name,
        source: ExprId,
        body: StmtRange,
    },

    /// `return;` or `return expr;`
    /// `ExprId::INVALID` = return void.
    Return(ExprId),
}

impl fmt::Debug for StmtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtKind::VarDecl { name, init } => write!(f, "VarDecl({name:?}, {init:?})"),
            StmtKind::Expr(e) => write!(f, "Expr({e:?})"),
            StmtKind::Block(body) => write!(f, "Block({body:?})"),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => write!(f, "If({cond:?}, {then_block:?}, {else_block:?})"),
            StmtKind::While { cond, body } => write!(f, "While({cond:?}, {body:?})"),
            StmtKind::ForEach {
                binding,
                source,
                body,
            } => write!(f, "ForEach({binding:?}, {source:?}, {body:?})"),
            StmtKind::Return(e) => write!(f, "Return({e:?})"),
        }
    }
}
