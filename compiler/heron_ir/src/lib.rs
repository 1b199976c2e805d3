//! Heron IR - AST and interned names for the Heron interpreter.
//!
//! This crate provides the data the evaluator walks:
//!
//! - `Name` / `StringInterner`: compact interned identifiers
//! - `ExprArena`: flat arena storage for expressions and statements,
//!   addressed by `ExprId` / `StmtId` indices (no `Box<Expr>`)
//! - `ExprKind` / `StmtKind`: the closed node taxonomies
//! - `sub_expressions`: allocation-free child traversal
//!
//! Nodes are immutable once allocated. Arenas are shared between function
//! values via [`SharedArena`] so a call always resolves body ids against
//! the arena its body was parsed into.

mod arena;
pub mod ast;
mod ids;
mod interner;
mod name;
mod span;
mod walk;

pub use arena::{ExprArena, SharedArena};
pub use ast::{BinaryOp, Expr, ExprKind, Literal, Param, Stmt, StmtKind, UnaryOp};
pub use ids::{ExprId, ExprRange, ParamRange, StmtId, StmtRange};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
pub use walk::{for_each_expr, stmt_sub_blocks, stmt_sub_expressions, sub_expressions, SubExprs};
