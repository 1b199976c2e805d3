//! AST node definitions.

mod expr;
mod operators;
mod stmt;

pub use expr::{Expr, ExprKind, Literal, Param};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{Stmt, StmtKind};
