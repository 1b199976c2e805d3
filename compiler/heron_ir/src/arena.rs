//! Arena allocation for the flat AST.
//!
//! All expressions and statements of one parsed unit live in contiguous
//! vectors; children are referenced by index. Child lists (arguments,
//! tuple elements, block bodies) are flattened into side tables addressed
//! by `(start, len)` ranges.

use std::sync::Arc;

use crate::ast::{Expr, Param, Stmt};
use crate::{ExprId, ExprRange, ParamRange, StmtId, StmtRange};

#[cold]
#[inline(never)]
fn panic_capacity_exceeded(value: usize, context: &str) -> ! {
    panic!("arena capacity exceeded: {context} has {value} elements")
}

#[inline]
fn to_u32(value: usize, context: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| panic_capacity_exceeded(value, context))
}

#[inline]
fn to_u16(value: usize, context: &str) -> u16 {
    u16::try_from(value).unwrap_or_else(|_| panic_capacity_exceeded(value, context))
}

/// Contiguous storage for the expressions and statements of one parse unit.
#[derive(Clone, Default)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,
    /// Flattened expression lists (call arguments, tuple elements).
    expr_lists: Vec<ExprId>,
    /// All statements (indexed by `StmtId`).
    stmts: Vec<Stmt>,
    /// Flattened statement lists (blocks, branches, bodies).
    stmt_lists: Vec<StmtId>,
    /// All formal parameters.
    params: Vec<Param>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression, returning its id.
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    /// Get an expression by id.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or foreign id.
    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Flatten a list of expression ids into the side table.
    pub fn alloc_expr_list(&mut self, ids: &[ExprId]) -> ExprRange {
        let start = to_u32(self.expr_lists.len(), "expression lists");
        let len = to_u16(ids.len(), "expression list");
        self.expr_lists.extend_from_slice(ids);
        ExprRange::new(start, len)
    }

    /// Resolve an expression range to its ids.
    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    /// Allocate a statement, returning its id.
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(to_u32(self.stmts.len(), "statements"));
        self.stmts.push(stmt);
        id
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Flatten a list of statement ids into the side table.
    pub fn alloc_stmt_list(&mut self, ids: &[StmtId]) -> StmtRange {
        let start = to_u32(self.stmt_lists.len(), "statement lists");
        let len = to_u16(ids.len(), "statement list");
        self.stmt_lists.extend_from_slice(ids);
        StmtRange::new(start, len)
    }

    #[inline]
    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        &self.stmt_lists[start..start + range.len()]
    }

    /// Allocate a parameter list.
    pub fn alloc_params(&mut self, params: &[Param]) -> ParamRange {
        let start = to_u32(self.params.len(), "parameters");
        let len = to_u16(params.len(), "parameter list");
        self.params.extend_from_slice(params);
        ParamRange::new(start, len)
    }

    #[inline]
    pub fn params(&self, range: ParamRange) -> &[Param] {
        let start = range.start as usize;
        &self.params[start..start + range.len()]
    }

    /// Number of allocated expressions.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

/// Shared handle to an arena.
///
/// Function values carry the arena their body was parsed into, so a call
/// always resolves body ids against the callee's own arena; this matters
/// when modules (each with their own arena) call across module boundaries
/// and when reduce workers evaluate closures in parallel.
pub type SharedArena = Arc<ExprArena>;
