//! AST traversal.
//!
//! [`sub_expressions`] yields the direct children of an expression node,
//! each exactly once, without allocating. It is the basis for tree walks,
//! free-variable analysis and expression rendering.

use crate::ast::{ExprKind, StmtKind};
use crate::{ExprArena, ExprId, ExprRange, StmtId, StmtRange};

/// Iterator over the direct sub-expressions of a node.
///
/// Children come in two shapes: up to three inline ids (operands,
/// receivers) and an optional flattened range (arguments, tuple
/// elements). The iterator yields the inline ids first, then the range.
pub struct SubExprs<'a> {
    arena: &'a ExprArena,
    fixed: [ExprId; 3],
    fixed_len: u8,
    fixed_pos: u8,
    rest: ExprRange,
    rest_pos: u16,
}

impl<'a> SubExprs<'a> {
    fn new(arena: &'a ExprArena, fixed: &[ExprId], rest: ExprRange) -> Self {
        debug_assert!(fixed.len() <= 3);
        let mut buf = [ExprId::INVALID; 3];
        let mut len = 0u8;
        for &id in fixed {
            // Optional children use the INVALID sentinel; skip them here so
            // callers never observe invalid ids.
            if id.is_valid() {
                buf[len as usize] = id;
                len += 1;
            }
        }
        SubExprs {
            arena,
            fixed: buf,
            fixed_len: len,
            fixed_pos: 0,
            rest,
            rest_pos: 0,
        }
    }

    fn empty(arena: &'a ExprArena) -> Self {
        Self::new(arena, &[], ExprRange::EMPTY)
    }
}

impl Iterator for SubExprs<'_> {
    type Item = ExprId;

    fn next(&mut self) -> Option<ExprId> {
        if self.fixed_pos < self.fixed_len {
            let id = self.fixed[self.fixed_pos as usize];
            self.fixed_pos += 1;
            return Some(id);
        }
        if (self.rest_pos as usize) < self.rest.len() {
            let id = self.arena.expr_list(self.rest)[self.rest_pos as usize];
            self.rest_pos += 1;
            return Some(id);
        }
        None
    }
}

/// Direct sub-expressions of `id`, each exactly once.
///
/// `AnonFun` yields nothing here: its children are statements, reachable
/// through [`stmt_sub_expressions`] / [`stmt_sub_blocks`] on its body.
pub fn sub_expressions(arena: &ExprArena, id: ExprId) -> SubExprs<'_> {
    match arena.expr(id).kind {
        ExprKind::Null | ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::AnonFun { .. } => {
            SubExprs::empty(arena)
        }
        ExprKind::Assign { target, value } => SubExprs::new(arena, &[target, value], ExprRange::EMPTY),
        ExprKind::Field { receiver, .. } => SubExprs::new(arena, &[receiver], ExprRange::EMPTY),
        ExprKind::Index { receiver, index } => {
            SubExprs::new(arena, &[receiver, index], ExprRange::EMPTY)
        }
        ExprKind::New { args, .. } => SubExprs::new(arena, &[], args),
        ExprKind::Call { callee, args } => SubExprs::new(arena, &[callee], args),
        ExprKind::Unary { operand, .. } => SubExprs::new(arena, &[operand], ExprRange::EMPTY),
        ExprKind::Binary { left, right, .. } => {
            SubExprs::new(arena, &[left, right], ExprRange::EMPTY)
        }
        ExprKind::PostIncrement(target) => SubExprs::new(arena, &[target], ExprRange::EMPTY),
        // Tuples participate like any other node so free-variable analysis
        // sees through them.
        ExprKind::Tuple(exprs) => SubExprs::new(arena, &[], exprs),
        ExprKind::Select {
            source, predicate, ..
        } => SubExprs::new(arena, &[source, predicate], ExprRange::EMPTY),
        ExprKind::MapEach {
            source, yield_expr, ..
        } => SubExprs::new(arena, &[source, yield_expr], ExprRange::EMPTY),
        ExprKind::Accumulate {
            init, source, step, ..
        } => SubExprs::new(arena, &[init, source, step], ExprRange::EMPTY),
        ExprKind::Reduce {
            source, combine, ..
        } => SubExprs::new(arena, &[source, combine], ExprRange::EMPTY),
    }
}

/// Direct child expressions of a statement (conditions, initializers,
/// sources, returned values).
pub fn stmt_sub_expressions(arena: &ExprArena, id: StmtId) -> SubExprs<'_> {
    match arena.stmt(id).kind {
        StmtKind::VarDecl { init, .. } => SubExprs::new(arena, &[init], ExprRange::EMPTY),
        StmtKind::Expr(e) => SubExprs::new(arena, &[e], ExprRange::EMPTY),
        StmtKind::Block(_) => SubExprs::empty(arena),
        StmtKind::If { cond, .. } => SubExprs::new(arena, &[cond], ExprRange::EMPTY),
        StmtKind::While { cond, .. } => SubExprs::new(arena, &[cond], ExprRange::EMPTY),
        StmtKind::ForEach { source, .. } => SubExprs::new(arena, &[source], ExprRange::EMPTY),
        StmtKind::Return(e) => SubExprs::new(arena, &[e], ExprRange::EMPTY),
    }
}

/// Nested statement blocks of a statement.
pub fn stmt_sub_blocks(arena: &ExprArena, id: StmtId) -> impl Iterator<Item = StmtRange> {
    let blocks: [StmtRange; 2] = match arena.stmt(id).kind {
        StmtKind::Block(body) => [body, StmtRange::EMPTY],
        StmtKind::If {
            then_block,
            else_block,
            ..
        } => [then_block, else_block],
        StmtKind::While { body, .. } | StmtKind::ForEach { body, .. } => {
            [body, StmtRange::EMPTY]
        }
        _ => [StmtRange::EMPTY, StmtRange::EMPTY],
    };
    blocks.into_iter().filter(|b| !b.is_empty())
}

/// Depth-first walk over an expression tree, calling `f` on every node
/// (the root included). Does not descend into `AnonFun` bodies.
pub fn for_each_expr(arena: &ExprArena, root: ExprId, f: &mut impl FnMut(ExprId)) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        f(id);
        stack.extend(sub_expressions(arena, id));
    }
}
