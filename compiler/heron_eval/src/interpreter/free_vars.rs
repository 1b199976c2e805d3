//! Free-variable analysis and closure construction.
//!
//! A name is free in a function body when it is used there but bound by
//! neither a formal parameter nor a local declaration (including loop
//! and comprehension binders). The analysis is purely static; closure
//! construction then snapshots the current value of every free name that
//! is bound in the enclosing environment. Names bound nowhere are left
//! to resolve against the module and global tables at call time.

use rustc_hash::FxHashSet;

use heron_ir::{
    sub_expressions, ExprArena, ExprId, ExprKind, Name, Param, ParamRange, StmtId, StmtKind,
    StmtRange,
};

use crate::errors::EvalResult;
use crate::shared::Heap;
use crate::value::{CapturedScope, FunctionValue, Value};

use super::Interpreter;

/// Names used but not bound within `body`, in first-use order.
pub(crate) fn free_variables(arena: &ExprArena, params: &[Param], body: StmtRange) -> Vec<Name> {
    let mut walker = FreeVars {
        arena,
        bound: vec![params.iter().map(|p| p.name).collect()],
        seen: FxHashSet::default(),
        free: Vec::new(),
    };
    walker.visit_stmts(body);
    walker.free
}

struct FreeVars<'a> {
    arena: &'a ExprArena,
    /// Binder sets, innermost last.
    bound: Vec<FxHashSet<Name>>,
    seen: FxHashSet<Name>,
    free: Vec<Name>,
}

impl FreeVars<'_> {
    fn is_bound(&self, name: Name) -> bool {
        self.bound.iter().any(|set| set.contains(&name))
    }

    fn bind(&mut self, name: Name) {
        self.bound
            .last_mut()
            .expect("binder stack is never empty")
            .insert(name);
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.bound.push(FxHashSet::default());
        f(self);
        self.bound.pop();
    }

    fn visit_stmts(&mut self, range: StmtRange) {
        let arena = self.arena;
        for &sid in arena.stmt_list(range) {
            self.visit_stmt(sid);
        }
    }

    fn visit_stmt(&mut self, id: StmtId) {
        match self.arena.stmt(id).kind {
            StmtKind::VarDecl { name, init } => {
                if init.is_valid() {
                    self.visit_expr(init);
                }
                // The initializer sees the outer binding; the name is
                // local from here on.
                self.bind(name);
            }
            StmtKind::Expr(e) => self.visit_expr(e),
            StmtKind::Block(body) => self.scoped(|w| w.visit_stmts(body)),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.visit_expr(cond);
                self.scoped(|w| w.visit_stmts(then_block));
                if !else_block.is_empty() {
                    self.scoped(|w| w.visit_stmts(else_block));
                }
            }
            StmtKind::While { cond, body } => {
                self.visit_expr(cond);
                self.scoped(|w| w.visit_stmts(body));
            }
            StmtKind::ForEach {
                binding,
                source,
                body,
            } => {
                self.visit_expr(source);
                self.scoped(|w| {
                    w.bind(binding);
                    w.visit_stmts(body);
                });
            }
            StmtKind::Return(e) => {
                if e.is_valid() {
                    self.visit_expr(e);
                }
            }
        }
    }

    fn visit_expr(&mut self, id: ExprId) {
        match self.arena.expr(id).kind {
            ExprKind::Ident(name) => {
                if !self.is_bound(name) && self.seen.insert(name) {
                    self.free.push(name);
                }
            }
            ExprKind::AnonFun { params, body, .. } => {
                let params: Vec<Name> =
                    self.arena.params(params).iter().map(|p| p.name).collect();
                self.scoped(|w| {
                    for p in params {
                        w.bind(p);
                    }
                    w.visit_stmts(body);
                });
            }
            ExprKind::Select {
                binding,
                source,
                predicate,
            } => {
                self.visit_expr(source);
                self.scoped(|w| {
                    w.bind(binding);
                    w.visit_expr(predicate);
                });
            }
            ExprKind::MapEach {
                binding,
                source,
                yield_expr,
            } => {
                self.visit_expr(source);
                self.scoped(|w| {
                    w.bind(binding);
                    w.visit_expr(yield_expr);
                });
            }
            ExprKind::Accumulate {
                acc,
                init,
                each,
                source,
                step,
            } => {
                self.visit_expr(init);
                self.visit_expr(source);
                self.scoped(|w| {
                    w.bind(acc);
                    w.bind(each);
                    w.visit_expr(step);
                });
            }
            ExprKind::Reduce {
                left,
                right,
                source,
                combine,
            } => {
                self.visit_expr(source);
                self.scoped(|w| {
                    w.bind(left);
                    w.bind(right);
                    w.visit_expr(combine);
                });
            }
            _ => {
                for child in sub_expressions(self.arena, id) {
                    self.visit_expr(child);
                }
            }
        }
    }
}

impl<'a> Interpreter<'a> {
    /// Evaluate an anonymous-function expression to a closure value.
    pub(crate) fn make_closure(
        &mut self,
        params: ParamRange,
        ret_ty: Name,
        body: StmtRange,
    ) -> EvalResult {
        let arena = self.arena.clone();
        let mut captured = CapturedScope::default();
        for name in free_variables(&arena, arena.params(params), body) {
            if let Some(v) = self.machine.get_var(name) {
                captured.insert(name, v);
            }
        }
        Ok(Value::Function(FunctionValue {
            name: Name::EMPTY,
            params,
            ret_ty,
            body,
            arena,
            module: self.machine.frame().module,
            receiver: None,
            captured: Heap::new(captured),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_ir::{Expr, Literal, Span, Stmt, StringInterner};

    struct Builder {
        arena: ExprArena,
    }

    impl Builder {
        fn new() -> Self {
            Builder {
                arena: ExprArena::new(),
            }
        }

        fn ident(&mut self, name: Name) -> ExprId {
            self.arena
                .alloc_expr(Expr::new(ExprKind::Ident(name), Span::DUMMY))
        }

        fn int(&mut self, n: i64) -> ExprId {
            self.arena
                .alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(n)), Span::DUMMY))
        }

        fn ret(&mut self, e: ExprId) -> StmtId {
            self.arena.alloc_stmt(Stmt::new(StmtKind::Return(e), Span::DUMMY))
        }

        fn block(&mut self, stmts: &[StmtId]) -> StmtRange {
            self.arena.alloc_stmt_list(stmts)
        }
    }

    #[test]
    fn parameter_is_not_free() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut b = Builder::new();
        let use_x = b.ident(x);
        let ret = b.ret(use_x);
        let body = b.block(&[ret]);
        let params = [Param { name: x, ty: Name::EMPTY }];
        assert!(free_variables(&b.arena, &params, body).is_empty());
    }

    #[test]
    fn unbound_use_is_free_once() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut b = Builder::new();
        let first = b.ident(x);
        let second = b.ident(x);
        let s1 = b.arena.alloc_stmt(Stmt::new(StmtKind::Expr(first), Span::DUMMY));
        let s2 = b.ret(second);
        let body = b.block(&[s1, s2]);
        assert_eq!(free_variables(&b.arena, &[], body), vec![x]);
    }

    #[test]
    fn local_declaration_binds_later_uses() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut b = Builder::new();
        let init = b.int(1);
        let decl = b
            .arena
            .alloc_stmt(Stmt::new(StmtKind::VarDecl { name: x, init }, Span::DUMMY));
        let use_x = b.ident(x);
        let ret = b.ret(use_x);
        let body = b.block(&[decl, ret]);
        assert!(free_variables(&b.arena, &[], body).is_empty());
    }

    #[test]
    fn initializer_sees_the_outer_binding() {
        // var x = x; -- the right-hand x refers to an enclosing x.
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let mut b = Builder::new();
        let init = b.ident(x);
        let decl = b
            .arena
            .alloc_stmt(Stmt::new(StmtKind::VarDecl { name: x, init }, Span::DUMMY));
        let body = b.block(&[decl]);
        assert_eq!(free_variables(&b.arena, &[], body), vec![x]);
    }

    #[test]
    fn comprehension_binders_are_not_free() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let xs = interner.intern("xs");
        let mut b = Builder::new();
        let source = b.ident(xs);
        let yield_expr = b.ident(x);
        let map = b.arena.alloc_expr(Expr::new(
            ExprKind::MapEach {
                binding: x,
                source,
                yield_expr,
            },
            Span::DUMMY,
        ));
        let ret = b.ret(map);
        let body = b.block(&[ret]);
        assert_eq!(free_variables(&b.arena, &[], body), vec![xs]);
    }

    #[test]
    fn foreach_binding_is_scoped_to_its_body() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let xs = interner.intern("xs");
        let mut b = Builder::new();
        let source = b.ident(xs);
        let use_x = b.ident(x);
        let inner = b.arena.alloc_stmt(Stmt::new(StmtKind::Expr(use_x), Span::DUMMY));
        let loop_body = b.block(&[inner]);
        let foreach = b.arena.alloc_stmt(Stmt::new(
            StmtKind::ForEach {
                binding: x,
                source,
                body: loop_body,
            },
            Span::DUMMY,
        ));
        // A use of x after the loop is free again.
        let trailing_x = b.ident(x);
        let trailing = b
            .arena
            .alloc_stmt(Stmt::new(StmtKind::Expr(trailing_x), Span::DUMMY));
        let body = b.block(&[foreach, trailing]);
        assert_eq!(free_variables(&b.arena, &[], body), vec![xs, x]);
    }
}
