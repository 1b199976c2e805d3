//! End-to-end evaluator tests.
//!
//! Tests construct ASTs directly through [`Builder`] (the parser is an
//! external collaborator) and evaluate them against a fresh program.

mod comprehension_tests;

use std::sync::Arc;

use heron_ir::{
    BinaryOp, Expr, ExprArena, ExprId, ExprKind, Literal, Name, Param, ParamRange, SharedArena,
    SharedInterner, Span, Stmt, StmtId, StmtKind, StmtRange, UnaryOp,
};

use crate::config::EvalConfig;
use crate::errors::EvalResult;
use crate::interpreter::Interpreter;
use crate::program::Program;

/// AST construction helper for tests.
pub(crate) struct Builder {
    pub interner: SharedInterner,
    pub arena: ExprArena,
}

impl Builder {
    pub fn new(interner: &SharedInterner) -> Self {
        Builder {
            interner: interner.clone(),
            arena: ExprArena::new(),
        }
    }

    pub fn n(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, Span::DUMMY))
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        self.arena.alloc_stmt(Stmt::new(kind, Span::DUMMY))
    }

    // Expressions

    pub fn null(&mut self) -> ExprId {
        self.expr(ExprKind::Null)
    }

    pub fn int(&mut self, n: i64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Int(n)))
    }

    pub fn float(&mut self, f: f64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::float(f)))
    }

    pub fn boolean(&mut self, b: bool) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Bool(b)))
    }

    pub fn chr(&mut self, c: char) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Char(c)))
    }

    pub fn string(&mut self, s: &str) -> ExprId {
        let name = self.n(s);
        self.expr(ExprKind::Literal(Literal::Str(name)))
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        let name = self.n(name);
        self.expr(ExprKind::Ident(name))
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.expr(ExprKind::Assign { target, value })
    }

    pub fn field(&mut self, receiver: ExprId, name: &str) -> ExprId {
        let field = self.n(name);
        self.expr(ExprKind::Field { receiver, field })
    }

    pub fn index(&mut self, receiver: ExprId, index: ExprId) -> ExprId {
        self.expr(ExprKind::Index { receiver, index })
    }

    pub fn new_object(&mut self, type_name: &str, args: &[ExprId]) -> ExprId {
        let type_name = self.n(type_name);
        let args = self.arena.alloc_expr_list(args);
        self.expr(ExprKind::New { type_name, args })
    }

    pub fn call(&mut self, callee: ExprId, args: &[ExprId]) -> ExprId {
        let args = self.arena.alloc_expr_list(args);
        self.expr(ExprKind::Call { callee, args })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn bin(&mut self, left: ExprId, op: BinaryOp, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn params(&mut self, names: &[&str]) -> ParamRange {
        let params: Vec<Param> = names
            .iter()
            .map(|s| Param {
                name: self.n(s),
                ty: Name::EMPTY,
            })
            .collect();
        self.arena.alloc_params(&params)
    }

    pub fn anon_fun(&mut self, params: &[&str], body: StmtRange) -> ExprId {
        let params = self.params(params);
        self.expr(ExprKind::AnonFun {
            params,
            ret_ty: Name::EMPTY,
            body,
        })
    }

    pub fn post_inc(&mut self, target: ExprId) -> ExprId {
        self.expr(ExprKind::PostIncrement(target))
    }

    pub fn tuple(&mut self, items: &[ExprId]) -> ExprId {
        let items = self.arena.alloc_expr_list(items);
        self.expr(ExprKind::Tuple(items))
    }

    pub fn select(&mut self, binding: &str, source: ExprId, predicate: ExprId) -> ExprId {
        let binding = self.n(binding);
        self.expr(ExprKind::Select {
            binding,
            source,
            predicate,
        })
    }

    pub fn mapeach(&mut self, binding: &str, source: ExprId, yield_expr: ExprId) -> ExprId {
        let binding = self.n(binding);
        self.expr(ExprKind::MapEach {
            binding,
            source,
            yield_expr,
        })
    }

    pub fn accumulate(
        &mut self,
        acc: &str,
        init: ExprId,
        each: &str,
        source: ExprId,
        step: ExprId,
    ) -> ExprId {
        let acc = self.n(acc);
        let each = self.n(each);
        self.expr(ExprKind::Accumulate {
            acc,
            init,
            each,
            source,
            step,
        })
    }

    pub fn reduce(&mut self, left: &str, right: &str, source: ExprId, combine: ExprId) -> ExprId {
        let left = self.n(left);
        let right = self.n(right);
        self.expr(ExprKind::Reduce {
            left,
            right,
            source,
            combine,
        })
    }

    /// Int list literal, as a tuple expression.
    pub fn int_list(&mut self, values: &[i64]) -> ExprId {
        let items: Vec<ExprId> = values.iter().map(|&v| self.int(v)).collect();
        self.tuple(&items)
    }

    // Statements

    pub fn var_decl(&mut self, name: &str, init: ExprId) -> StmtId {
        let name = self.n(name);
        self.stmt(StmtKind::VarDecl { name, init })
    }

    pub fn expr_stmt(&mut self, e: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(e))
    }

    pub fn ret(&mut self, e: ExprId) -> StmtId {
        self.stmt(StmtKind::Return(e))
    }

    pub fn ret_void(&mut self) -> StmtId {
        self.stmt(StmtKind::Return(ExprId::INVALID))
    }

    pub fn sif(&mut self, cond: ExprId, then_block: StmtRange, else_block: StmtRange) -> StmtId {
        self.stmt(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn swhile(&mut self, cond: ExprId, body: StmtRange) -> StmtId {
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn sforeach(&mut self, binding: &str, source: ExprId, body: StmtRange) -> StmtId {
        let binding = self.n(binding);
        self.stmt(StmtKind::ForEach {
            binding,
            source,
            body,
        })
    }

    pub fn body(&mut self, stmts: &[StmtId]) -> StmtRange {
        self.arena.alloc_stmt_list(stmts)
    }

    pub fn finish(self) -> SharedArena {
        Arc::new(self.arena)
    }
}

/// A fresh interner + built-ins-only program.
pub(crate) struct Ctx {
    pub interner: SharedInterner,
    pub program: Program,
}

impl Ctx {
    pub fn new() -> Self {
        let interner = SharedInterner::new();
        let program = Program::new(&interner);
        Ctx { interner, program }
    }

    /// Build one expression and evaluate it with the default config.
    pub fn eval(&self, build: impl FnOnce(&mut Builder) -> ExprId) -> EvalResult {
        self.eval_with_config(EvalConfig::default(), build)
    }

    pub fn eval_with_config(
        &self,
        config: EvalConfig,
        build: impl FnOnce(&mut Builder) -> ExprId,
    ) -> EvalResult {
        let mut builder = Builder::new(&self.interner);
        let root = build(&mut builder);
        let arena = builder.finish();
        let mut interp = Interpreter::new(&self.interner, &self.program, config);
        let result = interp.eval(&arena, root);
        // The machine must come back to its pre-eval depths on both paths.
        assert_eq!(interp.machine.frame_depth(), 1);
        assert_eq!(interp.machine.scope_depth(), 1);
        result
    }
}

/// Unwrap a List value into its items.
pub(crate) fn list_items(value: &crate::Value) -> Vec<crate::Value> {
    match value {
        crate::Value::List(items) => items.read().clone(),
        other => panic!("expected list, got {other:?}"),
    }
}

/// Unwrap an Array value into its items.
pub(crate) fn array_items(value: &crate::Value) -> Vec<crate::Value> {
    match value {
        crate::Value::Array(items) => items.read().clone(),
        other => panic!("expected array, got {other:?}"),
    }
}
