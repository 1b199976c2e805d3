//! Tree-walking interpreter for Heron expressions and statements.
//!
//! # Architecture
//!
//! - `Machine`: frame stack, return flag, scope lifecycle
//! - `evaluate_binary` / `evaluate_unary`: enum-based operator dispatch
//! - `sub_expressions`-driven free-variable analysis for closures
//! - comprehension drivers in `comprehensions`, including the parallel
//!   reduce
//!
//! # Arena threading
//!
//! Every function value carries the arena its body was parsed into.
//! The interpreter tracks the arena of the code it is currently
//! executing and swaps it around calls, so expression ids are always
//! resolved against their own arena. This is also what makes reduce
//! workers safe: each worker evaluates the combine body against the
//! same immutable arena through its own machine fork.

mod comprehensions;
mod free_vars;
mod function_call;
mod members;
mod scope_guard;

pub use scope_guard::{FramedInterpreter, ScopedInterpreter};

use heron_ir::{
    BinaryOp, ExprId, ExprKind, Literal, Name, SharedArena, StmtId, StmtRange, StringInterner,
};

use crate::config::EvalConfig;
use crate::diagnostics::CallStack;
use crate::environment::Machine;
use crate::errors::{
    name_already_defined, not_a_type, null_dereference, type_mismatch, EvalResult,
};
use crate::operators::evaluate_binary;
use crate::program::{ModuleId, Program};
use crate::render::render_expr;
use crate::unary_operators::evaluate_unary;
use crate::value::Value;

/// Pre-interned names the evaluator looks up on hot paths.
#[derive(Clone, Copy)]
pub(crate) struct EntryNames {
    pub(crate) constructor: Name,
    pub(crate) meta: Name,
    pub(crate) main: Name,
}

impl EntryNames {
    fn new(interner: &StringInterner) -> Self {
        Self {
            constructor: interner.intern("Constructor"),
            meta: interner.intern("Meta"),
            main: interner.intern("Main"),
        }
    }
}

/// Tree-walking interpreter.
///
/// Borrows the program descriptors and interner; owns its machine state.
/// Forking (for reduce workers) shares the borrows and forks the machine.
pub struct Interpreter<'a> {
    pub(crate) interner: &'a StringInterner,
    pub(crate) program: &'a Program,
    pub machine: Machine,
    /// Arena of the code currently executing; swapped around calls.
    pub(crate) arena: SharedArena,
    pub(crate) call_stack: CallStack,
    pub(crate) names: EntryNames,
}

impl<'a> Interpreter<'a> {
    /// Interpreter rooted at the global module.
    pub fn new(interner: &'a StringInterner, program: &'a Program, config: EvalConfig) -> Self {
        Self::with_module(interner, program, config, program.global_module())
    }

    /// Interpreter rooted at a specific module.
    pub fn with_module(
        interner: &'a StringInterner,
        program: &'a Program,
        config: EvalConfig,
        module: ModuleId,
    ) -> Self {
        Interpreter {
            interner,
            program,
            machine: Machine::new(config, module),
            arena: program.module(module).arena.clone(),
            call_stack: CallStack::new(),
            names: EntryNames::new(interner),
        }
    }

    /// Fork for a parallel worker: fresh machine and call stack over the
    /// same program, interner and arena.
    pub(crate) fn fork(&self) -> Interpreter<'a> {
        Interpreter {
            interner: self.interner,
            program: self.program,
            machine: self.machine.fork(),
            arena: self.arena.clone(),
            call_stack: CallStack::new(),
            names: self.names,
        }
    }

    /// Evaluate an expression to a value.
    ///
    /// Top-level entry point: frame and scope depths are restored whether
    /// evaluation succeeds or fails, and failures leave carrying the
    /// failing expression's text and a call-stack snapshot.
    pub fn eval(&mut self, arena: &SharedArena, id: ExprId) -> EvalResult {
        self.in_arena(arena.clone(), |interp| {
            let frames = interp.machine.frame_depth();
            let scopes = interp.machine.scope_depth();
            let result = interp.eval_expr(id);
            debug_assert_eq!(interp.machine.frame_depth(), frames);
            debug_assert_eq!(interp.machine.scope_depth(), scopes);
            result.map_err(|e| {
                let rendered = render_expr(interp.interner, &interp.arena, id);
                e.with_context(format!("`{rendered}`"))
                    .with_backtrace(interp.call_stack.capture(interp.interner))
            })
        })
    }

    /// Execute a statement block in a fresh scope.
    pub fn exec(&mut self, arena: &SharedArena, body: StmtRange) -> EvalResult<()> {
        self.in_arena(arena.clone(), |interp| {
            interp.with_scope(|interp| interp.exec_stmts(body))
        })
    }

    /// Run `f` with `arena` as the current arena, restoring the previous
    /// one afterwards.
    pub(crate) fn in_arena<T>(
        &mut self,
        arena: SharedArena,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let prev = std::mem::replace(&mut self.arena, arena);
        let result = f(self);
        self.arena = prev;
        result
    }

    // Expression evaluation

    pub(crate) fn eval_expr(&mut self, id: ExprId) -> EvalResult {
        let arena = self.arena.clone();
        match arena.expr(id).kind {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Literal(lit) => Ok(self.literal_value(lit)),
            ExprKind::Ident(name) => self.lookup_name(name),
            ExprKind::Assign { target, value } => {
                let v = self.eval_expr(value)?;
                self.assign_to(target, v.clone())?;
                Ok(v)
            }
            ExprKind::Field { receiver, field } => {
                let recv = self.eval_expr(receiver)?;
                if matches!(recv, Value::Null) {
                    return Err(null_dereference(
                        self.interner.lookup(field),
                        &render_expr(self.interner, &arena, receiver),
                    ));
                }
                self.get_member(&recv, field)
            }
            ExprKind::Index { receiver, index } => {
                let recv = self.eval_expr(receiver)?;
                let idx = self.eval_expr(index)?;
                recv.get_at_index(&idx)
            }
            ExprKind::New { type_name, args } => {
                let looked_up = self.lookup_name(type_name)?;
                let Value::Type(t) = looked_up else {
                    return Err(not_a_type(looked_up.type_name()));
                };
                let args = self.eval_list(args)?;
                self.instantiate(t, &args)
            }
            ExprKind::Call { callee, args } => {
                // Arguments first, left to right, then the callee.
                let args_v = self.eval_list(args)?;
                let callee_v = self.eval_expr(callee)?;
                let span = arena.expr(id).span;
                self.apply(&callee_v, &args_v, Some(span))
            }
            ExprKind::Unary { op, operand } => {
                let v = self.eval_expr(operand)?;
                evaluate_unary(v, op)
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                evaluate_binary(self.program, l, r, op)
            }
            ExprKind::AnonFun {
                params,
                ret_ty,
                body,
            } => self.make_closure(params, ret_ty, body),
            ExprKind::PostIncrement(target) => {
                let old = self.eval_expr(target)?;
                let bumped =
                    evaluate_binary(self.program, old.clone(), Value::Int(1), BinaryOp::Add)?;
                self.assign_to(target, bumped)?;
                Ok(old)
            }
            ExprKind::Tuple(exprs) => Ok(Value::list(self.eval_list(exprs)?)),
            ExprKind::Select {
                binding,
                source,
                predicate,
            } => self.eval_select(binding, source, predicate),
            ExprKind::MapEach {
                binding,
                source,
                yield_expr,
            } => self.eval_mapeach(binding, source, yield_expr),
            ExprKind::Accumulate {
                acc,
                init,
                each,
                source,
                step,
            } => self.eval_accumulate(acc, init, each, source, step),
            ExprKind::Reduce {
                left,
                right,
                source,
                combine,
            } => self.eval_reduce(left, right, source, combine),
        }
    }

    fn literal_value(&self, lit: Literal) -> Value {
        match lit {
            Literal::Int(n) => Value::Int(n),
            Literal::Float(bits) => Value::Float(f64::from_bits(bits)),
            Literal::Bool(b) => Value::Bool(b),
            Literal::Char(c) => Value::Char(c),
            Literal::Str(s) => Value::string(self.interner.lookup(s)),
        }
    }

    /// Evaluate an argument or element list, left to right.
    pub(crate) fn eval_list(&mut self, range: heron_ir::ExprRange) -> EvalResult<Vec<Value>> {
        let arena = self.arena.clone();
        let mut values = Vec::with_capacity(range.len());
        for &arg in arena.expr_list(range) {
            values.push(self.eval_expr(arg)?);
        }
        Ok(values)
    }

    /// Resolve a bare name: frame scopes, closure captures, the current
    /// receiver's fields and methods, then the module and global type
    /// tables.
    pub fn lookup_name(&mut self, name: Name) -> EvalResult {
        if let Some(v) = self.machine.get_var(name) {
            return Ok(v);
        }
        if let Some(receiver) = self.machine.frame().receiver.clone() {
            if let Some(v) = self.try_get_member(&receiver, name)? {
                return Ok(v);
            }
        }
        if let Some(t) = self
            .program
            .lookup_type(self.machine.frame().module, name)
        {
            return Ok(Value::Type(t));
        }
        Err(crate::errors::name_not_found(self.interner.lookup(name)))
    }

    /// Assign `value` to an lvalue expression.
    fn assign_to(&mut self, target: ExprId, value: Value) -> EvalResult<()> {
        let arena = self.arena.clone();
        match arena.expr(target).kind {
            ExprKind::Ident(name) => self.assign_name(name, value),
            ExprKind::Field { receiver, field } => {
                let recv = self.eval_expr(receiver)?;
                if matches!(recv, Value::Null) {
                    return Err(null_dereference(
                        self.interner.lookup(field),
                        &render_expr(self.interner, &arena, receiver),
                    ));
                }
                self.set_member(&recv, field, value)
            }
            ExprKind::Index { receiver, index } => {
                let recv = self.eval_expr(receiver)?;
                let idx = self.eval_expr(index)?;
                recv.set_at_index(&idx, value)
            }
            _ => Err(crate::errors::not_assignable("this expression")),
        }
    }

    /// Assign to a bare name: an existing variable binding in the current
    /// frame wins; otherwise a field of the current receiver.
    fn assign_name(&mut self, name: Name, value: Value) -> EvalResult<()> {
        if self.machine.set_var(name, value.clone()) {
            return Ok(());
        }
        if self.machine.frame().set_field(name, value) {
            return Ok(());
        }
        Err(crate::errors::not_assignable(&format!(
            "undeclared name `{}`",
            self.interner.lookup(name)
        )))
    }

    // Statement execution

    /// Execute the statements of `range` in order, stopping early when a
    /// return is propagating.
    pub(crate) fn exec_stmts(&mut self, range: StmtRange) -> EvalResult<()> {
        let arena = self.arena.clone();
        for &sid in arena.stmt_list(range) {
            if self.machine.should_exit_scope() {
                break;
            }
            self.exec_stmt(sid)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, id: StmtId) -> EvalResult<()> {
        let arena = self.arena.clone();
        match arena.stmt(id).kind {
            heron_ir::StmtKind::VarDecl { name, init } => {
                let v = if init.is_valid() {
                    self.eval_expr(init)?
                } else {
                    Value::Null
                };
                if !self.machine.add_var(name, v) {
                    return Err(name_already_defined(self.interner.lookup(name)));
                }
                Ok(())
            }
            heron_ir::StmtKind::Expr(e) => {
                self.eval_expr(e)?;
                Ok(())
            }
            heron_ir::StmtKind::Block(body) => self.with_scope(|i| i.exec_stmts(body)),
            heron_ir::StmtKind::If {
                cond,
                then_block,
                else_block,
            } => match self.eval_expr(cond)? {
                Value::Bool(true) => self.with_scope(|i| i.exec_stmts(then_block)),
                Value::Bool(false) => {
                    if else_block.is_empty() {
                        Ok(())
                    } else {
                        self.with_scope(|i| i.exec_stmts(else_block))
                    }
                }
                other => Err(type_mismatch("bool", other.type_name())),
            },
            heron_ir::StmtKind::While { cond, body } => {
                while !self.machine.should_exit_scope() {
                    match self.eval_expr(cond)? {
                        Value::Bool(true) => {}
                        Value::Bool(false) => break,
                        other => return Err(type_mismatch("bool", other.type_name())),
                    }
                    self.with_scope(|i| i.exec_stmts(body))?;
                }
                Ok(())
            }
            heron_ir::StmtKind::ForEach {
                binding,
                source,
                body,
            } => {
                let src = self.eval_expr(source)?;
                let items = self.seq_values(&src)?;
                self.with_scope(|i| {
                    let declared = i.machine.add_var(binding, Value::Null);
                    debug_assert!(declared, "fresh scope rejected loop binding");
                    for item in items {
                        if i.machine.should_exit_scope() {
                            break;
                        }
                        let assigned = i.machine.set_var(binding, item);
                        debug_assert!(assigned);
                        i.with_scope(|i| i.exec_stmts(body))?;
                    }
                    Ok(())
                })
            }
            heron_ir::StmtKind::Return(e) => {
                let v = if e.is_valid() {
                    self.eval_expr(e)?
                } else {
                    Value::Void
                };
                self.machine.return_value(v);
                Ok(())
            }
        }
    }

    /// Materialize a sequence value for iteration.
    pub(crate) fn seq_values(&self, v: &Value) -> EvalResult<Vec<Value>> {
        match v {
            Value::List(items) | Value::Array(items) => Ok(items.read().clone()),
            Value::Str(s) => Ok(s.chars().map(Value::Char).collect()),
            other => Err(type_mismatch("sequence", other.type_name())),
        }
    }
}
