//! Function application.
//!
//! Calling a function pushes a fresh frame (the caller's locals become
//! invisible), seeds it with the closure's captured snapshot, binds the
//! formal parameters in the frame's base scope, executes the body, and
//! consumes the machine's pending return. Frame and arena are restored
//! on every exit path.

use heron_ir::Span;

use crate::diagnostics::CallFrame;
use crate::environment::Frame;
use crate::errors::{arity_mismatch, name_already_defined, not_callable, EvalResult};
use crate::value::{FunctionValue, Value};

use super::Interpreter;

impl<'a> Interpreter<'a> {
    /// Apply a callable to already-evaluated arguments.
    pub fn apply(
        &mut self,
        callee: &Value,
        args: &[Value],
        span: Option<Span>,
    ) -> EvalResult {
        match callee {
            Value::Function(f) => self.call_function(f, args, span),
            other => Err(not_callable(other.type_name())),
        }
    }

    pub(crate) fn call_function(
        &mut self,
        f: &FunctionValue,
        args: &[Value],
        span: Option<Span>,
    ) -> EvalResult {
        if args.len() != f.arity() {
            return Err(arity_mismatch(self.function_label(f), f.arity(), args.len()));
        }
        tracing::trace!(
            function = self.function_label(f),
            args = args.len(),
            "call"
        );

        self.call_stack.push(CallFrame {
            name: f.name,
            call_span: span,
        });
        let frame = Frame::for_call(
            f.name,
            f.module,
            f.receiver.as_deref().cloned(),
            f.captured.clone(),
        );
        let body = f.body;
        let params = f.params;
        let result = self.in_arena(f.arena.clone(), |interp| {
            interp.with_frame(frame, |interp| {
                let arena = interp.arena.clone();
                for (param, arg) in arena.params(params).iter().zip(args) {
                    if !interp.machine.add_var(param.name, arg.clone()) {
                        return Err(name_already_defined(interp.interner.lookup(param.name)));
                    }
                }
                interp.exec_stmts(body)?;
                Ok(interp.machine.take_return().unwrap_or(Value::Void))
            })
        });
        self.call_stack.pop();
        result
    }

    fn function_label(&self, f: &FunctionValue) -> &'a str {
        if f.name.is_empty() {
            "<anonymous>"
        } else {
            self.interner.lookup(f.name)
        }
    }
}
