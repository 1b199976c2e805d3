//! Comprehension drivers: select, mapeach, accumulate, reduce.
//!
//! The first three iterate their source in order under a guarded scope.
//! Reduce is the odd one out: a partitioned parallel fold over machine
//! forks. Its user contract is that the combine expression is
//! associative and pure; the merge folds chunk results in chunk order,
//! which is exactly what makes associativity sufficient.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use heron_ir::{ExprId, Name};

use crate::errors::{internal, name_already_defined, type_mismatch, EvalError, EvalResult};
use crate::value::Value;

use super::Interpreter;

impl<'a> Interpreter<'a> {
    /// `select (x from source) where predicate`
    pub(crate) fn eval_select(
        &mut self,
        binding: Name,
        source: ExprId,
        predicate: ExprId,
    ) -> EvalResult {
        let src = self.eval_expr(source)?;
        let items = self.seq_values(&src)?;
        self.with_scope(|interp| {
            interp.declare_binder(binding, Value::Null)?;
            let mut kept = Vec::new();
            for item in items {
                interp.rebind(binding, item.clone());
                match interp.eval_expr(predicate)? {
                    Value::Bool(true) => kept.push(item),
                    Value::Bool(false) => {}
                    other => return Err(type_mismatch("bool", other.type_name())),
                }
            }
            Ok(Value::list(kept))
        })
    }

    /// `mapeach (x in source) yield`
    pub(crate) fn eval_mapeach(
        &mut self,
        binding: Name,
        source: ExprId,
        yield_expr: ExprId,
    ) -> EvalResult {
        let src = self.eval_expr(source)?;
        let items = self.seq_values(&src)?;
        self.with_scope(|interp| {
            interp.declare_binder(binding, Value::Null)?;
            let mut mapped = Vec::with_capacity(items.len());
            for item in items {
                interp.rebind(binding, item);
                mapped.push(interp.eval_expr(yield_expr)?);
            }
            Ok(Value::list(mapped))
        })
    }

    /// `accumulate (acc = init forall x in source) step`
    pub(crate) fn eval_accumulate(
        &mut self,
        acc: Name,
        init: ExprId,
        each: Name,
        source: ExprId,
        step: ExprId,
    ) -> EvalResult {
        let init_v = self.eval_expr(init)?;
        let src = self.eval_expr(source)?;
        let items = self.seq_values(&src)?;
        self.with_scope(|interp| {
            interp.declare_binder(acc, init_v.clone())?;
            interp.declare_binder(each, Value::Null)?;
            let mut current = init_v;
            for item in items {
                interp.rebind(each, item);
                current = interp.eval_expr(step)?;
                interp.rebind(acc, current.clone());
            }
            Ok(current)
        })
    }

    /// `reduce (a, b in source) combine`: the parallel associative fold.
    ///
    /// Empty source yields an empty List (the one non-Array result);
    /// otherwise the index range is partitioned into at most
    /// `max_threads` chunks, each worker left-folds its chunk on a
    /// machine fork, and the chunk results fold into one value in chunk
    /// order after the join. The result is a one-element Array.
    pub(crate) fn eval_reduce(
        &mut self,
        left: Name,
        right: Name,
        source: ExprId,
        combine: ExprId,
    ) -> EvalResult {
        let src = self.eval_expr(source)?;
        let items = self.seq_values(&src)?;
        if items.is_empty() {
            return Ok(Value::list(Vec::new()));
        }

        let workers = self.machine.config().max_threads.max(1).min(items.len());
        if workers <= 1 {
            let mut acc = items[0].clone();
            for item in &items[1..] {
                acc = self.eval_combine(left, right, combine, acc, item.clone())?;
            }
            return Ok(Value::array(vec![acc]));
        }

        let chunk_len = items.len().div_ceil(workers);
        let chunk_count = items.len().div_ceil(chunk_len);
        tracing::debug!(
            items = items.len(),
            workers,
            chunk_len,
            "parallel reduce"
        );

        // Each worker left-folds its chunk into its slot; after the join
        // the slots fold in chunk order. Preserving chunk order is what
        // lets the associativity contract (and not commutativity)
        // guarantee the sequential-fold result.
        let slots: Mutex<Vec<Option<Value>>> = Mutex::new(vec![None; chunk_count]);
        let failure: Mutex<Option<EvalError>> = Mutex::new(None);
        let failed = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for (chunk_idx, chunk) in items.chunks(chunk_len).enumerate() {
                let mut worker = self.fork();
                let (slots, failure, failed) = (&slots, &failure, &failed);
                scope.spawn(move || {
                    let mut local = chunk[0].clone();
                    for item in &chunk[1..] {
                        if failed.load(Ordering::Relaxed) {
                            return;
                        }
                        match worker.eval_combine(left, right, combine, local, item.clone()) {
                            Ok(v) => local = v,
                            Err(e) => {
                                record_failure(failure, failed, e);
                                return;
                            }
                        }
                    }
                    slots.lock()[chunk_idx] = Some(local);
                });
            }
        });

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        let mut merged: Option<Value> = None;
        for slot in slots.into_inner() {
            let chunk_result = slot.ok_or_else(|| internal("parallel reduce lost a chunk"))?;
            merged = Some(match merged {
                None => chunk_result,
                Some(acc) => self.eval_combine(left, right, combine, acc, chunk_result)?,
            });
        }
        match merged {
            Some(v) => Ok(Value::array(vec![v])),
            None => Err(internal("parallel reduce produced no chunks")),
        }
    }

    /// One combine application: `combine` with `left := a, right := b` in
    /// a fresh scope.
    pub(crate) fn eval_combine(
        &mut self,
        left: Name,
        right: Name,
        combine: ExprId,
        a: Value,
        b: Value,
    ) -> EvalResult {
        self.with_scope(|interp| {
            interp.declare_binder(left, a)?;
            interp.declare_binder(right, b)?;
            interp.eval_expr(combine)
        })
    }

    fn declare_binder(&mut self, name: Name, value: Value) -> EvalResult<()> {
        if self.machine.add_var(name, value) {
            Ok(())
        } else {
            Err(name_already_defined(self.interner.lookup(name)))
        }
    }

    fn rebind(&mut self, name: Name, value: Value) {
        let assigned = self.machine.set_var(name, value);
        debug_assert!(assigned, "comprehension binder vanished from scope");
    }
}

/// First failure wins; later ones are dropped.
fn record_failure(failure: &Mutex<Option<EvalError>>, failed: &AtomicBool, err: EvalError) {
    let mut slot = failure.lock();
    if slot.is_none() {
        *slot = Some(err);
    }
    failed.store(true, Ordering::Relaxed);
}
