//! Comprehension operators: select, mapeach, accumulate, reduce.

use heron_ir::BinaryOp;

use super::{array_items, list_items, Ctx};
use crate::config::EvalConfig;
use crate::errors::EvalErrorKind;
use crate::value::Value;

#[test]
fn select_keeps_matching_items_in_order() {
    // select (x from [1,2,3,4,5]) where x % 2 == 0
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let src = b.int_list(&[1, 2, 3, 4, 5]);
            let x = b.ident("x");
            let two = b.int(2);
            let rem = b.bin(x, BinaryOp::Mod, two);
            let zero = b.int(0);
            let pred = b.bin(rem, BinaryOp::Eq, zero);
            b.select("x", src, pred)
        })
        .unwrap();
    assert_eq!(list_items(&result), vec![Value::Int(2), Value::Int(4)]);
}

#[test]
fn select_requires_a_bool_predicate() {
    let ctx = Ctx::new();
    let err = ctx
        .eval(|b| {
            let src = b.int_list(&[1]);
            let pred = b.int(1);
            b.select("x", src, pred)
        })
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::TypeMismatch);
}

#[test]
fn mapeach_transforms_in_order() {
    // mapeach (x in [1,2,3]) x * x
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let src = b.int_list(&[1, 2, 3]);
            let x1 = b.ident("x");
            let x2 = b.ident("x");
            let sq = b.bin(x1, BinaryOp::Mul, x2);
            b.mapeach("x", src, sq)
        })
        .unwrap();
    assert_eq!(
        list_items(&result),
        vec![Value::Int(1), Value::Int(4), Value::Int(9)]
    );
}

#[test]
fn mapeach_over_empty_source_is_empty() {
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let src = b.int_list(&[]);
            let x = b.ident("x");
            b.mapeach("x", src, x)
        })
        .unwrap();
    assert!(list_items(&result).is_empty());
}

#[test]
fn accumulate_is_a_left_fold() {
    // accumulate (r = 0 forall x in [1,2,3,4]) r + x
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let zero = b.int(0);
            let src = b.int_list(&[1, 2, 3, 4]);
            let r = b.ident("r");
            let x = b.ident("x");
            let step = b.bin(r, BinaryOp::Add, x);
            b.accumulate("r", zero, "x", src, step)
        })
        .unwrap();
    assert_eq!(result, Value::Int(10));
}

#[test]
fn accumulate_observes_fold_order() {
    // Non-commutative step over strings pins the left-fold order:
    // accumulate (r = "" forall x in ["a","b","c"]) r + x == "abc"
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let init = b.string("");
            let a = b.string("a");
            let bb = b.string("b");
            let c = b.string("c");
            let src = b.tuple(&[a, bb, c]);
            let r = b.ident("r");
            let x = b.ident("x");
            let step = b.bin(r, BinaryOp::Add, x);
            b.accumulate("r", init, "x", src, step)
        })
        .unwrap();
    assert_eq!(result, Value::string("abc"));
}

#[test]
fn accumulate_over_empty_source_yields_init() {
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let init = b.int(41);
            let src = b.int_list(&[]);
            let r = b.ident("r");
            let x = b.ident("x");
            let step = b.bin(r, BinaryOp::Add, x);
            b.accumulate("r", init, "x", src, step)
        })
        .unwrap();
    assert_eq!(result, Value::Int(41));
}

fn reduce_sum(ctx: &Ctx, values: &[i64], max_threads: usize) -> crate::errors::EvalResult {
    let config = EvalConfig {
        max_threads,
        ..EvalConfig::default()
    };
    ctx.eval_with_config(config, |b| {
        let src = b.int_list(values);
        let a = b.ident("a");
        let bb = b.ident("b");
        let combine = b.bin(a, BinaryOp::Add, bb);
        b.reduce("a", "b", src, combine)
    })
}

#[test]
fn reduce_sums_into_a_singleton_array() {
    let ctx = Ctx::new();
    let result = reduce_sum(&ctx, &[1, 2, 3, 4, 5, 6, 7, 8], 4).unwrap();
    assert_eq!(array_items(&result), vec![Value::Int(36)]);
}

#[test]
fn reduce_empty_source_yields_an_empty_list() {
    let ctx = Ctx::new();
    let result = reduce_sum(&ctx, &[], 4).unwrap();
    assert!(list_items(&result).is_empty());
}

#[test]
fn reduce_single_element_yields_it_unchanged() {
    let ctx = Ctx::new();
    let result = reduce_sum(&ctx, &[99], 4).unwrap();
    assert_eq!(array_items(&result), vec![Value::Int(99)]);
}

#[test]
fn reduce_matches_sequential_fold_for_every_partitioning() {
    let ctx = Ctx::new();
    let values: Vec<i64> = (1..=23).collect();
    let expected = reduce_sum(&ctx, &values, 1).unwrap();
    for workers in 2..=8 {
        let parallel = reduce_sum(&ctx, &values, workers).unwrap();
        assert_eq!(
            array_items(&parallel),
            array_items(&expected),
            "workers = {workers}"
        );
    }
}

#[test]
fn reduce_respects_order_for_associative_non_commutative_combine() {
    // String concatenation is associative but not commutative; the
    // partitioned fold must still produce the in-order result.
    let ctx = Ctx::new();
    for workers in [1, 2, 3, 5, 8] {
        let config = EvalConfig {
            max_threads: workers,
            ..EvalConfig::default()
        };
        let result = ctx
            .eval_with_config(config, |b| {
                let parts: Vec<_> = ["a", "b", "c", "d", "e", "f", "g", "h"]
                    .iter()
                    .map(|s| b.string(s))
                    .collect();
                let src = b.tuple(&parts);
                let a = b.ident("a");
                let bb = b.ident("b");
                let combine = b.bin(a, BinaryOp::Add, bb);
                b.reduce("a", "b", src, combine)
            })
            .unwrap();
        assert_eq!(
            array_items(&result),
            vec![Value::string("abcdefgh")],
            "workers = {workers}"
        );
    }
}

#[test]
fn reduce_worker_failure_aborts_and_propagates() {
    // Division by zero inside the combine, far enough into the source
    // that several chunks exist.
    let ctx = Ctx::new();
    let config = EvalConfig {
        max_threads: 4,
        ..EvalConfig::default()
    };
    let err = ctx
        .eval_with_config(config, |b| {
            let src = b.int_list(&[1, 0, 3, 0, 5, 0, 7, 0]);
            let a = b.ident("a");
            let bb = b.ident("b");
            let combine = b.bin(a, BinaryOp::Div, bb);
            b.reduce("a", "b", src, combine)
        })
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
}

#[test]
fn comprehension_binders_do_not_leak() {
    // The binder is scoped to the comprehension; using it afterwards is
    // NameNotFound.
    let ctx = Ctx::new();
    let err = ctx
        .eval(|b| {
            let src = b.int_list(&[1]);
            let x = b.ident("x");
            let map = b.mapeach("x", src, x);
            let map_stmt = b.expr_stmt(map);
            let leak = b.ident("x");
            let ret = b.ret(leak);
            let body = b.body(&[map_stmt, ret]);
            let f = b.anon_fun(&[], body);
            b.call(f, &[])
        })
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::NameNotFound);
}

#[test]
fn comprehensions_iterate_strings_as_chars() {
    let ctx = Ctx::new();
    let result = ctx
        .eval(|b| {
            let src = b.string("ab");
            let x = b.ident("x");
            b.mapeach("x", src, x)
        })
        .unwrap();
    assert_eq!(
        list_items(&result),
        vec![Value::Char('a'), Value::Char('b')]
    );
}

#[test]
fn non_sequence_source_is_a_type_mismatch() {
    let ctx = Ctx::new();
    let err = ctx
        .eval(|b| {
            let src = b.int(1);
            let x = b.ident("x");
            b.mapeach("x", src, x)
        })
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::TypeMismatch);
}
