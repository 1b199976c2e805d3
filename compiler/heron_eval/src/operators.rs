//! Binary operator dispatch.
//!
//! Direct enum-based dispatch keyed by the operand kinds. The type set is
//! closed, so pattern matching is preferred over trait objects: the
//! compiler checks exhaustiveness and the hot path stays branch-cheap.
//!
//! Dispatch order:
//!
//! 1. `is` / `as` go to the type machinery (right operand must be a type).
//! 2. A null operand routes to null's operators (`==` / `!=` only).
//! 3. Mixed Int/Float operands are promoted to Float.
//! 4. Same-kind dispatch; anything left is an incompatible pair.

use heron_ir::BinaryOp;

use crate::errors::{
    division_by_zero, incompatible_types, not_a_type, unsupported_operation, EvalResult,
};
use crate::program::Program;
use crate::value::Value;

/// Evaluate a binary operation over already-evaluated operands.
pub fn evaluate_binary(
    program: &Program,
    left: Value,
    right: Value,
    op: BinaryOp,
) -> EvalResult {
    match op {
        BinaryOp::Is => return eval_is(program, &left, &right),
        BinaryOp::As => return eval_as(program, left, &right),
        _ => {}
    }

    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return eval_null_binary(&left, &right, op);
    }

    let (left, right) = promote_numeric(left, right);

    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(*a, *b, op),
        (Value::Bool(a), Value::Bool(b)) => eval_bool_binary(*a, *b, op),
        (Value::Str(a), Value::Str(b)) => eval_string_binary(a, b, op),
        (Value::Char(a), Value::Char(b)) => eval_char_binary(*a, *b, op),
        (Value::List(_), Value::List(_)) | (Value::Array(_), Value::Array(_)) => {
            eval_equality_only(&left, &right, op, "sequences")
        }
        (Value::EnumMember(_), Value::EnumMember(_)) => {
            eval_equality_only(&left, &right, op, "enum members")
        }
        (Value::Instance(_), Value::Instance(_)) => {
            eval_equality_only(&left, &right, op, "instances")
        }
        (Value::Interface(_), Value::Interface(_)) => {
            eval_equality_only(&left, &right, op, "interface instances")
        }
        _ => Err(incompatible_types(
            op.symbol(),
            left.type_name(),
            right.type_name(),
        )),
    }
}

/// Promote a mixed Int/Float pair to Float. Int stays Int against Int.
fn promote_numeric(left: Value, right: Value) -> (Value, Value) {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) => (Value::Float(a as f64), Value::Float(b)),
        (Value::Float(a), Value::Int(b)) => (Value::Float(a), Value::Float(b as f64)),
        other => other,
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::Int(a.wrapping_add(b))),
        BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
        BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
        BinaryOp::Div => {
            if b == 0 {
                Err(division_by_zero())
            } else {
                Ok(Value::Int(a.wrapping_div(b)))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err(division_by_zero())
            } else {
                Ok(Value::Int(a.wrapping_rem(b)))
            }
        }
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        _ => Err(unsupported_operation(op.symbol(), "ints")),
    }
}

fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> EvalResult {
    use std::cmp::Ordering;
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        // IEEE 754: division by zero yields an infinity or NaN, not an error.
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Mod => Ok(Value::Float(a % b)),
        BinaryOp::Eq => Ok(Value::Bool(a.partial_cmp(&b) == Some(Ordering::Equal))),
        BinaryOp::NotEq => Ok(Value::Bool(a.partial_cmp(&b) != Some(Ordering::Equal))),
        BinaryOp::Lt => Ok(Value::Bool(a.partial_cmp(&b) == Some(Ordering::Less))),
        BinaryOp::LtEq => Ok(Value::Bool(matches!(
            a.partial_cmp(&b),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Value::Bool(a.partial_cmp(&b) == Some(Ordering::Greater))),
        BinaryOp::GtEq => Ok(Value::Bool(matches!(
            a.partial_cmp(&b),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        _ => Err(unsupported_operation(op.symbol(), "floats")),
    }
}

fn eval_bool_binary(a: bool, b: bool, op: BinaryOp) -> EvalResult {
    match op {
        // Both operands were already evaluated; there is no short-circuit.
        BinaryOp::And => Ok(Value::Bool(a && b)),
        BinaryOp::Or => Ok(Value::Bool(a || b)),
        BinaryOp::Xor => Ok(Value::Bool(a ^ b)),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        _ => Err(unsupported_operation(op.symbol(), "bools")),
    }
}

fn eval_string_binary(a: &str, b: &str, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::string(format!("{a}{b}"))),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        // Lexicographic.
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        _ => Err(unsupported_operation(op.symbol(), "strings")),
    }
}

fn eval_char_binary(a: char, b: char, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        // By Unicode scalar value.
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::LtEq => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::GtEq => Ok(Value::Bool(a >= b)),
        _ => Err(unsupported_operation(op.symbol(), "chars")),
    }
}

/// Kinds whose only operators are `==` and `!=`. The equality itself is
/// the kind's own: identity for instances, structural for enum members,
/// deep for sequences.
fn eval_equality_only(left: &Value, right: &Value, op: BinaryOp, kind: &'static str) -> EvalResult {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        _ => Err(unsupported_operation(op.symbol(), kind)),
    }
}

/// Null's operators: `==` and `!=` against any value.
fn eval_null_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let both_null = matches!(left, Value::Null) && matches!(right, Value::Null);
    match op {
        BinaryOp::Eq => Ok(Value::Bool(both_null)),
        BinaryOp::NotEq => Ok(Value::Bool(!both_null)),
        _ => Err(unsupported_operation(op.symbol(), "null")),
    }
}

fn eval_is(program: &Program, left: &Value, right: &Value) -> EvalResult {
    let Value::Type(t) = right else {
        return Err(not_a_type(right.type_name()));
    };
    Ok(Value::Bool(program.is_compatible(*t, left.unwrap_any())))
}

fn eval_as(program: &Program, left: Value, right: &Value) -> EvalResult {
    let Value::Type(t) = right else {
        return Err(not_a_type(right.type_name()));
    };
    Ok(program.cast(*t, left).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_ir::SharedInterner;

    fn program() -> (SharedInterner, Program) {
        let interner = SharedInterner::new();
        let program = Program::new(&interner);
        (interner, program)
    }

    fn eval(p: &Program, l: Value, r: Value, op: BinaryOp) -> EvalResult {
        evaluate_binary(p, l, r, op)
    }

    #[test]
    fn int_arithmetic() {
        let (_, p) = program();
        assert_eq!(
            eval(&p, Value::Int(2), Value::Int(3), BinaryOp::Add).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            eval(&p, Value::Int(7), Value::Int(2), BinaryOp::Div).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            eval(&p, Value::Int(7), Value::Int(2), BinaryOp::Mod).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn int_division_by_zero_fails() {
        let (_, p) = program();
        assert!(eval(&p, Value::Int(1), Value::Int(0), BinaryOp::Div).is_err());
        assert!(eval(&p, Value::Int(1), Value::Int(0), BinaryOp::Mod).is_err());
    }

    #[test]
    fn float_division_by_zero_follows_ieee() {
        let (_, p) = program();
        let inf = eval(&p, Value::Float(1.0), Value::Float(0.0), BinaryOp::Div).unwrap();
        assert_eq!(inf, Value::Float(f64::INFINITY));
        let nan = eval(&p, Value::Float(0.0), Value::Float(0.0), BinaryOp::Div).unwrap();
        assert!(matches!(nan, Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn mixed_numeric_promotes_to_float() {
        let (_, p) = program();
        for op in [
            BinaryOp::Add,
            BinaryOp::Sub,
            BinaryOp::Mul,
            BinaryOp::Div,
            BinaryOp::Mod,
            BinaryOp::Lt,
            BinaryOp::Gt,
            BinaryOp::LtEq,
            BinaryOp::GtEq,
            BinaryOp::Eq,
            BinaryOp::NotEq,
        ] {
            let mixed = eval(&p, Value::Int(3), Value::Float(2.0), op).unwrap();
            let promoted = eval(&p, Value::Float(3.0), Value::Float(2.0), op).unwrap();
            assert_eq!(mixed, promoted, "op {op}");
            let mixed = eval(&p, Value::Float(2.0), Value::Int(3), op).unwrap();
            let promoted = eval(&p, Value::Float(2.0), Value::Float(3.0), op).unwrap();
            assert_eq!(mixed, promoted, "op {op}");
        }
    }

    #[test]
    fn int_int_stays_int() {
        let (_, p) = program();
        assert_eq!(
            eval(&p, Value::Int(7), Value::Int(2), BinaryOp::Div).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn string_concatenation_and_comparison() {
        let (_, p) = program();
        assert_eq!(
            eval(&p, Value::string("ab"), Value::string("c"), BinaryOp::Add).unwrap(),
            Value::string("abc")
        );
        assert_eq!(
            eval(&p, Value::string("a"), Value::string("b"), BinaryOp::Lt).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn char_requires_char() {
        let (_, p) = program();
        assert_eq!(
            eval(&p, Value::Char('a'), Value::Char('b'), BinaryOp::Lt).unwrap(),
            Value::Bool(true)
        );
        assert!(eval(&p, Value::Char('a'), Value::string("a"), BinaryOp::Eq).is_err());
    }

    #[test]
    fn bool_logic_has_no_other_ops() {
        let (_, p) = program();
        assert_eq!(
            eval(&p, Value::Bool(true), Value::Bool(false), BinaryOp::Xor).unwrap(),
            Value::Bool(true)
        );
        assert!(eval(&p, Value::Bool(true), Value::Bool(false), BinaryOp::Add).is_err());
    }

    #[test]
    fn null_equality_against_anything() {
        let (_, p) = program();
        assert_eq!(
            eval(&p, Value::Null, Value::Null, BinaryOp::Eq).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval(&p, Value::Null, Value::Int(1), BinaryOp::Eq).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            eval(&p, Value::Int(1), Value::Null, BinaryOp::NotEq).unwrap(),
            Value::Bool(true)
        );
        assert!(eval(&p, Value::Null, Value::Int(1), BinaryOp::Add).is_err());
    }

    #[test]
    fn incompatible_pairs_are_rejected() {
        let (_, p) = program();
        assert!(eval(&p, Value::Int(1), Value::Bool(true), BinaryOp::Add).is_err());
        assert!(eval(&p, Value::Int(1), Value::string("1"), BinaryOp::Eq).is_err());
    }

    #[test]
    fn is_requires_a_type_on_the_right() {
        let (_, p) = program();
        assert!(eval(&p, Value::Int(1), Value::Int(2), BinaryOp::Is).is_err());
    }

    #[test]
    fn is_and_as_agree() {
        use crate::program::{PrimitiveType, TypeRef};
        let (_, p) = program();
        let int_ty = Value::Type(TypeRef::Primitive(PrimitiveType::Int));
        let values = [
            Value::Int(1),
            Value::Float(1.5),
            Value::string("s"),
            Value::any(Value::Int(2)),
        ];
        for v in values {
            let is = eval(&p, v.clone(), int_ty.clone(), BinaryOp::Is).unwrap();
            let as_ = eval(&p, v, int_ty.clone(), BinaryOp::As).unwrap();
            match is {
                Value::Bool(true) => assert_ne!(as_, Value::Null),
                Value::Bool(false) => assert_eq!(as_, Value::Null),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn as_any_wraps_and_unwraps() {
        use crate::program::{PrimitiveType, TypeRef};
        let (_, p) = program();
        let any_ty = Value::Type(TypeRef::Primitive(PrimitiveType::Any));
        let wrapped = eval(&p, Value::Int(4), any_ty, BinaryOp::As).unwrap();
        assert!(matches!(wrapped, Value::Any(_)));
        let int_ty = Value::Type(TypeRef::Primitive(PrimitiveType::Int));
        let unwrapped = eval(&p, wrapped, int_ty, BinaryOp::As).unwrap();
        assert_eq!(unwrapped, Value::Int(4));
    }

    #[test]
    fn sequences_compare_deeply_but_only_for_equality() {
        let (_, p) = program();
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(eval(&p, a.clone(), b, BinaryOp::Eq).unwrap(), Value::Bool(true));
        let c = Value::list(vec![Value::Int(9)]);
        assert!(eval(&p, a, c, BinaryOp::Lt).is_err());
    }
}
