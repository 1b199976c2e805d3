//! Unary operator dispatch.

use heron_ir::UnaryOp;

use crate::errors::{unsupported_operation, EvalResult};
use crate::value::Value;

/// Evaluate a unary operation over an already-evaluated operand.
pub fn evaluate_unary(operand: Value, op: UnaryOp) -> EvalResult {
    match (op, &operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        _ => Err(unsupported_operation(op.symbol(), operand.type_name())),
    }
}
