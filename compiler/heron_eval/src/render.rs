//! Compact expression rendering for diagnostics.
//!
//! Failure messages quote the failing expression; this printer
//! reconstructs a readable approximation of the surface syntax from the
//! AST. It is for humans, not for re-parsing.

use heron_ir::{ExprArena, ExprId, ExprKind, Literal, StringInterner};

/// Render an expression to compact surface-like text.
pub fn render_expr(interner: &StringInterner, arena: &ExprArena, id: ExprId) -> String {
    let mut out = String::new();
    write_expr(interner, arena, id, &mut out);
    out
}

fn write_expr(interner: &StringInterner, arena: &ExprArena, id: ExprId, out: &mut String) {
    use std::fmt::Write;

    let w = |interner, arena, id, out: &mut String| write_expr(interner, arena, id, out);

    match arena.expr(id).kind {
        ExprKind::Null => out.push_str("null"),
        ExprKind::Literal(lit) => match lit {
            Literal::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Literal::Float(bits) => {
                let _ = write!(out, "{}", f64::from_bits(bits));
            }
            Literal::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Literal::Char(c) => {
                let _ = write!(out, "'{c}'");
            }
            Literal::Str(s) => {
                let _ = write!(out, "\"{}\"", interner.lookup(s));
            }
        },
        ExprKind::Ident(name) => out.push_str(interner.lookup(name)),
        ExprKind::Assign { target, value } => {
            w(interner, arena, target, out);
            out.push_str(" = ");
            w(interner, arena, value, out);
        }
        ExprKind::Field { receiver, field } => {
            w(interner, arena, receiver, out);
            out.push('.');
            out.push_str(interner.lookup(field));
        }
        ExprKind::Index { receiver, index } => {
            w(interner, arena, receiver, out);
            out.push('[');
            w(interner, arena, index, out);
            out.push(']');
        }
        ExprKind::New { type_name, args } => {
            out.push_str("new ");
            out.push_str(interner.lookup(type_name));
            write_args(interner, arena, arena.expr_list(args), out);
        }
        ExprKind::Call { callee, args } => {
            w(interner, arena, callee, out);
            write_args(interner, arena, arena.expr_list(args), out);
        }
        ExprKind::Unary { op, operand } => {
            out.push_str(op.symbol());
            w(interner, arena, operand, out);
        }
        ExprKind::Binary { op, left, right } => {
            w(interner, arena, left, out);
            let _ = write!(out, " {} ", op.symbol());
            w(interner, arena, right, out);
        }
        ExprKind::AnonFun { params, .. } => {
            out.push_str("function (");
            for (i, p) in arena.params(params).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(interner.lookup(p.name));
            }
            out.push_str(") { ... }");
        }
        ExprKind::PostIncrement(target) => {
            w(interner, arena, target, out);
            out.push_str("++");
        }
        ExprKind::Tuple(exprs) => {
            out.push('[');
            for (i, &e) in arena.expr_list(exprs).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                w(interner, arena, e, out);
            }
            out.push(']');
        }
        ExprKind::Select {
            binding,
            source,
            predicate,
        } => {
            let _ = write!(out, "select ({} from ", interner.lookup(binding));
            w(interner, arena, source, out);
            out.push_str(") where ");
            w(interner, arena, predicate, out);
        }
        ExprKind::MapEach {
            binding,
            source,
            yield_expr,
        } => {
            let _ = write!(out, "mapeach ({} in ", interner.lookup(binding));
            w(interner, arena, source, out);
            out.push_str(") ");
            w(interner, arena, yield_expr, out);
        }
        ExprKind::Accumulate {
            acc,
            init,
            each,
            source,
            step,
        } => {
            let _ = write!(out, "accumulate ({} = ", interner.lookup(acc));
            w(interner, arena, init, out);
            let _ = write!(out, " forall {} in ", interner.lookup(each));
            w(interner, arena, source, out);
            out.push_str(") ");
            w(interner, arena, step, out);
        }
        ExprKind::Reduce {
            left,
            right,
            source,
            combine,
        } => {
            let _ = write!(
                out,
                "reduce ({}, {} in ",
                interner.lookup(left),
                interner.lookup(right)
            );
            w(interner, arena, source, out);
            out.push_str(") ");
            w(interner, arena, combine, out);
        }
    }
}

fn write_args(
    interner: &StringInterner,
    arena: &ExprArena,
    args: &[ExprId],
    out: &mut String,
) {
    out.push('(');
    for (i, &arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(interner, arena, arg, out);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_ir::{BinaryOp, Expr, ExprKind, Span, StringInterner};

    #[test]
    fn renders_nested_binary() {
        let interner = StringInterner::new();
        let mut arena = ExprArena::new();
        let one = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(1)), Span::DUMMY));
        let two = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(2)), Span::DUMMY));
        let three = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(3)), Span::DUMMY));
        let mul = arena.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Mul,
                left: two,
                right: three,
            },
            Span::DUMMY,
        ));
        let add = arena.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: one,
                right: mul,
            },
            Span::DUMMY,
        ));
        assert_eq!(render_expr(&interner, &arena, add), "1 + 2 * 3");
    }

    #[test]
    fn renders_call_and_field() {
        let interner = StringInterner::new();
        let mut arena = ExprArena::new();
        let obj = arena.alloc_expr(Expr::new(
            ExprKind::Ident(interner.intern("point")),
            Span::DUMMY,
        ));
        let field = arena.alloc_expr(Expr::new(
            ExprKind::Field {
                receiver: obj,
                field: interner.intern("scale"),
            },
            Span::DUMMY,
        ));
        let arg = arena.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(2)), Span::DUMMY));
        let args = arena.alloc_expr_list(&[arg]);
        let call = arena.alloc_expr(Expr::new(
            ExprKind::Call {
                callee: field,
                args,
            },
            Span::DUMMY,
        ));
        assert_eq!(render_expr(&interner, &arena, call), "point.scale(2)");
    }
}
