//! Boundary-value suggestions from simple comparisons against literals.
//!
//! Walks conjunctions only. Each recognised `v <op> c` proposes the value just
//! past the boundary; anything else contributes nothing.

use std::collections::BTreeMap;
use tracing::trace;
use vdmcheck_eval::{literal_value, Value};
use vdmcheck_syntax::{BinOp, Expr, Literal, UnaryOp};

/// Suggested values per variable name, in discovery order.
pub type Suggestions = BTreeMap<String, Vec<Value>>;

pub fn suggest(expr: &Expr) -> Suggestions {
    let mut out = Suggestions::new();
    visit(expr, &mut out);
    out
}

/// Add the suggestions for `expr` to `out`.
pub fn suggest_into(expr: &Expr, out: &mut Suggestions) {
    visit(expr, out);
}

fn visit(expr: &Expr, out: &mut Suggestions) {
    match expr {
        Expr::Binary {
            op: BinOp::And,
            left,
            right,
        } => {
            visit(left, out);
            visit(right, out);
        }
        Expr::Binary { op, left, right } => {
            let suggestion = match (left.as_var(), right.as_var()) {
                (Some(v), None) => past_boundary(*op, right).map(|s| (v, s)),
                (None, Some(v)) => flip(*op)
                    .and_then(|op| past_boundary(op, left))
                    .map(|s| (v, s)),
                _ => None,
            };
            if let Some((name, value)) = suggestion {
                add(out, name, value);
            }
        }
        Expr::Var(name) => add(out, name, Value::Bool(false)),
        _ => {}
    }
}

fn add(out: &mut Suggestions, name: &str, value: Value) {
    trace!(name, value = %value, "boundary suggestion");
    let values = out.entry(name.to_string()).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

/// The same comparison with its operands swapped.
fn flip(op: BinOp) -> Option<BinOp> {
    match op {
        BinOp::Eq | BinOp::Ne => Some(op),
        BinOp::Lt => Some(BinOp::Gt),
        BinOp::Le => Some(BinOp::Ge),
        BinOp::Gt => Some(BinOp::Lt),
        BinOp::Ge => Some(BinOp::Le),
        _ => None,
    }
}

/// A literal, or a negated numeric literal.
fn constant(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Literal(lit) => Some(literal_value(lit)),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match operand.as_literal()? {
            Literal::Int(n) => n.checked_neg().map(Value::Int),
            Literal::Real(r) => Some(Value::Real(-r)),
            _ => None,
        },
        _ => None,
    }
}

fn offset(c: &Value, delta: i64) -> Option<Value> {
    match c {
        Value::Int(n) => n.checked_add(delta).map(Value::Int),
        Value::Real(r) => Some(Value::Real(r + delta as f64)),
        _ => None,
    }
}

/// The value just past the boundary of `v <op> c`.
fn past_boundary(op: BinOp, c: &Expr) -> Option<Value> {
    match op {
        BinOp::Eq => match c {
            Expr::SeqEnum(items) if !items.is_empty() => Some(Value::empty_seq()),
            Expr::SetEnum(items) if !items.is_empty() => Some(Value::empty_set()),
            _ => offset(&constant(c)?, 1),
        },
        BinOp::Ne => constant(c),
        BinOp::Gt | BinOp::Lt => offset(&constant(c)?, 0),
        BinOp::Ge => offset(&constant(c)?, -1),
        BinOp::Le => offset(&constant(c)?, 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(op: BinOp, l: Expr, r: Expr) -> Expr {
        Expr::binary(op, l, r)
    }

    fn only(s: &Suggestions, name: &str) -> Vec<Value> {
        s.get(name).cloned().unwrap_or_default()
    }

    #[test]
    fn test_comparisons() {
        let x = || Expr::var("x");
        let three = || Expr::int(3);
        assert_eq!(only(&suggest(&cmp(BinOp::Eq, x(), three())), "x"), vec![Value::Int(4)]);
        assert_eq!(only(&suggest(&cmp(BinOp::Gt, x(), three())), "x"), vec![Value::Int(3)]);
        assert_eq!(only(&suggest(&cmp(BinOp::Ge, x(), three())), "x"), vec![Value::Int(2)]);
        assert_eq!(only(&suggest(&cmp(BinOp::Lt, x(), three())), "x"), vec![Value::Int(3)]);
        assert_eq!(only(&suggest(&cmp(BinOp::Le, x(), three())), "x"), vec![Value::Int(4)]);
        assert_eq!(only(&suggest(&cmp(BinOp::Ne, x(), three())), "x"), vec![Value::Int(3)]);
    }

    #[test]
    fn test_reversed_operands() {
        // 3 < x is x > 3
        let e = cmp(BinOp::Lt, Expr::int(3), Expr::var("x"));
        assert_eq!(only(&suggest(&e), "x"), vec![Value::Int(3)]);
        // 3 >= x is x <= 3
        let e = cmp(BinOp::Ge, Expr::int(3), Expr::var("x"));
        assert_eq!(only(&suggest(&e), "x"), vec![Value::Int(4)]);
    }

    #[test]
    fn test_collections_bools_and_negatives() {
        let e = cmp(
            BinOp::Eq,
            Expr::var("s"),
            Expr::SeqEnum(vec![Expr::int(1)]),
        );
        assert_eq!(only(&suggest(&e), "s"), vec![Value::empty_seq()]);

        let e = cmp(BinOp::Eq, Expr::var("t"), Expr::SetEnum(vec![Expr::int(1)]));
        assert_eq!(only(&suggest(&e), "t"), vec![Value::empty_set()]);

        assert_eq!(only(&suggest(&Expr::var("b")), "b"), vec![Value::Bool(false)]);

        let e = cmp(
            BinOp::Gt,
            Expr::var("x"),
            Expr::unary(UnaryOp::Neg, Expr::int(2)),
        );
        assert_eq!(only(&suggest(&e), "x"), vec![Value::Int(-2)]);

        let e = cmp(BinOp::Le, Expr::var("r"), Expr::real(0.5));
        assert_eq!(only(&suggest(&e), "r"), vec![Value::Real(1.5)]);
    }

    #[test]
    fn test_conjunctions_only() {
        let e = Expr::and(
            cmp(BinOp::Gt, Expr::var("x"), Expr::int(1)),
            Expr::and(
                cmp(BinOp::Lt, Expr::var("y"), Expr::int(5)),
                cmp(BinOp::Gt, Expr::var("x"), Expr::int(1)),
            ),
        );
        let s = suggest(&e);
        assert_eq!(only(&s, "x"), vec![Value::Int(1)]);
        assert_eq!(only(&s, "y"), vec![Value::Int(5)]);

        let e = Expr::or(
            cmp(BinOp::Gt, Expr::var("x"), Expr::int(1)),
            Expr::var("b"),
        );
        assert!(suggest(&e).is_empty());

        let e = cmp(BinOp::Gt, Expr::var("x"), Expr::var("y"));
        assert!(suggest(&e).is_empty());
    }
}
