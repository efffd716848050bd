//! Type membership for concrete values.

use crate::evaluator::Evaluator;
use crate::guard::RecursionGuard;
use std::collections::BTreeSet;
use vdmcheck_eval::{Bindings, Value};
use vdmcheck_syntax::{InvariantDef, NumericKind, Type, TypeEnv};

/// Whether `value` is a member of `ty`: shape, numeric subrange and every
/// invariant on the way down. Unknown type names admit nothing.
pub fn admits(env: &TypeEnv, evaluator: &dyn Evaluator, ty: &Type, value: &Value) -> bool {
    admits_in(env, evaluator, ty, value, &mut RecursionGuard::new())
}

/// `guard` holds the named types entered since the last step into a
/// component value. Meeting one again is a cycle that consumes no
/// structure, and admits nothing.
fn admits_in(
    env: &TypeEnv,
    evaluator: &dyn Evaluator,
    ty: &Type,
    value: &Value,
    guard: &mut RecursionGuard,
) -> bool {
    let v = value.unwrap_named();
    match ty {
        Type::Boolean => matches!(v, Value::Bool(_)),
        Type::Character => matches!(v, Value::Char(_)),
        Type::Token => matches!(v, Value::Token(_)),
        Type::Quote(q) => matches!(v, Value::Quote(x) if x == q),
        Type::Optional(inner) => {
            matches!(v, Value::Nil) || admits_in(env, evaluator, inner, v, guard)
        }
        Type::Alias(inner) => admits_in(env, evaluator, inner, v, guard),
        Type::Function { .. } => matches!(v, Value::Function { .. }),
        Type::Numeric(kind) => match kind {
            NumericKind::NaturalOne => v.as_int().is_some_and(|n| n >= 1),
            NumericKind::Natural => v.as_int().is_some_and(|n| n >= 0),
            NumericKind::Integer => v.as_int().is_some(),
            NumericKind::Rational | NumericKind::Real => v.is_numeric(),
        },
        Type::Named(name) => match env.named(name) {
            Ok(def) => {
                guard
                    .expand(name, |g| admits_in(env, evaluator, &def.ty, v, g))
                    .unwrap_or(false)
                    && invariant_holds(evaluator, def.inv.as_ref(), value)
            }
            Err(_) => false,
        },
        Type::Record(name) => match (env.record(name), v) {
            (Ok(def), Value::Record { tag, fields }) => {
                tag == name
                    && fields.len() == def.fields.len()
                    && def
                        .fields
                        .iter()
                        .zip(fields)
                        .all(|(f, (_, fv))| admits(env, evaluator, &f.ty, fv))
                    && invariant_holds(evaluator, def.inv.as_ref(), v)
            }
            _ => false,
        },
        Type::Set { elem, non_empty } => match v {
            Value::Set(items) => {
                !(*non_empty && items.is_empty())
                    && items.iter().all(|x| admits(env, evaluator, elem, x))
            }
            _ => false,
        },
        Type::Seq { elem, non_empty } => match v {
            Value::Seq(items) => {
                !(*non_empty && items.is_empty())
                    && items.iter().all(|x| admits(env, evaluator, elem, x))
            }
            _ => false,
        },
        Type::Map {
            domain,
            range,
            injective,
        } => match v {
            Value::Map(entries) => {
                let shaped = entries.iter().all(|(k, x)| {
                    admits(env, evaluator, domain, k) && admits(env, evaluator, range, x)
                });
                let one_to_one = !*injective
                    || entries.iter().map(|(_, x)| x).collect::<BTreeSet<_>>().len()
                        == entries.len();
                shaped && one_to_one
            }
            _ => false,
        },
        Type::Product(items) => match v {
            Value::Tuple(values) => {
                values.len() == items.len()
                    && items
                        .iter()
                        .zip(values)
                        .all(|(t, x)| admits(env, evaluator, t, x))
            }
            _ => false,
        },
        Type::Union(alts) => alts.iter().any(|t| admits_in(env, evaluator, t, v, guard)),
        Type::Class(class) => matches!(v, Value::Object(o) if &o.class == class),
        Type::Unknown => true,
    }
}

fn invariant_holds(evaluator: &dyn Evaluator, inv: Option<&InvariantDef>, value: &Value) -> bool {
    let Some(inv) = inv else {
        return true;
    };
    let mut bindings = Bindings::new();
    bindings.bind_pattern(&inv.pattern, value)
        && matches!(evaluator.evaluate(&inv.body, &bindings), Ok(true))
}
