//! Binding context handed to the evaluator for one candidate.

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use vdmcheck_syntax::{Pattern, TypeBind};

/// Match `value` against `pattern`, pushing the bound names onto `out`.
///
/// A name bound twice within `pattern` must bind equal values; names already
/// in `out` are shadowed. On failure `out` may hold partial bindings; callers
/// truncate it back to their mark.
pub fn match_pattern(pattern: &Pattern, value: &Value, out: &mut Vec<(String, Value)>) -> bool {
    let mark = out.len();
    match_from(pattern, value, out, mark)
}

fn match_from(
    pattern: &Pattern,
    value: &Value,
    out: &mut Vec<(String, Value)>,
    mark: usize,
) -> bool {
    match pattern {
        Pattern::Ignore => true,
        Pattern::Ident(name) => {
            if let Some((_, existing)) = out[mark..].iter().rev().find(|(n, _)| n == name) {
                if existing != value {
                    return false;
                }
            }
            out.push((name.clone(), value.clone()));
            true
        }
        Pattern::Tuple(items) => match value.unwrap_named() {
            Value::Tuple(values) if values.len() == items.len() => items
                .iter()
                .zip(values)
                .all(|(p, v)| match_from(p, v, out, mark)),
            _ => false,
        },
        Pattern::Record { tag, fields } => match value.unwrap_named() {
            Value::Record {
                tag: vtag,
                fields: values,
            } if vtag == tag && values.len() == fields.len() => fields
                .iter()
                .zip(values)
                .all(|(p, (_, v))| match_from(p, v, out, mark)),
            _ => false,
        },
    }
}

/// Names bound to values, plus the finite ranges chosen for type binds.
///
/// The ranges let the evaluator iterate quantifiers over types it could not
/// otherwise enumerate.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: Vec<(String, Value)>,
    ranges: HashMap<TypeBind, Arc<Vec<Value>>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name; a later binding of the same name shadows earlier ones.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    /// Bind every name in `pattern`. Returns false if the value does not match.
    pub fn bind_pattern(&mut self, pattern: &Pattern, value: &Value) -> bool {
        let mark = self.values.len();
        if match_pattern(pattern, value, &mut self.values) {
            true
        } else {
            self.values.truncate(mark);
            false
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Supply the finite range a type bind iterates over.
    pub fn set_range(&mut self, bind: TypeBind, values: Arc<Vec<Value>>) {
        self.ranges.insert(bind, values);
    }

    pub fn range(&self, bind: &TypeBind) -> Option<&[Value]> {
        self.ranges.get(bind).map(|v| v.as_slice())
    }

    /// Bound names and values in binding order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdmcheck_syntax::Type;

    #[test]
    fn test_match_tuple_pattern() {
        let pat = Pattern::Tuple(vec![Pattern::ident("a"), Pattern::Ignore]);
        let mut out = Vec::new();
        assert!(match_pattern(
            &pat,
            &Value::Tuple(vec![Value::Int(1), Value::Bool(true)]),
            &mut out
        ));
        assert_eq!(out, vec![("a".to_string(), Value::Int(1))]);

        let mut out = Vec::new();
        assert!(!match_pattern(&pat, &Value::Int(1), &mut out));
    }

    #[test]
    fn test_repeated_name_must_agree() {
        let pat = Pattern::Tuple(vec![Pattern::ident("a"), Pattern::ident("a")]);
        let mut b = Bindings::new();
        assert!(!b.bind_pattern(&pat, &Value::Tuple(vec![Value::Int(1), Value::Int(2)])));
        assert!(b.is_empty());
        assert!(b.bind_pattern(&pat, &Value::Tuple(vec![Value::Int(2), Value::Int(2)])));
        assert_eq!(b.get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_pattern_shadows_enclosing_name() {
        let mut out = vec![("x".to_string(), Value::Int(1))];
        assert!(match_pattern(&Pattern::ident("x"), &Value::Int(2), &mut out));
        assert_eq!(out.len(), 2);

        let mut b = Bindings::new();
        b.bind("x", Value::Int(1));
        assert!(b.bind_pattern(&Pattern::ident("x"), &Value::Int(2)));
        assert_eq!(b.get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_record_pattern_checks_tag() {
        let pat = Pattern::Record {
            tag: "R".into(),
            fields: vec![Pattern::ident("x")],
        };
        let good = Value::record("R", vec![("f".into(), Value::Int(4))]);
        let bad = Value::record("S", vec![("f".into(), Value::Int(4))]);
        let mut b = Bindings::new();
        assert!(!b.bind_pattern(&pat, &bad));
        assert!(b.bind_pattern(&pat, &good));
        assert_eq!(b.get("x"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_shadowing_and_ranges() {
        let mut b = Bindings::new();
        b.bind("x", Value::Int(1));
        b.bind("x", Value::Int(2));
        assert_eq!(b.get("x"), Some(&Value::Int(2)));

        let tb = TypeBind::new(Pattern::ident("y"), Type::nat());
        b.set_range(tb.clone(), Arc::new(vec![Value::Int(0), Value::Int(1)]));
        assert_eq!(b.range(&tb).map(|r| r.len()), Some(2));
    }
}
