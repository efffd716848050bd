//! Deterministic minimal strategy: small contiguous windows around zero.

use super::ValueStrategy;
use crate::config::Strategy;
use std::collections::BTreeSet;
use vdmcheck_eval::Value;
use vdmcheck_syntax::NumericKind;

/// Characters drawn by the character generators, in order.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStrategy;

/// `nat` = `0..N-1`, `nat1` = `1..N`, `int` = `N` values starting at `-(N/2)`.
pub(crate) fn integer_window(kind: NumericKind, budget: usize) -> Vec<Value> {
    let n = i64::try_from(budget).unwrap_or(i64::MAX);
    let lo = match kind {
        NumericKind::NaturalOne => 1,
        NumericKind::Natural => 0,
        _ => -(n / 2),
    };
    (0..n)
        .map_while(|i| lo.checked_add(i))
        .map(Value::Int)
        .collect()
}

/// Distinct fractions `a/b` with `|a| <= r`, `1 <= b <= r`, for growing `r`.
pub(crate) fn fraction_window(budget: usize) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(budget);
    let mut r: i64 = 1;
    while out.len() < budget {
        for b in 1..=r {
            for a in -r..=r {
                let q = a as f64 / b as f64;
                if !q.is_finite() {
                    continue;
                }
                let v = Value::Real(q);
                if seen.insert(v.clone()) {
                    out.push(v);
                }
            }
        }
        r += 1;
    }
    out.truncate(budget);
    out
}

impl ValueStrategy for FixedStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Fixed
    }

    fn booleans(&mut self, budget: usize) -> Vec<Value> {
        match budget {
            0 => Vec::new(),
            1 => vec![Value::Bool(false)],
            _ => vec![Value::Bool(false), Value::Bool(true)],
        }
    }

    fn characters(&mut self, budget: usize) -> Vec<Value> {
        ALPHABET.chars().take(budget).map(Value::Char).collect()
    }

    fn integers(&mut self, kind: NumericKind, budget: usize) -> Vec<Value> {
        integer_window(kind, budget)
    }

    fn reals(&mut self, budget: usize) -> Vec<Value> {
        fraction_window(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_windows() {
        assert_eq!(
            integer_window(NumericKind::Integer, 4),
            vec![Value::Int(-2), Value::Int(-1), Value::Int(0), Value::Int(1)]
        );
        assert_eq!(
            integer_window(NumericKind::Natural, 3),
            vec![Value::Int(0), Value::Int(1), Value::Int(2)]
        );
        assert_eq!(integer_window(NumericKind::NaturalOne, 1), vec![Value::Int(1)]);
    }

    #[test]
    fn test_fraction_window() {
        let values = fraction_window(8);
        assert_eq!(values.len(), 8);
        let distinct: BTreeSet<_> = values.iter().cloned().collect();
        assert_eq!(distinct.len(), 8);
        assert!(values.contains(&Value::Real(0.5)));
        assert_eq!(values[..3], [Value::Int(-1), Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn test_characters() {
        let mut s = FixedStrategy;
        assert_eq!(
            s.characters(3),
            vec![Value::Char('a'), Value::Char('b'), Value::Char('c')]
        );
        assert_eq!(s.characters(100).len(), 62);
    }
}
