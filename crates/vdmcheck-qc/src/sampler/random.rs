//! Seeded random strategy biased toward small magnitudes.

use super::fixed::ALPHABET;
use super::ValueStrategy;
use crate::config::Strategy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use vdmcheck_eval::Value;
use vdmcheck_syntax::NumericKind;

/// Redraws allowed per element before giving up on a duplicate.
const MAX_REDRAWS: usize = 8;

#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw up to `budget` distinct values; element `i` comes from `draw(rng, i)`.
    fn distinct(
        &mut self,
        budget: usize,
        mut draw: impl FnMut(&mut StdRng, usize) -> Option<Value>,
    ) -> Vec<Value> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(budget);
        for i in 0..budget {
            for _ in 0..MAX_REDRAWS {
                let Some(v) = draw(&mut self.rng, i) else {
                    continue;
                };
                if seen.insert(v.clone()) {
                    out.push(v);
                    break;
                }
            }
        }
        out
    }
}

/// Bound for element `i`: grows linearly so early draws stay small.
fn bound(i: usize) -> i64 {
    i64::try_from(i).map_or(i64::MAX / 4, |i| i.saturating_mul(2).saturating_add(1))
}

impl ValueStrategy for RandomStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Random
    }

    fn booleans(&mut self, budget: usize) -> Vec<Value> {
        match budget {
            0 => Vec::new(),
            1 => vec![Value::Bool(self.rng.gen())],
            _ => vec![Value::Bool(false), Value::Bool(true)],
        }
    }

    fn characters(&mut self, budget: usize) -> Vec<Value> {
        let alphabet: Vec<char> = ALPHABET.chars().collect();
        let budget = budget.min(alphabet.len());
        self.distinct(budget, |rng, _| {
            Some(Value::Char(alphabet[rng.gen_range(0..alphabet.len())]))
        })
    }

    fn integers(&mut self, kind: NumericKind, budget: usize) -> Vec<Value> {
        self.distinct(budget, |rng, i| {
            let b = bound(i);
            let n = match kind {
                NumericKind::NaturalOne => rng.gen_range(1..=b.saturating_add(1)),
                NumericKind::Natural => rng.gen_range(0..=b),
                _ => rng.gen_range(-b..=b),
            };
            Some(Value::Int(n))
        })
    }

    fn reals(&mut self, budget: usize) -> Vec<Value> {
        self.distinct(budget, |rng, i| {
            let r = bound(i);
            let a = rng.gen_range(-r..=r);
            let b = rng.gen_range(1..=r);
            let q = a as f64 / b as f64;
            q.is_finite().then_some(Value::Real(q))
        })
    }
}
