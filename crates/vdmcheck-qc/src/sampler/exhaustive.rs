//! Deterministic exhaustive-bounded strategy: the fixed windows, complete
//! bounded power sets, and no function types.

use super::fixed::{fraction_window, integer_window, FixedStrategy};
use super::ValueStrategy;
use crate::config::Strategy;
use crate::error::{SearchError, SearchResult};
use vdmcheck_eval::Value;
use vdmcheck_syntax::{NumericKind, Type};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveStrategy;

impl ValueStrategy for ExhaustiveStrategy {
    fn kind(&self) -> Strategy {
        Strategy::ExhaustiveBounded
    }

    fn booleans(&mut self, budget: usize) -> Vec<Value> {
        FixedStrategy.booleans(budget)
    }

    fn characters(&mut self, budget: usize) -> Vec<Value> {
        FixedStrategy.characters(budget)
    }

    fn integers(&mut self, kind: NumericKind, budget: usize) -> Vec<Value> {
        integer_window(kind, budget)
    }

    fn reals(&mut self, budget: usize) -> Vec<Value> {
        fraction_window(budget)
    }

    fn power_set_start(&self, _n: usize) -> usize {
        1
    }

    fn function(&mut self, ty: &Type) -> SearchResult<Vec<Value>> {
        Err(SearchError::UnsupportedType {
            ty: ty.to_string(),
            strategy: self.kind().to_string(),
        })
    }
}
