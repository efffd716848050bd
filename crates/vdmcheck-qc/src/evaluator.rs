//! The seam to the expression evaluator.

use vdmcheck_eval::{Bindings, EvalResult, Interpreter};
use vdmcheck_syntax::Expr;

/// Evaluates a boolean predicate under a binding context.
///
/// Implementations bound their own work (steps, time) and report
/// exhaustion as an error; the search skips that candidate.
pub trait Evaluator: Sync {
    fn evaluate(&self, predicate: &Expr, bindings: &Bindings) -> EvalResult<bool>;
}

impl Evaluator for Interpreter<'_> {
    fn evaluate(&self, predicate: &Expr, bindings: &Bindings) -> EvalResult<bool> {
        self.eval_bool(predicate, bindings)
    }
}
