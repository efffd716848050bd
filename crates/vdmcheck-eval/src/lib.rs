//! Runtime values and the reference evaluator for vdmcheck predicates.

pub mod bindings;
pub mod eval;
pub mod value;

pub use bindings::{match_pattern, Bindings};
pub use eval::{
    eval_binary_values, eval_unary, literal_value, EvalError, EvalResult, Interpreter,
    DEFAULT_STEP_LIMIT,
};
pub use value::{ObjectRef, Value};
