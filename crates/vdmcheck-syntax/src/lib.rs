//! Predicate AST, type descriptors and type environment for vdmcheck.

pub mod ast;
pub mod env;
pub mod error;
pub mod obligation;
pub mod pretty;
pub mod types;

pub use ast::*;
pub use env::{FieldDef, InvariantDef, NamedDef, OrderDef, RecordDef, TypeDef, TypeEnv};
pub use error::{TypeEnvError, TypeEnvResult};
pub use obligation::{Location, ObligationSet, ProofObligation};
pub use pretty::{
    format_real, pretty_print_bind, pretty_print_expr, pretty_print_literal,
    pretty_print_multiple_bind, pretty_print_pattern,
};
pub use types::{NumericKind, Type};
