//! Counterexample search for vdmcheck proof obligations.

pub mod boundary;
pub mod collect;
pub mod combinatorics;
pub mod config;
pub mod describe;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod sampler;
pub mod search;
pub mod trivial;

pub use boundary::{suggest, Suggestions};
pub use collect::{collect_type_binds, conjunctive_foralls};
pub use config::{ParseStrategyError, SearchConfig, Strategy};
pub use describe::describe;
pub use error::{SearchError, SearchResult};
pub use evaluator::Evaluator;
pub use guard::RecursionGuard;
pub use sampler::{strategy_for, Sampler, ValueStrategy};
pub use search::{check_all, search, ObligationReport, QuickCheck, SearchOutcome};
pub use trivial::{TrivialProof, TrivialProver};
