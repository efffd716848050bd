//! Search engine errors.

use thiserror::Error;
use vdmcheck_syntax::TypeEnvError;

/// A hard failure for one obligation. Empty samples and failing candidates
/// are search outcomes, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("cannot quantify directly over type {ty} with the {strategy} strategy")]
    UnsupportedType { ty: String, strategy: String },

    #[error(transparent)]
    UnknownType(#[from] TypeEnvError),

    #[error("recursion guard left {} type(s) active: {}", .active.len(), .active.join(", "))]
    GuardViolation { active: Vec<String> },
}

pub type SearchResult<T> = Result<T, SearchError>;
