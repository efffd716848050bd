//! Type environment errors.

use thiserror::Error;

/// Error building or querying a [`TypeEnv`](crate::TypeEnv).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeEnvError {
    #[error("duplicate type definition: {name}")]
    DuplicateDefinition { name: String },

    #[error("undefined type: {name}")]
    UndefinedType { name: String },

    #[error("undefined record type: {name}")]
    UndefinedRecord { name: String },
}

/// Result type for type environment operations.
pub type TypeEnvResult<T> = Result<T, TypeEnvError>;
