//! Proof obligations as delivered by the proof-obligation generator.

use crate::ast::Expr;
use crate::env::{TypeDef, TypeEnv};
use crate::error::TypeEnvResult;
use serde::{Deserialize, Serialize};

/// Source position of the construct an obligation was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A boolean condition that must hold for the specification to be well formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofObligation {
    /// Definition the obligation belongs to, e.g. `f`.
    pub name: String,
    /// Obligation category, e.g. `subtype`, `map compatible`.
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub location: Option<Location>,
    pub predicate: Expr,
}

impl ProofObligation {
    pub fn new(name: impl Into<String>, predicate: Expr) -> Self {
        Self {
            name: name.into(),
            kind: String::new(),
            location: None,
            predicate,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// A batch of obligations together with the type definitions they mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObligationSet {
    #[serde(default)]
    pub types: Vec<TypeDef>,
    pub obligations: Vec<ProofObligation>,
}

impl ObligationSet {
    /// Build the type environment for this batch.
    pub fn type_env(&self) -> TypeEnvResult<TypeEnv> {
        TypeEnv::from_defs(self.types.iter().cloned())
    }
}
