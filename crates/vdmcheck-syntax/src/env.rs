//! Type environment: the named and record definitions that `Type::Named`
//! and `Type::Record` refer to.

use crate::ast::{Expr, Pattern};
use crate::error::{TypeEnvError, TypeEnvResult};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `inv p == body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantDef {
    pub pattern: Pattern,
    pub body: Expr,
}

impl InvariantDef {
    pub fn new(pattern: Pattern, body: Expr) -> Self {
        Self { pattern, body }
    }
}

/// `ord left < right == body`: true when `left` sorts before `right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDef {
    pub left: Pattern,
    pub right: Pattern,
    pub body: Expr,
}

/// `T = U inv ... ord ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedDef {
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub inv: Option<InvariantDef>,
    #[serde(default)]
    pub ord: Option<OrderDef>,
}

impl NamedDef {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            inv: None,
            ord: None,
        }
    }

    pub fn with_inv(mut self, inv: InvariantDef) -> Self {
        self.inv = Some(inv);
        self
    }

    pub fn with_ord(mut self, ord: OrderDef) -> Self {
        self.ord = Some(ord);
        self
    }
}

/// A record field `tag : T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub tag: String,
    pub ty: Type,
}

/// `R :: f1 : T1 f2 : T2 inv ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub inv: Option<InvariantDef>,
}

impl RecordDef {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = (String, Type)>) -> Self {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(tag, ty)| FieldDef { tag, ty })
                .collect(),
            inv: None,
        }
    }

    pub fn with_inv(mut self, inv: InvariantDef) -> Self {
        self.inv = Some(inv);
        self
    }

    /// Index of a field by tag.
    pub fn field_index(&self, tag: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.tag == tag)
    }
}

/// A type definition as serialised by the type checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDef {
    Named(NamedDef),
    Record(RecordDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Named(d) => &d.name,
            TypeDef::Record(d) => &d.name,
        }
    }
}

/// Global table of type definitions. Named and record types share one namespace.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    named: BTreeMap<String, NamedDef>,
    records: BTreeMap<String, RecordDef>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an environment from a list of definitions.
    pub fn from_defs(defs: impl IntoIterator<Item = TypeDef>) -> TypeEnvResult<Self> {
        let mut env = TypeEnv::new();
        for def in defs {
            env.define(def)?;
        }
        Ok(env)
    }

    pub fn define(&mut self, def: TypeDef) -> TypeEnvResult<()> {
        if self.contains(def.name()) {
            return Err(TypeEnvError::DuplicateDefinition {
                name: def.name().to_string(),
            });
        }
        match def {
            TypeDef::Named(d) => {
                self.named.insert(d.name.clone(), d);
            }
            TypeDef::Record(d) => {
                self.records.insert(d.name.clone(), d);
            }
        }
        Ok(())
    }

    pub fn define_named(&mut self, def: NamedDef) -> TypeEnvResult<()> {
        self.define(TypeDef::Named(def))
    }

    pub fn define_record(&mut self, def: RecordDef) -> TypeEnvResult<()> {
        self.define(TypeDef::Record(def))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name) || self.records.contains_key(name)
    }

    pub fn named(&self, name: &str) -> TypeEnvResult<&NamedDef> {
        self.named
            .get(name)
            .ok_or_else(|| TypeEnvError::UndefinedType {
                name: name.to_string(),
            })
    }

    pub fn record(&self, name: &str) -> TypeEnvResult<&RecordDef> {
        self.records
            .get(name)
            .ok_or_else(|| TypeEnvError::UndefinedRecord {
                name: name.to_string(),
            })
    }

    /// Iterate over all definitions, named types first.
    pub fn defs(&self) -> impl Iterator<Item = TypeDef> + '_ {
        self.named
            .values()
            .cloned()
            .map(TypeDef::Named)
            .chain(self.records.values().cloned().map(TypeDef::Record))
    }

    /// Strip aliases and resolve named types down to a structural type.
    /// Stops at records and at cycles.
    pub fn resolve<'a>(&'a self, ty: &'a Type) -> &'a Type {
        let mut current = ty.unalias();
        let mut seen = Vec::new();
        while let Type::Named(name) = current {
            if seen.contains(&name) {
                break;
            }
            seen.push(name);
            match self.named.get(name) {
                Some(def) => current = def.ty.unalias(),
                None => break,
            }
        }
        current
    }
}
