//! Type descriptors handed over by the type checker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric basic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericKind {
    /// `nat1`: strictly positive integers.
    #[serde(rename = "nat1")]
    NaturalOne,
    /// `nat`: non-negative integers.
    #[serde(rename = "nat")]
    Natural,
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "rat")]
    Rational,
    #[serde(rename = "real")]
    Real,
}

impl NumericKind {
    /// True for the integral kinds (`nat1`, `nat`, `int`).
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            NumericKind::NaturalOne | NumericKind::Natural | NumericKind::Integer
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            NumericKind::NaturalOne => "nat1",
            NumericKind::Natural => "nat",
            NumericKind::Integer => "int",
            NumericKind::Rational => "rat",
            NumericKind::Real => "real",
        }
    }
}

/// A VDM type descriptor.
///
/// `Named` and `Record` refer to definitions in a [`TypeEnv`](crate::TypeEnv)
/// by name, which is how cyclic type graphs are expressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// `bool`.
    Boolean,
    /// `char`.
    Character,
    /// `token`.
    Token,
    /// Quote literal type `<NAME>`.
    Quote(String),
    /// Optional type `[T]`.
    Optional(Box<Type>),
    /// A transparent alias of another type.
    Alias(Box<Type>),
    /// Function type `T1 * T2 -> R`.
    Function { params: Vec<Type>, result: Box<Type> },
    /// Numeric basic type.
    Numeric(NumericKind),
    /// Reference to a named type definition `T = U inv ... ord ...`.
    Named(String),
    /// Reference to a record definition `R :: f1 : T1 ...`.
    Record(String),
    /// `set of T` / `set1 of T`.
    Set { elem: Box<Type>, non_empty: bool },
    /// `seq of T` / `seq1 of T`.
    Seq { elem: Box<Type>, non_empty: bool },
    /// `map D to R` / `inmap D to R`.
    Map {
        domain: Box<Type>,
        range: Box<Type>,
        injective: bool,
    },
    /// Product type `T1 * T2 * ...`.
    Product(Vec<Type>),
    /// Union type `T1 | T2 | ...`.
    Union(Vec<Type>),
    /// Class reference.
    Class(String),
    /// Unresolved type.
    Unknown,
}

impl Type {
    pub fn nat() -> Type {
        Type::Numeric(NumericKind::Natural)
    }

    pub fn nat1() -> Type {
        Type::Numeric(NumericKind::NaturalOne)
    }

    pub fn int() -> Type {
        Type::Numeric(NumericKind::Integer)
    }

    pub fn real() -> Type {
        Type::Numeric(NumericKind::Real)
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn set(elem: Type) -> Type {
        Type::Set {
            elem: Box::new(elem),
            non_empty: false,
        }
    }

    pub fn set1(elem: Type) -> Type {
        Type::Set {
            elem: Box::new(elem),
            non_empty: true,
        }
    }

    pub fn seq(elem: Type) -> Type {
        Type::Seq {
            elem: Box::new(elem),
            non_empty: false,
        }
    }

    pub fn seq1(elem: Type) -> Type {
        Type::Seq {
            elem: Box::new(elem),
            non_empty: true,
        }
    }

    pub fn map(domain: Type, range: Type) -> Type {
        Type::Map {
            domain: Box::new(domain),
            range: Box::new(range),
            injective: false,
        }
    }

    pub fn inmap(domain: Type, range: Type) -> Type {
        Type::Map {
            domain: Box::new(domain),
            range: Box::new(range),
            injective: true,
        }
    }

    pub fn named(name: impl Into<String>) -> Type {
        Type::Named(name.into())
    }

    pub fn record(name: impl Into<String>) -> Type {
        Type::Record(name.into())
    }

    /// Check if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Numeric(_))
    }

    /// Strip any number of transparent aliases.
    pub fn unalias(&self) -> &Type {
        let mut ty = self;
        while let Type::Alias(inner) = ty {
            ty = inner;
        }
        ty
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[Type], sep: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        // Composite members need brackets to keep the rendering unambiguous.
        match ty {
            Type::Product(_) | Type::Union(_) | Type::Function { .. } => write!(f, "({})", ty)?,
            _ => write!(f, "{}", ty)?,
        }
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "bool"),
            Type::Character => write!(f, "char"),
            Type::Token => write!(f, "token"),
            Type::Quote(q) => write!(f, "<{}>", q),
            Type::Optional(t) => write!(f, "[{}]", t),
            Type::Alias(t) => write!(f, "{}", t),
            Type::Function { params, result } => {
                if params.is_empty() {
                    write!(f, "()")?;
                } else {
                    write_joined(f, params, " * ")?;
                }
                write!(f, " -> {}", result)
            }
            Type::Numeric(kind) => write!(f, "{}", kind.keyword()),
            Type::Named(name) | Type::Record(name) | Type::Class(name) => write!(f, "{}", name),
            Type::Set { elem, non_empty } => {
                write!(f, "{} of {}", if *non_empty { "set1" } else { "set" }, elem)
            }
            Type::Seq { elem, non_empty } => {
                write!(f, "{} of {}", if *non_empty { "seq1" } else { "seq" }, elem)
            }
            Type::Map {
                domain,
                range,
                injective,
            } => write!(
                f,
                "{} {} to {}",
                if *injective { "inmap" } else { "map" },
                domain,
                range
            ),
            Type::Product(types) => write_joined(f, types, " * "),
            Type::Union(types) => write_joined(f, types, " | "),
            Type::Unknown => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(Type::Boolean.to_string(), "bool");
        assert_eq!(Type::set(Type::nat()).to_string(), "set of nat");
        assert_eq!(Type::seq1(Type::Character).to_string(), "seq1 of char");
        assert_eq!(
            Type::inmap(Type::Token, Type::int()).to_string(),
            "inmap token to int"
        );
        assert_eq!(
            Type::Product(vec![Type::nat(), Type::Union(vec![Type::Boolean, Type::Token])])
                .to_string(),
            "nat * (bool | token)"
        );
        assert_eq!(Type::optional(Type::named("T")).to_string(), "[T]");
    }

    #[test]
    fn test_unalias() {
        let ty = Type::Alias(Box::new(Type::Alias(Box::new(Type::real()))));
        assert_eq!(ty.unalias(), &Type::real());
        assert!(ty.unalias().is_numeric());
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(NumericKind::Natural.is_integral());
        assert!(!NumericKind::Rational.is_integral());
        assert_eq!(NumericKind::NaturalOne.keyword(), "nat1");
    }
}
