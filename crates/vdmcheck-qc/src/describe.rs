//! Human-readable description of the range a type is sampled from.
//!
//! Purely textual: no values are built and no budget is consulted.

use crate::guard::RecursionGuard;
use vdmcheck_syntax::{NumericKind, Type, TypeEnv};

/// Describe the representative range of `ty`.
pub fn describe(env: &TypeEnv, ty: &Type) -> String {
    let mut d = Describer { env, next_var: 0 };
    d.describe(ty, &mut RecursionGuard::new())
}

struct Describer<'a> {
    env: &'a TypeEnv,
    next_var: usize,
}

impl Describer<'_> {
    fn fresh(&mut self) -> String {
        self.next_var += 1;
        format!("v{}", self.next_var)
    }

    fn describe(&mut self, ty: &Type, guard: &mut RecursionGuard) -> String {
        match ty {
            Type::Boolean | Type::Unknown => "{ true, false }".to_string(),
            Type::Character => "{ 'a', ..., '9' }".to_string(),
            Type::Token => "{ mk_token(1), ..., mk_token(10) }".to_string(),
            Type::Quote(q) => format!("{{ <{}> }}", q),
            Type::Optional(inner) => format!("{{ nil }} union {}", self.describe(inner, guard)),
            Type::Alias(inner) => self.describe(inner, guard),
            Type::Function { .. } => format!("{{ ({}) }}", ty),
            Type::Numeric(kind) => match kind {
                NumericKind::NaturalOne => "{ 1, ..., 10 }".to_string(),
                NumericKind::Natural => "{ 0, ..., 10 }".to_string(),
                NumericKind::Integer => "{ -10, ..., 10 }".to_string(),
                NumericKind::Rational | NumericKind::Real => {
                    "{ a / b | a in set { -10, ..., 10 }, b in set { 1, ..., 10 } }".to_string()
                }
            },
            Type::Named(name) => self.describe_named(name, guard),
            Type::Record(name) => self.describe_record(name, guard),
            Type::Set { elem, non_empty } => {
                let elems = self.describe(elem, guard);
                if *non_empty {
                    format!("power {} \\ {{ {{}} }}", elems)
                } else {
                    format!("power {}", elems)
                }
            }
            Type::Seq { elem, non_empty } => {
                let s = self.fresh();
                let elems = self.describe(elem, guard);
                let filter = if *non_empty {
                    format!(" & {} <> {{}}", s)
                } else {
                    String::new()
                };
                format!("{{ set2seq({}) | {} in set power {}{} }}", s, s, elems, filter)
            }
            Type::Map {
                domain, range, ..
            } => {
                let (s, d, r) = (self.fresh(), self.fresh(), self.fresh());
                let dom = self.describe(domain, guard);
                let rng = self.describe(range, guard);
                format!(
                    "{{ {{ {} |-> {} | {} in set {} }} | {} in set power {}, {} in set {} }}",
                    d, r, d, s, s, dom, r, rng
                )
            }
            Type::Product(items) => {
                let parts: Vec<(String, String)> = items
                    .iter()
                    .map(|t| {
                        let v = self.fresh();
                        (v, self.describe(t, guard))
                    })
                    .collect();
                comprehension("mk_", &parts, None)
            }
            Type::Union(alts) => {
                let parts: Vec<String> = alts.iter().map(|t| self.describe(t, guard)).collect();
                format!("dunion {{ {} }}", parts.join(", "))
            }
            Type::Class(class) => format!("{{ new {}() }}", class),
        }
    }

    fn describe_named(&mut self, name: &str, guard: &mut RecursionGuard) -> String {
        let env = self.env;
        let Ok(def) = env.named(name) else {
            return name.to_string();
        };
        guard
            .expand(name, |guard| {
                let inner = self.describe(&def.ty, guard);
                if def.inv.is_some() {
                    let v = self.fresh();
                    format!("{{ {} | {} in set {} & inv_{}({}) }}", v, v, inner, name, v)
                } else {
                    inner
                }
            })
            .unwrap_or_else(|| name.to_string())
    }

    fn describe_record(&mut self, name: &str, guard: &mut RecursionGuard) -> String {
        let env = self.env;
        let Ok(def) = env.record(name) else {
            return name.to_string();
        };
        guard
            .expand(name, |guard| {
                let parts: Vec<(String, String)> = def
                    .fields
                    .iter()
                    .map(|f| {
                        let v = self.fresh();
                        (v, self.describe(&f.ty, guard))
                    })
                    .collect();
                let inv = def.inv.as_ref().map(|_| name);
                comprehension(&format!("mk_{}", name), &parts, inv)
            })
            .unwrap_or_else(|| name.to_string())
    }
}

/// `{ mk_X(v1, v2) | v1 in set D1, v2 in set D2 & inv_X(...) }`.
fn comprehension(ctor: &str, parts: &[(String, String)], inv: Option<&str>) -> String {
    let vars: Vec<&str> = parts.iter().map(|(v, _)| v.as_str()).collect();
    let value = format!("{}({})", ctor, vars.join(", "));
    if parts.is_empty() {
        return format!("{{ {} }}", value);
    }
    let binds: Vec<String> = parts
        .iter()
        .map(|(v, d)| format!("{} in set {}", v, d))
        .collect();
    match inv {
        Some(name) => format!(
            "{{ {} | {} & inv_{}({}) }}",
            value,
            binds.join(", "),
            name,
            value
        ),
        None => format!("{{ {} | {} }}", value, binds.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdmcheck_syntax::{Expr, InvariantDef, NamedDef, Pattern, RecordDef};

    #[test]
    fn test_basic_templates() {
        let env = TypeEnv::new();
        assert_eq!(describe(&env, &Type::Boolean), "{ true, false }");
        assert_eq!(describe(&env, &Type::int()), "{ -10, ..., 10 }");
        assert_eq!(
            describe(&env, &Type::set(Type::Boolean)),
            "power { true, false }"
        );
        assert_eq!(
            describe(&env, &Type::Union(vec![Type::Boolean, Type::Quote("A".into())])),
            "dunion { { true, false }, { <A> } }"
        );
    }

    #[test]
    fn test_product_and_record() {
        let mut env = TypeEnv::new();
        env.define_record(RecordDef::new(
            "P",
            [("x".to_string(), Type::nat()), ("y".to_string(), Type::Boolean)],
        ))
        .unwrap();
        assert_eq!(
            describe(&env, &Type::record("P")),
            "{ mk_P(v1, v2) | v1 in set { 0, ..., 10 }, v2 in set { true, false } }"
        );
        assert_eq!(
            describe(&env, &Type::Product(vec![Type::Boolean, Type::Boolean])),
            "{ mk_(v1, v2) | v1 in set { true, false }, v2 in set { true, false } }"
        );
    }

    #[test]
    fn test_recursive_and_invariant() {
        let mut env = TypeEnv::new();
        env.define_named(NamedDef::new(
            "List",
            Type::optional(Type::Product(vec![Type::nat(), Type::named("List")])),
        ))
        .unwrap();
        env.define_named(NamedDef::new("Pos", Type::int()).with_inv(InvariantDef::new(
            Pattern::ident("p"),
            Expr::bool(true),
        )))
        .unwrap();

        let list = describe(&env, &Type::named("List"));
        assert!(list.contains("v2 in set List"), "{}", list);
        assert_eq!(
            describe(&env, &Type::named("Pos")),
            "{ v1 | v1 in set { -10, ..., 10 } & inv_Pos(v1) }"
        );
    }

    #[test]
    fn test_budget_independent() {
        let env = TypeEnv::new();
        let ty = Type::map(Type::nat(), Type::seq(Type::Character));
        assert_eq!(describe(&env, &ty), describe(&env, &ty));
    }
}
