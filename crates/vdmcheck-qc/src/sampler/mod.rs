//! Value-space sampler: a finite, budget-bounded sample of values per type.
//!
//! The structural rules (optional, named, record, collections, maps,
//! products, unions) live in [`Sampler`]; the leaf policies that differ
//! between generation strategies live behind [`ValueStrategy`].

mod exhaustive;
mod fixed;
mod membership;
mod random;

pub use exhaustive::ExhaustiveStrategy;
pub use fixed::{FixedStrategy, ALPHABET};
pub use membership::admits;
pub use random::RandomStrategy;

use crate::combinatorics::{
    least_power, Combinations, Permutations, PermutationsWithRepetition, Selector,
};
use crate::config::{SearchConfig, Strategy};
use crate::error::SearchResult;
use crate::evaluator::Evaluator;
use crate::guard::RecursionGuard;
use std::collections::BTreeSet;
use tracing::{debug, trace};
use vdmcheck_eval::{Bindings, ObjectRef, Value};
use vdmcheck_syntax::{InvariantDef, NumericKind, OrderDef, Type, TypeEnv};

/// Leaf generation policy.
pub trait ValueStrategy {
    fn kind(&self) -> Strategy;

    fn booleans(&mut self, budget: usize) -> Vec<Value>;

    fn characters(&mut self, budget: usize) -> Vec<Value>;

    /// Values of an integral kind (`nat1`, `nat`, `int`).
    fn integers(&mut self, kind: NumericKind, budget: usize) -> Vec<Value>;

    /// Values of `rat`/`real`.
    fn reals(&mut self, budget: usize) -> Vec<Value>;

    /// Smallest subset size in a bounded power set over `n` base elements.
    fn power_set_start(&self, n: usize) -> usize {
        n.min(3)
    }

    /// Function types cannot be enumerated; the default is one placeholder.
    fn function(&mut self, ty: &Type) -> SearchResult<Vec<Value>> {
        Ok(vec![Value::Function {
            name: format!("({})", ty),
        }])
    }
}

/// Build the leaf strategy selected by `config`.
pub fn strategy_for(config: &SearchConfig) -> Box<dyn ValueStrategy> {
    match config.strategy {
        Strategy::Fixed => Box::new(FixedStrategy),
        Strategy::Random => Box::new(RandomStrategy::new(config.seed)),
        Strategy::ExhaustiveBounded => Box::new(ExhaustiveStrategy),
    }
}

/// Samples values of arbitrary types.
pub struct Sampler<'a> {
    env: &'a TypeEnv,
    evaluator: &'a dyn Evaluator,
    strategy: Box<dyn ValueStrategy + 'a>,
    next_object: u64,
}

impl<'a> Sampler<'a> {
    pub fn new(env: &'a TypeEnv, evaluator: &'a dyn Evaluator, config: &SearchConfig) -> Self {
        Self::with_strategy(env, evaluator, strategy_for(config))
    }

    pub fn with_strategy(
        env: &'a TypeEnv,
        evaluator: &'a dyn Evaluator,
        strategy: Box<dyn ValueStrategy + 'a>,
    ) -> Self {
        Self {
            env,
            evaluator,
            strategy,
            next_object: 0,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy.kind()
    }

    /// Sample with a fresh guard and check it is empty afterwards.
    pub fn sample_top(&mut self, ty: &Type, budget: usize) -> SearchResult<Vec<Value>> {
        let mut guard = RecursionGuard::new();
        let values = self.sample(ty, budget, &mut guard)?;
        guard.finish()?;
        debug!(ty = %ty, budget, size = values.len(), "sampled");
        Ok(values)
    }

    /// Whether `value` belongs to `ty`, invariants included.
    pub fn admits(&self, ty: &Type, value: &Value) -> bool {
        admits(self.env, self.evaluator, ty, value)
    }

    /// At most `budget` distinct values of `ty`.
    pub fn sample(
        &mut self,
        ty: &Type,
        budget: usize,
        guard: &mut RecursionGuard,
    ) -> SearchResult<Vec<Value>> {
        if budget == 0 {
            return Ok(Vec::new());
        }
        let values = match ty {
            Type::Boolean | Type::Unknown => self.strategy.booleans(budget),
            Type::Character => self.strategy.characters(budget),
            Type::Token => (1..=budget as i64).map(Value::token).collect(),
            Type::Quote(q) => vec![Value::Quote(q.clone())],
            Type::Optional(inner) => {
                let mut out = vec![Value::Nil];
                if budget > 1 {
                    out.extend(self.sample(inner, budget - 1, guard)?);
                }
                out
            }
            Type::Alias(inner) => self.sample(inner, budget, guard)?,
            Type::Function { .. } => self.strategy.function(ty)?,
            Type::Numeric(kind) if kind.is_integral() => self.strategy.integers(*kind, budget),
            Type::Numeric(_) => self.strategy.reals(budget),
            Type::Named(name) => self.sample_named(name, budget, guard)?,
            Type::Record(name) => self.sample_record(name, budget, guard)?,
            Type::Set { elem, non_empty } => {
                let base = self.sample(elem, budget, guard)?;
                self.power_set(&base, *non_empty, budget, |items| Value::set_from_iter(items))
            }
            Type::Seq { elem, non_empty } => {
                let base = self.sample(elem, budget, guard)?;
                self.power_set(&base, *non_empty, budget, |items| {
                    Value::Seq(items.collect())
                })
            }
            Type::Map {
                domain,
                range,
                injective,
            } => {
                let dom = self.sample(domain, budget, guard)?;
                let rng = self.sample(range, budget, guard)?;
                maps(&dom, &rng, *injective, budget)
            }
            Type::Product(items) => {
                let fields = items
                    .iter()
                    .map(|t| (String::new(), t.clone()))
                    .collect::<Vec<_>>();
                self.product(&fields, budget, guard, |values| {
                    Value::Tuple(values.into_iter().map(|(_, v)| v).collect())
                })?
            }
            Type::Union(alts) => {
                let mut samples = Vec::with_capacity(alts.len());
                for alt in alts {
                    samples.push(self.sample(alt, budget, guard)?);
                }
                round_robin(samples, budget)
            }
            Type::Class(class) => {
                self.next_object += 1;
                vec![Value::Object(ObjectRef {
                    id: self.next_object,
                    class: class.clone(),
                })]
            }
        };
        trace!(ty = %ty, budget, size = values.len(), "type sample");
        Ok(values)
    }

    fn sample_named(
        &mut self,
        name: &str,
        budget: usize,
        guard: &mut RecursionGuard,
    ) -> SearchResult<Vec<Value>> {
        let env = self.env;
        let def = env.named(name)?;
        let expanded = guard.expand(name, |guard| -> SearchResult<Vec<Value>> {
            let base = self.sample(&def.ty, budget, guard)?;
            let mut out: Vec<Value> = base
                .into_iter()
                .map(|v| Value::named(name, v))
                .filter(|v| self.satisfies(def.inv.as_ref(), v, name))
                .collect();
            if let Some(ord) = &def.ord {
                self.sort_by_ord(ord, &mut out);
            }
            out.truncate(budget);
            Ok(out)
        });
        expanded.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn sample_record(
        &mut self,
        name: &str,
        budget: usize,
        guard: &mut RecursionGuard,
    ) -> SearchResult<Vec<Value>> {
        let env = self.env;
        let def = env.record(name)?;
        if def.fields.is_empty() {
            let empty = Value::record(name, Vec::new());
            return Ok(if self.satisfies(def.inv.as_ref(), &empty, name) {
                vec![empty]
            } else {
                Vec::new()
            });
        }
        let fields: Vec<(String, Type)> = def
            .fields
            .iter()
            .map(|f| (f.tag.clone(), f.ty.clone()))
            .collect();
        let expanded = guard.expand(name, |guard| {
            self.product(&fields, budget, guard, |values| Value::record(name, values))
            .map(|records| {
                records
                    .into_iter()
                    .filter(|r| self.satisfies(def.inv.as_ref(), r, name))
                    .collect::<Vec<_>>()
            })
        });
        expanded.unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Cartesian product of per-field samples at the least-power sub-budget,
    /// capped at `budget` built values.
    fn product(
        &mut self,
        fields: &[(String, Type)],
        budget: usize,
        guard: &mut RecursionGuard,
        build: impl Fn(Vec<(String, Value)>) -> Value,
    ) -> SearchResult<Vec<Value>> {
        let sub_budget = least_power(fields.len(), budget);
        let mut samples = Vec::with_capacity(fields.len());
        for (_, ty) in fields {
            samples.push(self.sample(ty, sub_budget, guard)?);
        }
        let sizes: Vec<usize> = samples.iter().map(Vec::len).collect();
        let mut out = Vec::new();
        for selection in Selector::new(&sizes) {
            if out.len() >= budget {
                break;
            }
            let values = fields
                .iter()
                .zip(&selection)
                .zip(&samples)
                .map(|(((tag, _), &i), sample)| (tag.clone(), sample[i].clone()))
                .collect();
            out.push(build(values));
        }
        Ok(out)
    }

    /// Bounded partial power set of `base`, each subset in base order.
    fn power_set(
        &self,
        base: &[Value],
        non_empty: bool,
        budget: usize,
        build: impl Fn(std::vec::IntoIter<Value>) -> Value,
    ) -> Vec<Value> {
        let mut out = Vec::new();
        if !non_empty {
            out.push(build(Vec::new().into_iter()));
        }
        let start = self.strategy.power_set_start(base.len()).max(1);
        'sizes: for k in start..=base.len() {
            for combo in Combinations::new(base.len(), k) {
                if out.len() >= budget {
                    break 'sizes;
                }
                let items: Vec<Value> = combo.into_iter().map(|i| base[i].clone()).collect();
                out.push(build(items.into_iter()));
            }
        }
        out.truncate(budget);
        out
    }

    fn satisfies(&self, inv: Option<&InvariantDef>, value: &Value, ty: &str) -> bool {
        let Some(inv) = inv else {
            return true;
        };
        let mut bindings = Bindings::new();
        if !bindings.bind_pattern(&inv.pattern, value) {
            trace!(ty, value = %value, "invariant pattern mismatch");
            return false;
        }
        match self.evaluator.evaluate(&inv.body, &bindings) {
            Ok(true) => true,
            Ok(false) => {
                trace!(ty, value = %value, "invariant rejects candidate");
                false
            }
            Err(e) => {
                trace!(ty, value = %value, error = %e, "invariant failed to evaluate");
                false
            }
        }
    }

    /// Stable insertion sort by the declared order. An order that fails to
    /// evaluate counts as "not less than".
    fn sort_by_ord(&self, ord: &OrderDef, values: &mut [Value]) {
        let less = |a: &Value, b: &Value| {
            let mut bindings = Bindings::new();
            bindings.bind_pattern(&ord.left, a)
                && bindings.bind_pattern(&ord.right, b)
                && matches!(self.evaluator.evaluate(&ord.body, &bindings), Ok(true))
        };
        for i in 1..values.len() {
            let mut j = i;
            while j > 0 && less(&values[j], &values[j - 1]) {
                values.swap(j, j - 1);
                j -= 1;
            }
        }
    }
}

/// Maps over sampled domain/range values: the empty map, then growing
/// domain subsets zipped with range tuples, capped at `budget`.
fn maps(dom: &[Value], rng: &[Value], injective: bool, budget: usize) -> Vec<Value> {
    let mut out = vec![Value::empty_map()];
    if rng.is_empty() {
        return out;
    }
    'sizes: for d in 1..=dom.len() {
        for keys in Combinations::new(dom.len(), d) {
            let ranges: Box<dyn Iterator<Item = Vec<usize>>> = if injective {
                Box::new(Permutations::new(rng.len(), d))
            } else {
                Box::new(PermutationsWithRepetition::new(rng.len(), d))
            };
            for values in ranges {
                if out.len() >= budget {
                    break 'sizes;
                }
                out.push(Value::map_from_iter(
                    keys.iter()
                        .zip(&values)
                        .map(|(&k, &v)| (dom[k].clone(), rng[v].clone())),
                ));
            }
        }
    }
    out.truncate(budget);
    out
}

/// Union of alternative samples. Everything fits: concatenate. Otherwise
/// take one value from each alternative in turn until `budget` is reached.
fn round_robin(samples: Vec<Vec<Value>>, budget: usize) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let total: usize = samples.iter().map(Vec::len).sum();
    if total <= budget {
        for v in samples.into_iter().flatten() {
            if seen.insert(v.clone()) {
                out.push(v);
            }
        }
        return out;
    }
    let mut iters: Vec<_> = samples.into_iter().map(Vec::into_iter).collect();
    while out.len() < budget {
        let mut progressed = false;
        for it in iters.iter_mut() {
            if out.len() >= budget {
                break;
            }
            if let Some(v) = it.next() {
                progressed = true;
                if seen.insert(v.clone()) {
                    out.push(v);
                }
            }
        }
        if !progressed {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdmcheck_eval::Interpreter;
    use vdmcheck_syntax::{BinOp, Expr, NamedDef, Pattern, RecordDef};

    fn sample_with(env: &TypeEnv, strategy: Strategy, ty: &Type, budget: usize) -> Vec<Value> {
        let interp = Interpreter::new(env);
        let config = SearchConfig::default().with_strategy(strategy);
        let mut sampler = Sampler::new(env, &interp, &config);
        sampler.sample_top(ty, budget).unwrap()
    }

    fn sample_fixed(env: &TypeEnv, ty: &Type, budget: usize) -> Vec<Value> {
        sample_with(env, Strategy::Fixed, ty, budget)
    }

    #[test]
    fn test_boolean_budgets() {
        let env = TypeEnv::new();
        assert!(sample_fixed(&env, &Type::Boolean, 0).is_empty());
        assert_eq!(sample_fixed(&env, &Type::Boolean, 1), vec![Value::Bool(false)]);
        let both = sample_fixed(&env, &Type::Boolean, 2);
        assert_eq!(both.len(), 2);
        assert!(both.contains(&Value::Bool(true)) && both.contains(&Value::Bool(false)));
        assert_eq!(sample_fixed(&env, &Type::Boolean, 10).len(), 2);
    }

    #[test]
    fn test_integer_window() {
        let env = TypeEnv::new();
        let ints = sample_fixed(&env, &Type::int(), 5);
        assert_eq!(ints, (-2..=2).map(Value::Int).collect::<Vec<_>>());
        let nats = sample_fixed(&env, &Type::nat1(), 3);
        assert_eq!(nats, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_optional_and_quote() {
        let env = TypeEnv::new();
        assert_eq!(
            sample_fixed(&env, &Type::optional(Type::nat()), 1),
            vec![Value::Nil]
        );
        let opt = sample_fixed(&env, &Type::optional(Type::nat()), 3);
        assert_eq!(opt, vec![Value::Nil, Value::Int(0), Value::Int(1)]);
        assert_eq!(
            sample_fixed(&env, &Type::Quote("A".into()), 5),
            vec![Value::Quote("A".into())]
        );
    }

    #[test]
    fn test_named_invariant_filters() {
        let mut env = TypeEnv::new();
        env.define_named(NamedDef::new("Even", Type::nat()).with_inv(InvariantDef::new(
            Pattern::ident("e"),
            Expr::eq(
                Expr::binary(BinOp::Mod, Expr::var("e"), Expr::int(2)),
                Expr::int(0),
            ),
        )))
        .unwrap();
        let values = sample_fixed(&env, &Type::named("Even"), 6);
        assert_eq!(values, vec![Value::Int(0), Value::Int(2), Value::Int(4)]);
        assert!(values.iter().all(|v| matches!(v, Value::Named { .. })));
    }

    #[test]
    fn test_named_ord_sorts() {
        let mut env = TypeEnv::new();
        env.define_named(NamedDef::new("Desc", Type::nat()).with_ord(OrderDef {
            left: Pattern::ident("a"),
            right: Pattern::ident("b"),
            body: Expr::binary(BinOp::Gt, Expr::var("a"), Expr::var("b")),
        }))
        .unwrap();
        let values = sample_fixed(&env, &Type::named("Desc"), 4);
        assert_eq!(
            values,
            vec![Value::Int(3), Value::Int(2), Value::Int(1), Value::Int(0)]
        );
    }

    #[test]
    fn test_recursive_named_terminates() {
        let mut env = TypeEnv::new();
        // Tree = [nat * Tree]
        env.define_named(NamedDef::new(
            "Tree",
            Type::optional(Type::Product(vec![Type::nat(), Type::named("Tree")])),
        ))
        .unwrap();
        let values = sample_fixed(&env, &Type::named("Tree"), 5);
        assert!(!values.is_empty());
        assert!(values.len() <= 5);
    }

    #[test]
    fn test_record_product_and_invariant() {
        let mut env = TypeEnv::new();
        env.define_record(
            RecordDef::new(
                "P",
                [("x".to_string(), Type::nat()), ("y".to_string(), Type::nat())],
            )
            .with_inv(InvariantDef::new(
                Pattern::Record {
                    tag: "P".into(),
                    fields: vec![Pattern::ident("x"), Pattern::ident("y")],
                },
                Expr::binary(BinOp::Le, Expr::var("x"), Expr::var("y")),
            )),
        )
        .unwrap();
        env.define_record(RecordDef::new("Unit", Vec::new())).unwrap();

        let values = sample_fixed(&env, &Type::record("P"), 9);
        // 3 x 3 grid with x <= y keeps 6.
        assert_eq!(values.len(), 6);
        assert_eq!(
            sample_fixed(&env, &Type::record("Unit"), 4),
            vec![Value::record("Unit", Vec::new())]
        );
    }

    #[test]
    fn test_power_set_start() {
        let env = TypeEnv::new();
        // Base {false, true}: fixed starts at min(3, 2) = 2.
        let fixed = sample_fixed(&env, &Type::set(Type::Boolean), 10);
        assert_eq!(fixed.len(), 2);
        assert_eq!(fixed[0], Value::empty_set());

        let exhaustive = sample_with(&env, Strategy::ExhaustiveBounded, &Type::set(Type::Boolean), 10);
        assert_eq!(exhaustive.len(), 4);

        let non_empty = sample_with(
            &env,
            Strategy::ExhaustiveBounded,
            &Type::seq1(Type::Boolean),
            10,
        );
        assert!(non_empty.iter().all(|v| !v.is_empty_collection()));
    }

    #[test]
    fn test_collections_respect_budget() {
        let env = TypeEnv::new();
        for ty in [
            Type::set(Type::nat()),
            Type::seq(Type::int()),
            Type::map(Type::nat(), Type::Boolean),
            Type::inmap(Type::nat(), Type::nat()),
        ] {
            let values = sample_fixed(&env, &ty, 7);
            assert!(values.len() <= 7, "{} produced {}", ty, values.len());
            assert!(!values.is_empty());
        }
    }

    #[test]
    fn test_injective_maps() {
        let env = TypeEnv::new();
        let maps = sample_with(
            &env,
            Strategy::ExhaustiveBounded,
            &Type::inmap(Type::Boolean, Type::Boolean),
            20,
        );
        for m in &maps {
            let entries = m.as_map().unwrap();
            let rng: BTreeSet<_> = entries.iter().map(|(_, v)| v.clone()).collect();
            assert_eq!(rng.len(), entries.len());
        }
        // {}, two singletons for each key, two bijections.
        assert_eq!(maps.len(), 7);
    }

    #[test]
    fn test_union_round_robin() {
        let env = TypeEnv::new();
        let ty = Type::Union(vec![Type::Boolean, Type::nat()]);
        let values = sample_fixed(&env, &ty, 4);
        assert_eq!(values.len(), 4);
        assert!(values.iter().any(|v| matches!(v, Value::Bool(_))));
        assert!(values.iter().any(|v| matches!(v, Value::Int(_))));
    }

    #[test]
    fn test_function_and_class() {
        let env = TypeEnv::new();
        let f = Type::Function {
            params: vec![Type::nat()],
            result: Box::new(Type::Boolean),
        };
        assert_eq!(sample_fixed(&env, &f, 3).len(), 1);

        let interp = Interpreter::new(&env);
        let config = SearchConfig::default().with_strategy(Strategy::ExhaustiveBounded);
        let mut sampler = Sampler::new(&env, &interp, &config);
        assert!(sampler.sample_top(&f, 3).is_err());

        let objs = sample_fixed(&env, &Type::Class("Account".into()), 3);
        assert!(matches!(&objs[..], [Value::Object(o)] if o.class == "Account"));
    }

    #[test]
    fn test_unknown_type_name() {
        let env = TypeEnv::new();
        let interp = Interpreter::new(&env);
        let mut sampler = Sampler::new(&env, &interp, &SearchConfig::default());
        assert!(sampler.sample_top(&Type::named("Missing"), 3).is_err());
    }
}
