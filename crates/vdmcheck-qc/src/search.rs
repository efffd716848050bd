//! Counterexample search over one proof obligation, and over batches.

use crate::boundary::{suggest_into, Suggestions};
use crate::collect::{collect_type_binds, conjunctive_foralls, type_binds_of};
use crate::combinatorics::{least_power, Selector};
use crate::config::SearchConfig;
use crate::error::SearchResult;
use crate::evaluator::Evaluator;
use crate::sampler::Sampler;
use crate::trivial::{TrivialProof, TrivialProver};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};
use vdmcheck_eval::{Bindings, Value};
use vdmcheck_syntax::{Expr, MultipleBind, ProofObligation, TypeBind, TypeEnv};

/// Result of searching one obligation.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Discharged by its own structure.
    Proved(TrivialProof),
    /// A binding under which the predicate is false.
    Disproved { binding: Vec<(String, Value)> },
    /// Some type bind has no values to try.
    Inconclusive { reason: String },
    /// Every candidate held, or the search ran out of time.
    Undetermined {
        trials: usize,
        skipped: usize,
        timed_out: bool,
    },
}

impl SearchOutcome {
    /// One-word status for reports.
    pub fn status(&self) -> &'static str {
        match self {
            SearchOutcome::Proved(_) => "PROVABLE",
            SearchOutcome::Disproved { .. } => "FAILED",
            SearchOutcome::Inconclusive { .. } => "UNCHECKED",
            SearchOutcome::Undetermined { .. } => "MAYBE",
        }
    }

    pub fn is_disproved(&self) -> bool {
        matches!(self, SearchOutcome::Disproved { .. })
    }
}

/// Sampled values per type bind.
pub type Ranges = HashMap<TypeBind, Arc<Vec<Value>>>;

#[derive(Debug, Default)]
struct Stats {
    trials: usize,
    skipped: usize,
    timed_out: bool,
}

/// Searches obligations against one type environment and evaluator.
pub struct QuickCheck<'a> {
    env: &'a TypeEnv,
    evaluator: &'a dyn Evaluator,
    config: &'a SearchConfig,
}

impl<'a> QuickCheck<'a> {
    pub fn new(env: &'a TypeEnv, evaluator: &'a dyn Evaluator, config: &'a SearchConfig) -> Self {
        Self {
            env,
            evaluator,
            config,
        }
    }

    /// Search one predicate for a falsifying binding.
    pub fn search(&self, predicate: &Expr) -> SearchResult<SearchOutcome> {
        let binds = collect_type_binds(predicate);
        debug!(binds = binds.len(), "collected type binds");

        if let Some(proof) = TrivialProver::new().prove(predicate) {
            return Ok(SearchOutcome::Proved(proof));
        }

        let targets = select_targets(predicate);
        let mut suggestions = Suggestions::new();
        for target in &targets {
            for body in chain_bodies(target) {
                suggest_into(body, &mut suggestions);
            }
        }

        let mut sampler = Sampler::new(self.env, self.evaluator, self.config);
        let ranges = match self.sample_binds(&mut sampler, &binds, &suggestions)? {
            Ok(ranges) => ranges,
            Err(reason) => {
                debug!(reason = %reason, "inconclusive");
                return Ok(SearchOutcome::Inconclusive { reason });
            }
        };

        let mut base = Bindings::new();
        for (bind, values) in &ranges {
            base.set_range(bind.clone(), Arc::clone(values));
        }

        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);
        let mut stats = Stats::default();
        for target in targets {
            if let Some(binding) =
                self.search_target(target, &base, &ranges, deadline, &mut stats)?
            {
                return Ok(SearchOutcome::Disproved { binding });
            }
            if stats.timed_out {
                break;
            }
        }
        Ok(SearchOutcome::Undetermined {
            trials: stats.trials,
            skipped: stats.skipped,
            timed_out: stats.timed_out,
        })
    }

    /// Sample every type bind, boundary suggestions first. `Ok(Err(reason))`
    /// when some bind has nothing to try.
    fn sample_binds(
        &self,
        sampler: &mut Sampler,
        binds: &[TypeBind],
        suggestions: &Suggestions,
    ) -> SearchResult<Result<Ranges, String>> {
        let mut ranges = Ranges::new();
        for bind in binds {
            let sampled = sampler.sample_top(&bind.ty, self.config.budget)?;
            let mut values: Vec<Value> = Vec::with_capacity(sampled.len());
            if let Some(extra) = bind
                .pattern
                .as_ident()
                .and_then(|name| suggestions.get(name))
            {
                for value in extra {
                    if sampler.admits(&bind.ty, value) && !contains(&values, value) {
                        values.push(value.clone());
                    }
                }
            }
            for value in sampled {
                if !contains(&values, &value) {
                    values.push(value);
                }
            }
            if values.is_empty() {
                return Ok(Err(format!(
                    "no values of type {} for {}",
                    bind.ty, bind.pattern
                )));
            }
            trace!(bind = %bind.pattern, ty = %bind.ty, size = values.len(), "range");
            ranges.insert(bind.clone(), Arc::new(values));
        }
        Ok(Ok(ranges))
    }

    /// Enumerate the bounded product over the target's leading type binds.
    fn search_target(
        &self,
        target: &Expr,
        base: &Bindings,
        ranges: &Ranges,
        deadline: Option<Instant>,
        stats: &mut Stats,
    ) -> SearchResult<Option<Vec<(String, Value)>>> {
        let (dims, residual) = split_leading_binds(target);
        let samples: Vec<Arc<Vec<Value>>> = dims
            .iter()
            .map(|bind| ranges.get(bind).cloned().unwrap_or_default())
            .collect();
        let per_dim = least_power(dims.len(), self.config.max_trials);
        let sizes: Vec<usize> = samples.iter().map(|s| s.len().min(per_dim)).collect();
        let selector = Selector::new(&sizes);
        debug!(
            dims = dims.len(),
            per_dim,
            candidates = selector.len_hint().min(self.config.max_trials),
            target = %residual,
            "searching"
        );

        'candidates: for selection in selector.take(self.config.max_trials) {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                info!(trials = stats.trials, "reached time limit");
                stats.timed_out = true;
                return Ok(None);
            }
            stats.trials += 1;
            let mut bindings = base.clone();
            for ((bind, sample), &i) in dims.iter().zip(&samples).zip(&selection) {
                if !bindings.bind_pattern(&bind.pattern, &sample[i]) {
                    stats.skipped += 1;
                    continue 'candidates;
                }
            }
            match self.evaluator.evaluate(&residual, &bindings) {
                Ok(true) => {}
                Ok(false) => {
                    let binding: Vec<(String, Value)> = bindings
                        .values()
                        .map(|(name, value)| (name.to_string(), value.clone()))
                        .collect();
                    info!(trials = stats.trials, "counterexample found");
                    return Ok(Some(binding));
                }
                Err(e) => {
                    trace!(error = %e, "candidate skipped");
                    stats.skipped += 1;
                }
            }
        }
        Ok(None)
    }
}

/// Membership up to named-type wrappers; suggestions arrive unwrapped.
fn contains(values: &[Value], value: &Value) -> bool {
    let bare = value.unwrap_named();
    values.iter().any(|v| v.unwrap_named() == bare)
}

/// The root when it is a `forall`; else the `forall`s reachable through
/// `and`; else the root itself.
fn select_targets(predicate: &Expr) -> Vec<&Expr> {
    if matches!(predicate, Expr::Forall { .. }) {
        return vec![predicate];
    }
    let foralls = conjunctive_foralls(predicate);
    if foralls.is_empty() {
        vec![predicate]
    } else {
        foralls
    }
}

/// Bodies under the leading chain of `forall`s, outermost first.
fn chain_bodies(expr: &Expr) -> Vec<&Expr> {
    let mut out = Vec::new();
    let mut current = expr;
    while let Expr::Forall { body, .. } = current {
        out.push(&**body);
        current = body;
    }
    if out.is_empty() {
        out.push(expr);
    }
    out
}

/// Split the leading `forall` chain into product dimensions (its type binds)
/// and the residual predicate. A level with collection binds keeps them in a
/// residual `forall` and ends the chain.
fn split_leading_binds(expr: &Expr) -> (Vec<TypeBind>, Expr) {
    let mut dims = Vec::new();
    let mut current = expr;
    while let Expr::Forall { binds, body } = current {
        let (typed, rest): (Vec<&MultipleBind>, Vec<&MultipleBind>) = binds
            .iter()
            .partition(|b| matches!(b, MultipleBind::Type { .. }));
        for bind in typed {
            dims.extend(type_binds_of(bind));
        }
        if !rest.is_empty() {
            let residual = Expr::Forall {
                binds: rest.into_iter().cloned().collect(),
                body: body.clone(),
            };
            return (dims, residual);
        }
        current = body;
    }
    (dims, current.clone())
}

/// Search one predicate with a fresh sampler.
pub fn search(
    predicate: &Expr,
    env: &TypeEnv,
    evaluator: &dyn Evaluator,
    config: &SearchConfig,
) -> SearchResult<SearchOutcome> {
    QuickCheck::new(env, evaluator, config).search(predicate)
}

/// Result for one obligation of a batch.
#[derive(Debug)]
pub struct ObligationReport {
    pub name: String,
    pub kind: String,
    pub outcome: SearchResult<SearchOutcome>,
    pub elapsed: Duration,
}

/// Search independent obligations, in parallel when configured. Reports
/// come back in input order.
pub fn check_all(
    obligations: &[ProofObligation],
    env: &TypeEnv,
    evaluator: &dyn Evaluator,
    config: &SearchConfig,
) -> Vec<ObligationReport> {
    if config.parallel && config.num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build_global()
        {
            debug!(error = %e, "thread pool already initialized, using existing pool");
        }
    }
    info!(
        obligations = obligations.len(),
        strategy = %config.strategy,
        budget = config.budget,
        parallel = config.parallel,
        "checking obligations"
    );

    let check_one = |po: &ProofObligation| {
        let start = Instant::now();
        let outcome = search(&po.predicate, env, evaluator, config);
        let elapsed = start.elapsed();
        match &outcome {
            Ok(o) => debug!(name = %po.name, status = o.status(), ?elapsed, "obligation checked"),
            Err(e) => debug!(name = %po.name, error = %e, "obligation failed"),
        }
        ObligationReport {
            name: po.name.clone(),
            kind: po.kind.clone(),
            outcome,
            elapsed,
        }
    };

    if config.parallel {
        obligations.par_iter().map(check_one).collect()
    } else {
        obligations.iter().map(check_one).collect()
    }
}
