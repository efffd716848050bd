//! Search configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Value generation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Small deterministic windows around zero.
    #[default]
    Fixed,
    /// Seeded random draws biased toward small magnitudes.
    Random,
    /// Deterministic and complete within the budget; rejects function types.
    #[serde(alias = "exhaustive", alias = "finite")]
    ExhaustiveBounded,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Fixed => "fixed",
            Strategy::Random => "random",
            Strategy::ExhaustiveBounded => "exhaustive-bounded",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown strategy '{0}' (expected fixed, random or exhaustive-bounded)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Strategy::Fixed),
            "random" => Ok(Strategy::Random),
            "exhaustive-bounded" | "exhaustive" | "finite" => Ok(Strategy::ExhaustiveBounded),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Counterexample search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: Strategy,
    /// Per-type sample cap.
    pub budget: usize,
    /// Seed for the random strategy.
    pub seed: u64,
    /// Cap on candidate bindings per searched quantifier.
    pub max_trials: usize,
    /// Wall-clock limit for one obligation's candidate loop.
    pub time_limit: Option<Duration>,
    /// Run independent obligations on the rayon pool.
    pub parallel: bool,
    /// Worker threads (0 = rayon default).
    pub num_threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Fixed,
            budget: 10,
            seed: 0,
            max_trials: 1000,
            time_limit: None,
            parallel: true,
            num_threads: 0,
        }
    }
}

impl SearchConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy() {
        assert_eq!("fixed".parse::<Strategy>(), Ok(Strategy::Fixed));
        assert_eq!("Random".parse::<Strategy>(), Ok(Strategy::Random));
        assert_eq!("finite".parse::<Strategy>(), Ok(Strategy::ExhaustiveBounded));
        assert_eq!(
            "exhaustive-bounded".parse::<Strategy>(),
            Ok(Strategy::ExhaustiveBounded)
        );
        assert!("smart".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_defaults_and_builders() {
        let config = SearchConfig::default();
        assert_eq!(config.strategy, Strategy::Fixed);
        assert_eq!(config.budget, 10);
        assert_eq!(config.max_trials, 1000);
        assert!(config.time_limit.is_none());

        let config = config
            .with_strategy(Strategy::Random)
            .with_seed(7)
            .with_budget(4);
        assert_eq!(config.strategy, Strategy::Random);
        assert_eq!(config.seed, 7);
        assert_eq!(config.budget, 4);
    }

    #[test]
    fn test_strategy_display_matches_parse() {
        for s in [Strategy::Fixed, Strategy::Random, Strategy::ExhaustiveBounded] {
            assert_eq!(s.to_string().parse::<Strategy>(), Ok(s));
        }
    }
}
