//! Configuration options for the CFR solver.
//!
//! This module provides the configuration struct that selects the regret
//! estimator and controls resampling, threading and seeding, plus the
//! statistics collected while training.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfr::action_set::MAX_DECK_SIZE;
use crate::error::SolverResult;

/// Which regret estimator drives the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Baseline outcome sampling: one uniform terminal trajectory per update.
    #[default]
    OutcomeSampling,
    /// Averaged outcome sampling: many payoff-preserving resampled
    /// trajectories per information set, averaged before the update.
    AveragedOutcome,
}

impl EstimatorKind {
    /// Short name used on the command line and in reports.
    pub fn name(&self) -> &'static str {
        match self {
            EstimatorKind::OutcomeSampling => "outcome",
            EstimatorKind::AveragedOutcome => "averaged",
        }
    }

    /// Parse the short name produced by [`EstimatorKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "outcome" | "os" | "mccfr" => Some(EstimatorKind::OutcomeSampling),
            "averaged" | "aos" => Some(EstimatorKind::AveragedOutcome),
            _ => None,
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the CFR solver.
///
/// # Example
/// ```
/// use goofspiel_cfr::cfr::{EstimatorKind, SolverConfig};
///
/// let config = SolverConfig::averaged(4).with_seed(7);
/// assert_eq!(config.estimator, EstimatorKind::AveragedOutcome);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Number of cards per player (N). Information sets are the `2^N`
    /// subsets of `{1, ..., N}`.
    pub deck_size: usize,

    /// Regret estimator to use.
    pub estimator: EstimatorKind,

    /// Divisor applied to the number of averaged trials per prefix.
    ///
    /// The full count `C(N,j)·(j!)²` is intractable past small decks, so it
    /// is divided by this factor. Only used by the averaged estimator.
    pub reduction_factor: u64,

    /// Optional hard cap on averaged trials per (player, prefix).
    ///
    /// `None` keeps the reduced count unchanged.
    pub max_trials: Option<u64>,

    /// Number of threads used to evaluate resampling trials.
    ///
    /// Set to 0 or 1 for single-threaded execution.
    /// Set to `None` to use rayon's global pool.
    pub num_threads: Option<usize>,

    /// Random seed for reproducibility.
    ///
    /// If set, the solver will use this seed for random number generation,
    /// making results reproducible. If `None`, a random seed is used.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            deck_size: 5,
            estimator: EstimatorKind::OutcomeSampling,
            reduction_factor: 4,
            max_trials: None,
            num_threads: None,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Create a new SolverConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline outcome-sampling configuration for an `n`-card deck.
    pub fn outcome_sampling(n: usize) -> Self {
        Self {
            deck_size: n,
            estimator: EstimatorKind::OutcomeSampling,
            ..Default::default()
        }
    }

    /// Averaged outcome-sampling configuration for an `n`-card deck.
    pub fn averaged(n: usize) -> Self {
        Self {
            deck_size: n,
            estimator: EstimatorKind::AveragedOutcome,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: SolverConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set the deck size.
    pub fn with_deck_size(mut self, n: usize) -> Self {
        self.deck_size = n;
        self
    }

    /// Builder method: set the estimator.
    pub fn with_estimator(mut self, estimator: EstimatorKind) -> Self {
        self.estimator = estimator;
        self
    }

    /// Builder method: set the trial reduction factor.
    pub fn with_reduction_factor(mut self, factor: u64) -> Self {
        self.reduction_factor = factor;
        self
    }

    /// Builder method: cap the number of averaged trials.
    pub fn with_max_trials(mut self, cap: u64) -> Self {
        self.max_trials = Some(cap);
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deck_size == 0 || self.deck_size > MAX_DECK_SIZE {
            return Err(ConfigError::InvalidDeckSize(self.deck_size));
        }

        if self.reduction_factor == 0 {
            return Err(ConfigError::InvalidReductionFactor);
        }

        if self.max_trials == Some(0) {
            return Err(ConfigError::InvalidTrialCap);
        }

        Ok(())
    }
}

/// Errors that can occur when validating solver configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Deck size is zero or too large for the eager information-set table.
    #[error("deck size {0} is out of range [1, {max}]", max = MAX_DECK_SIZE)]
    InvalidDeckSize(usize),
    /// Reduction factor of zero.
    #[error("reduction factor must be at least 1")]
    InvalidReductionFactor,
    /// Trial cap of zero would skip every update.
    #[error("trial cap must be at least 1")]
    InvalidTrialCap,
    /// The configured deck size disagrees with the game handed to the solver.
    #[error("configured deck size {config} does not match the game's {game}")]
    DeckSizeMismatch {
        /// Deck size from the configuration.
        config: usize,
        /// Deck size reported by the game.
        game: usize,
    },
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFRStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of information sets in the store.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Trajectories evaluated by the regret estimator.
    pub trials: u64,

    /// Resampling trials that found no payoff-preserving history and fell
    /// back to the realized prefix.
    pub resample_fallbacks: u64,

    /// Spread of the regret estimates at each round, indexed by prefix length.
    #[serde(default)]
    pub regret_variance: Vec<PrefixVariance>,
}

/// Spread of the regret estimates folded at one round.
///
/// `trial_variance` shows how much the trials behind one update disagree
/// (always 0 for plain outcome sampling). `estimate_variance` is the spread
/// of the folded estimates themselves across updates, pooled over actions,
/// and is the figure to compare between estimators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefixVariance {
    /// Updates folded at this round.
    pub updates: u64,
    /// Sum over updates of the across-trial variance.
    pub trial_variance_sum: f64,
    /// Per-action components of the folded estimates seen so far.
    pub components: u64,
    /// Sum of those components.
    pub estimate_sum: f64,
    /// Sum of their squares.
    pub estimate_sum_sq: f64,
}

impl PrefixVariance {
    /// Record one folded estimate and the across-trial variance behind it.
    pub fn record(&mut self, estimate: &[f64], trial_variance: f64) {
        self.updates += 1;
        self.trial_variance_sum += trial_variance;
        for &r in estimate {
            self.components += 1;
            self.estimate_sum += r;
            self.estimate_sum_sq += r * r;
        }
    }

    /// Mean across-trial variance per update.
    pub fn mean_trial_variance(&self) -> f64 {
        if self.updates == 0 {
            0.0
        } else {
            self.trial_variance_sum / self.updates as f64
        }
    }

    /// Population variance of the folded estimate components.
    pub fn estimate_variance(&self) -> f64 {
        if self.components < 2 {
            return 0.0;
        }
        let n = self.components as f64;
        let mean = self.estimate_sum / n;
        (self.estimate_sum_sq / n - mean * mean).max(0.0)
    }
}

impl CFRStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record the estimate folded at round `prefix`.
    pub fn record_variance(&mut self, prefix: usize, estimate: &[f64], trial_variance: f64) {
        if self.regret_variance.len() <= prefix {
            self.regret_variance.resize(prefix + 1, PrefixVariance::default());
        }
        self.regret_variance[prefix].record(estimate, trial_variance);
    }

    /// Share of resampling trials that hit the attempt budget.
    pub fn fallback_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.resample_fallbacks as f64 / self.trials as f64
        }
    }
}
