//! CFR (Counterfactual Regret Minimization) Solver Module.
//!
//! This module provides a Monte Carlo CFR engine for two-player, zero-sum
//! card-bidding games in which each player holds one card of every value and
//! only knows their own remaining hand.
//!
//! # Overview
//!
//! CFR is an iterative algorithm that converges to Nash equilibrium by:
//! 1. Estimating counterfactual regret for each action at each information set
//! 2. Updating strategies to minimize regret over time (regret matching)
//! 3. Averaging strategies across iterations to converge to equilibrium
//!
//! # Estimators
//!
//! - **Outcome sampling**: one uniformly sampled terminal trajectory per
//!   update, corrected by importance weighting ([`UniformSampler`]).
//! - **Averaged outcome sampling**: at every round, many resampled
//!   trajectories that reproduce the realized payoff of the rounds already
//!   played are averaged into one lower-variance estimate
//!   ([`ResamplingSampler`]).
//!
//! Both share the same [`InformationSetStore`], regret estimator and
//! strategy update. The average strategy uses optimistic, gap-weighted
//! averaging: an information set's strategy is credited with weight equal to
//! the number of iterations since the set was last updated.
//!
//! # Theory
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Lanctot, M., et al. "Monte Carlo Sampling for Regret Minimization in Extensive Games" (2009)

pub mod action_set;
pub mod config;
pub mod estimator;
pub mod evaluation;
pub mod game;
pub mod matching;
pub mod reach;
pub mod sampler;
pub mod solver;
pub mod storage;

// Re-export main types for convenient access
pub use action_set::{ActionSet, Card, MAX_DECK_SIZE};
pub use config::{CFRStats, ConfigError, EstimatorKind, PrefixVariance, SolverConfig};
pub use evaluation::{evaluate_against_uniform, MatchRecord};
pub use game::PayoffOracle;
pub use reach::{reach_probability, StrategySource, StrategyTable};
pub use sampler::{ResamplingSampler, TerminalSampler, Trajectory, UniformSampler};
pub use solver::{CFRSolver, Solution};
pub use storage::{InfoSetRecord, InformationSetStore, StorageExport, NUM_PLAYERS};
