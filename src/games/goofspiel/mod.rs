//! Goofspiel (the Game of Pure Strategy) for two players.
//!
//! ## Game Rules
//!
//! - Each player holds one card of every value `1..=N`
//! - There are N rounds; round `k` (0-indexed) is worth `N - k`
//! - Both players play one card face down, then reveal
//! - The higher card takes the prize, scored zero-sum as `+prize/2` for the
//!   winner and `-prize/2` for the loser; equal cards score nothing
//!
//! A player never learns anything they could act on beyond their own
//! remaining hand, which is why information sets are keyed by that hand
//! alone.
//!
//! ## Example (N = 3)
//!
//! ```text
//! round  prize  P1  P2   P1 score
//!   0      3     3   2     +1.5
//!   1      2     1   3     -1.0
//!   2      1     2   1     +0.5
//!                          ----
//!                          +1.0   (P2: -1.0)
//! ```

pub mod output;

use crate::cfr::action_set::Card;
use crate::cfr::config::{CFRStats, EstimatorKind, SolverConfig};
use crate::cfr::game::PayoffOracle;
use crate::cfr::sampler::{ResamplingSampler, TerminalSampler, UniformSampler};
use crate::cfr::solver::{CFRSolver, Solution};
use crate::error::{SolverError, SolverResult};

/// Two-player Goofspiel with an `N`-card hand per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goofspiel {
    deck_size: usize,
}

impl Goofspiel {
    /// Create a game where each player holds cards `1..=deck_size`.
    pub fn new(deck_size: usize) -> Self {
        Self { deck_size }
    }

    /// Prize of round `round` when `rounds` rounds are scored.
    pub fn prize(rounds: usize, round: usize) -> f64 {
        (rounds - round) as f64
    }
}

impl PayoffOracle for Goofspiel {
    fn deck_size(&self) -> usize {
        self.deck_size
    }

    /// Score the rounds of two equal-length sequences.
    ///
    /// The prize pile is sized to the sequences given, so a length-`j`
    /// prefix is scored with prizes `j, ..., 1`.
    fn payoff(&self, first: &[Card], second: &[Card]) -> SolverResult<[f64; 2]> {
        if first.len() != second.len() {
            return Err(SolverError::MismatchedLengths {
                first: first.len(),
                second: second.len(),
            });
        }

        let rounds = first.len();
        let mut score = 0.0;
        for (round, (&a, &b)) in first.iter().zip(second.iter()).enumerate() {
            let half = Self::prize(rounds, round) / 2.0;
            if a > b {
                score += half;
            } else if a < b {
                score -= half;
            }
        }

        Ok([score, -score])
    }

    fn name(&self) -> String {
        format!("goofspiel-{}", self.deck_size)
    }
}

/// Train a Goofspiel solver for `config` and return its final tables.
///
/// Two players, `config.deck_size` cards each, `iterations` iterations,
/// using the estimator `config.estimator` selects.
pub fn run(config: &SolverConfig, iterations: u64) -> SolverResult<Solution> {
    run_with_callback(config, iterations, iterations.max(1), |_| {})
}

/// Like [`run`], calling `callback` every `callback_interval` iterations.
pub fn run_with_callback<F>(
    config: &SolverConfig,
    iterations: u64,
    callback_interval: u64,
    callback: F,
) -> SolverResult<Solution>
where
    F: FnMut(&CFRStats),
{
    let game = Goofspiel::new(config.deck_size);
    match config.estimator {
        EstimatorKind::OutcomeSampling => {
            let solver = CFRSolver::new(game, UniformSampler, config.clone())?;
            train(solver, iterations, callback_interval, callback)
        }
        EstimatorKind::AveragedOutcome => {
            let sampler = ResamplingSampler::from_config(config)?;
            let solver = CFRSolver::new(game, sampler, config.clone())?;
            train(solver, iterations, callback_interval, callback)
        }
    }
}

fn train<S, F>(
    mut solver: CFRSolver<Goofspiel, S>,
    iterations: u64,
    callback_interval: u64,
    callback: F,
) -> SolverResult<Solution>
where
    S: TerminalSampler,
    F: FnMut(&CFRStats),
{
    solver.train_with_callback(iterations, callback_interval, callback)?;
    Ok(solver.solution())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn test_three_card_example() {
        let game = Goofspiel::new(3);
        assert_eq!(game.payoff(&[3, 1, 2], &[2, 3, 1]).unwrap(), [1.0, -1.0]);
    }

    #[test]
    fn test_ties_score_nothing() {
        let game = Goofspiel::new(4);
        assert_eq!(game.payoff(&[1, 2, 3, 4], &[1, 2, 3, 4]).unwrap(), [0.0, 0.0]);
        // Rounds 1 (prize 3) and 3 (prize 1) are decided.
        assert_eq!(game.payoff(&[4, 1, 3, 2], &[4, 2, 3, 1]).unwrap(), [-1.5 + 0.5, 1.5 - 0.5]);
    }

    #[test]
    fn test_zero_sum_and_symmetry() {
        let game = Goofspiel::new(6);
        let mut rng = StdRng::seed_from_u64(11);
        let mut a: Vec<Card> = (1..=6).collect();
        let mut b = a.clone();

        for _ in 0..200 {
            a.shuffle(&mut rng);
            b.shuffle(&mut rng);
            let forward = game.payoff(&a, &b).unwrap();
            let backward = game.payoff(&b, &a).unwrap();
            assert_eq!(forward[0] + forward[1], 0.0);
            assert_eq!(forward, [backward[1], backward[0]]);
        }
    }

    #[test]
    fn test_prefix_uses_its_own_prize_pile() {
        let game = Goofspiel::new(5);
        // Two rounds scored with prizes 2 and 1.
        assert_eq!(game.payoff(&[5, 1], &[4, 2]).unwrap(), [1.0 - 0.5, -0.5]);
        assert_eq!(game.payoff(&[], &[]).unwrap(), [0.0, 0.0]);
    }

    #[test]
    fn test_run_both_estimators() {
        for config in [
            SolverConfig::outcome_sampling(3).with_seed(17),
            SolverConfig::averaged(3).with_seed(17).with_threads(1),
        ] {
            let solution = run(&config, 40).unwrap();
            assert_eq!(solution.stats.iterations, 40);
            assert_eq!(solution.tables.labels.len(), 8);
            assert_eq!(solution.tables.visits["{1,2,3}"], 80);
            for label in &solution.tables.labels {
                let strategy = &solution.tables.current_strategy[0][label];
                if !strategy.is_empty() {
                    assert!((strategy.iter().sum::<f64>() - 1.0).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let err = run(&SolverConfig::outcome_sampling(0), 1).unwrap_err();
        assert!(matches!(err, SolverError::Config(_)));
    }

    #[test]
    fn test_callback_interval() {
        let mut calls = Vec::new();
        run_with_callback(&SolverConfig::outcome_sampling(3).with_seed(2), 10, 3, |stats| {
            calls.push(stats.iterations)
        })
        .unwrap();
        assert_eq!(calls, vec![3, 6, 9]);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let game = Goofspiel::new(3);
        let err = game.payoff(&[1, 2, 3], &[1, 2]).unwrap_err();
        assert!(matches!(err, SolverError::MismatchedLengths { first: 3, second: 2 }));
        assert!(err.is_invalid_input());
    }
}
