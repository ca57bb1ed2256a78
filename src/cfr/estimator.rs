//! Sampled counterfactual regret.
//!
//! For a trajectory `z`, acting player `i` at round `j` with hand `A`:
//!
//! ```text
//! W        = u_i(z) * π_opp(z[:j]) / q
//! full     = π_i(z)            pre  = π_i(z[:j])            post = π_i(z[:j+1])
//! r(a)     = -W * full / pre                      a not played at round j
//! r(a)     =  W * full * (1/post - 1/pre)         a played at round j
//! ```
//!
//! `q` is the probability the trajectory was sampled with, `1/(N!)²`. The
//! played-action branch uses the realized continuation's reach `post`, not a
//! hypothetical one. Under the player's current strategy the estimate has
//! zero expectation over the hand.

use crate::cfr::action_set::{ActionSet, Card};
use crate::cfr::reach::{reach_probability, StrategySource};
use crate::cfr::sampler::Trajectory;
use crate::error::{SolverError, SolverResult};

/// Regret estimate for every card in the acting player's hand at `prefix`,
/// in ascending card order.
///
/// `own` and `opponent` are the current strategies of `seat` and the other
/// player. A trajectory the player cannot reach under `own` contributes 0.
pub fn estimate_regrets<P, O>(
    own: &P,
    opponent: &O,
    deck: ActionSet,
    trajectory: &Trajectory,
    seat: usize,
    prefix: usize,
    sampling_probability: f64,
) -> SolverResult<Vec<f64>>
where
    P: StrategySource + ?Sized,
    O: StrategySource + ?Sized,
{
    let plays = &trajectory.plays[seat];
    let hand = trajectory
        .prefix(seat, prefix)
        .iter()
        .fold(deck, |hand, &card| hand.without(card));
    let played = plays[prefix];
    if !hand.contains(played) {
        return Err(SolverError::ForeignAction { card: played, set: hand });
    }

    let opponent_reach = reach_probability(opponent, deck, trajectory.prefix(1 - seat, prefix))?;
    let weight = trajectory.payoff[seat] * opponent_reach / sampling_probability;

    let full = reach_probability(own, deck, plays)?;
    let pre = reach_probability(own, deck, &plays[..prefix])?;
    if full <= 0.0 || pre <= 0.0 {
        return Ok(vec![0.0; hand.len()]);
    }
    let post = reach_probability(own, deck, &plays[..=prefix])?;

    let regrets = hand
        .cards()
        .map(|card: Card| {
            if card != played {
                -weight * full / pre
            } else {
                weight * full * (1.0 / post - 1.0 / pre)
            }
        })
        .collect();
    Ok(regrets)
}

/// Running per-action mean and spread of trial estimates at one information set.
#[derive(Debug, Clone, PartialEq)]
pub struct RegretAccumulator {
    sums: Vec<f64>,
    squares: Vec<f64>,
    count: u64,
}

impl RegretAccumulator {
    /// Empty accumulator for a hand of `num_actions` cards.
    pub fn new(num_actions: usize) -> Self {
        Self {
            sums: vec![0.0; num_actions],
            squares: vec![0.0; num_actions],
            count: 0,
        }
    }

    /// Add one trial's estimate.
    pub fn add(&mut self, estimate: &[f64]) {
        debug_assert_eq!(estimate.len(), self.sums.len());
        for ((sum, square), &r) in self.sums.iter_mut().zip(self.squares.iter_mut()).zip(estimate.iter()) {
            *sum += r;
            *square += r * r;
        }
        self.count += 1;
    }

    /// Number of trials added so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean per action; zeros if nothing was added.
    pub fn mean(&self) -> Vec<f64> {
        if self.count == 0 {
            return vec![0.0; self.sums.len()];
        }
        let count = self.count as f64;
        self.sums.iter().map(|&s| s / count).collect()
    }

    /// Population variance per action across the trials added so far.
    ///
    /// Zero with fewer than two trials.
    pub fn variance(&self) -> Vec<f64> {
        if self.count < 2 {
            return vec![0.0; self.sums.len()];
        }
        let count = self.count as f64;
        self.sums
            .iter()
            .zip(self.squares.iter())
            .map(|(&s, &sq)| {
                let mean = s / count;
                (sq / count - mean * mean).max(0.0)
            })
            .collect()
    }

    /// Across-trial variance averaged over the hand's actions.
    pub fn mean_variance(&self) -> f64 {
        let variance = self.variance();
        if variance.is_empty() {
            0.0
        } else {
            variance.iter().sum::<f64>() / variance.len() as f64
        }
    }
}
