//! Reach probabilities of card sequences under a strategy table.

use serde::{Deserialize, Serialize};

use crate::cfr::action_set::{ActionSet, Card};
use crate::error::{SolverError, SolverResult};

/// Read access to one player's per-information-set strategy.
///
/// Implemented by live views into the store and by owned snapshots, so the
/// same reach computation serves training and evaluation.
pub trait StrategySource {
    /// Probability of playing `card` from information set `set`.
    fn probability(&self, set: ActionSet, card: Card) -> SolverResult<f64>;
}

/// Probability that a player following `strategy` plays exactly `sequence`
/// as the first `sequence.len()` rounds, starting from the hand `deck`.
///
/// The empty sequence has probability 1. A zero factor makes the result
/// exactly 0; it never yields NaN. Playing a card that is not in the current
/// hand is an [`SolverError::ForeignAction`].
pub fn reach_probability<S>(strategy: &S, deck: ActionSet, sequence: &[Card]) -> SolverResult<f64>
where
    S: StrategySource + ?Sized,
{
    let mut hand = deck;
    let mut prob = 1.0;
    for &card in sequence {
        if !hand.contains(card) {
            return Err(SolverError::ForeignAction { card, set: hand });
        }
        prob *= strategy.probability(hand, card)?;
        hand = hand.without(card);
    }
    Ok(prob)
}

/// Owned per-information-set distributions, indexed by [`ActionSet::index`].
///
/// Used for consistent snapshots of a player's current strategy and for the
/// normalized average strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTable {
    deck_size: usize,
    /// `distributions[set.index()]` lists probabilities in ascending card order.
    distributions: Vec<Vec<f64>>,
}

impl StrategyTable {
    /// Uniform strategy over every subset of an `n`-card deck.
    pub fn uniform(n: usize) -> Self {
        let distributions = (0..1usize << n)
            .map(|index| {
                let len = ActionSet::from_index(index).len();
                vec![1.0 / len as f64; len]
            })
            .collect();
        Self { deck_size: n, distributions }
    }

    /// Build a table from distributions indexed by set.
    pub fn from_distributions(deck_size: usize, distributions: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(distributions.len(), 1usize << deck_size);
        Self { deck_size, distributions }
    }

    /// Deck size the table covers.
    pub fn deck_size(&self) -> usize {
        self.deck_size
    }

    /// Distribution at `set`, in ascending card order.
    pub fn distribution(&self, set: ActionSet) -> &[f64] {
        &self.distributions[set.index()]
    }

    /// Overwrite the distribution at `set`.
    pub fn set_distribution(&mut self, set: ActionSet, distribution: Vec<f64>) {
        debug_assert_eq!(distribution.len(), set.len());
        self.distributions[set.index()] = distribution;
    }
}

impl StrategySource for StrategyTable {
    fn probability(&self, set: ActionSet, card: Card) -> SolverResult<f64> {
        let position = set
            .position(card)
            .ok_or(SolverError::ForeignAction { card, set })?;
        Ok(self.distributions[set.index()][position])
    }
}
