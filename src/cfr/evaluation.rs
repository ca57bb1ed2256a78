//! Head-to-head evaluation of a trained strategy.
//!
//! The trained player draws each card from its strategy table; the opponent
//! plays a uniformly random permutation. Results are tallied from the first
//! player's point of view.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cfr::action_set::{ActionSet, Card};
use crate::cfr::game::PayoffOracle;
use crate::cfr::reach::StrategySource;
use crate::error::SolverResult;

/// Win/loss/tie tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Games played.
    pub games: u64,
    /// Games the trained player scored higher.
    pub wins: u64,
    /// Games the opponent scored higher.
    pub losses: u64,
    /// Drawn games.
    pub ties: u64,
}

impl MatchRecord {
    /// Fraction of games won.
    pub fn win_rate(&self) -> f64 {
        self.rate(self.wins)
    }

    /// Fraction of games lost.
    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }

    /// Fraction of games tied.
    pub fn tie_rate(&self) -> f64 {
        self.rate(self.ties)
    }

    fn rate(&self, count: u64) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            count as f64 / self.games as f64
        }
    }

    fn record(&mut self, payoff: [f64; 2]) {
        self.games += 1;
        if payoff[0] > payoff[1] {
            self.wins += 1;
        } else if payoff[0] < payoff[1] {
            self.losses += 1;
        } else {
            self.ties += 1;
        }
    }
}

/// Draw a full card sequence by following `strategy` from the full hand.
pub fn sample_sequence<S, R>(strategy: &S, deck_size: usize, rng: &mut R) -> SolverResult<Vec<Card>>
where
    S: StrategySource + ?Sized,
    R: Rng + ?Sized,
{
    let mut hand = ActionSet::full(deck_size);
    let mut sequence = Vec::with_capacity(deck_size);

    while !hand.is_empty() {
        let r: f64 = rng.gen();
        let mut cumsum = 0.0;
        let mut choice = None;
        let mut last = None;
        for card in hand.cards() {
            cumsum += strategy.probability(hand, card)?;
            last = Some(card);
            if r < cumsum {
                choice = Some(card);
                break;
            }
        }
        // Fallback to last card (handles floating point imprecision)
        let Some(card) = choice.or(last) else { break };
        sequence.push(card);
        hand = hand.without(card);
    }

    Ok(sequence)
}

/// Play `games` games of `strategy` against a uniformly random opponent.
pub fn evaluate_against_uniform<G, S, R>(game: &G, strategy: &S, games: u64, rng: &mut R) -> SolverResult<MatchRecord>
where
    G: PayoffOracle,
    S: StrategySource + ?Sized,
    R: Rng + ?Sized,
{
    let deck_size = game.deck_size();
    let mut opponent: Vec<Card> = ActionSet::full(deck_size).cards().collect();
    let mut record = MatchRecord::default();

    for _ in 0..games {
        let own = sample_sequence(strategy, deck_size, rng)?;
        opponent.shuffle(rng);
        record.record(game.payoff(&own, &opponent)?);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::reach::StrategyTable;
    use crate::games::goofspiel::Goofspiel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sampled_sequence_follows_pure_strategy() {
        let mut table = StrategyTable::uniform(3);
        table.set_distribution(ActionSet::full(3), vec![0.0, 0.0, 1.0]);
        table.set_distribution(ActionSet::from_cards(&[1, 2]), vec![1.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..20 {
            assert_eq!(sample_sequence(&table, 3, &mut rng).unwrap(), vec![3, 1, 2]);
        }
    }

    #[test]
    fn test_uniform_tally_adds_up() {
        let game = Goofspiel::new(4);
        let table = StrategyTable::uniform(4);
        let mut rng = StdRng::seed_from_u64(21);
        let record = evaluate_against_uniform(&game, &table, 500, &mut rng).unwrap();

        assert_eq!(record.games, 500);
        assert_eq!(record.wins + record.losses + record.ties, 500);
        let total = record.win_rate() + record.loss_rate() + record.tie_rate();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_high_card_first_never_loses_two_card_game() {
        // Playing 2 then 1: a tie against [2,1], a win against [1,2].
        let game = Goofspiel::new(2);
        let mut table = StrategyTable::uniform(2);
        table.set_distribution(ActionSet::full(2), vec![0.0, 1.0]);
        let mut rng = StdRng::seed_from_u64(2);
        let record = evaluate_against_uniform(&game, &table, 200, &mut rng).unwrap();

        assert_eq!(record.losses, 0);
        assert!(record.wins > 0);
        assert!(record.ties > 0);
    }

    #[test]
    fn test_empty_record_rates() {
        let record = MatchRecord::default();
        assert_eq!(record.win_rate(), 0.0);
        assert_eq!(record.tie_rate(), 0.0);
    }
}
