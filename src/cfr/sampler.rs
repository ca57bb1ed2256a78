//! Terminal trajectory sampling.
//!
//! Both estimators start every (iteration, player) pass from one realized
//! trajectory drawn uniformly at random. They differ in which trajectories
//! feed the regret estimate at each prefix:
//!
//! - [`UniformSampler`] reuses the realized trajectory (plain outcome sampling).
//! - [`ResamplingSampler`] redraws the hidden part of the prefix many times,
//!   keeping only histories that score exactly like the realized prefix, and
//!   completes each one with a random suffix (averaged outcome sampling).

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::cfr::action_set::{ActionSet, Card};
use crate::cfr::config::{ConfigError, EstimatorKind, SolverConfig};
use crate::cfr::game::PayoffOracle;
use crate::cfr::storage::NUM_PLAYERS;
use crate::error::SolverResult;

/// One full play of the game: each player's cards in round order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// `plays[seat][round]` is the card `seat` played in `round`.
    pub plays: [Vec<Card>; NUM_PLAYERS],
    /// Oracle payoff of the two sequences.
    pub payoff: [f64; NUM_PLAYERS],
}

impl Trajectory {
    /// Score two sequences with the oracle.
    pub fn new<G: PayoffOracle>(game: &G, first: Vec<Card>, second: Vec<Card>) -> SolverResult<Self> {
        let payoff = game.payoff(&first, &second)?;
        Ok(Self {
            plays: [first, second],
            payoff,
        })
    }

    /// Number of rounds.
    pub fn len(&self) -> usize {
        self.plays[0].len()
    }

    /// True for a zero-round trajectory.
    pub fn is_empty(&self) -> bool {
        self.plays[0].is_empty()
    }

    /// First `rounds` cards played by `seat`.
    pub fn prefix(&self, seat: usize, rounds: usize) -> &[Card] {
        &self.plays[seat][..rounds]
    }

    /// Oracle payoff of the first `rounds` rounds alone.
    pub fn prefix_payoff<G: PayoffOracle>(&self, game: &G, rounds: usize) -> SolverResult<[f64; 2]> {
        game.payoff(self.prefix(0, rounds), self.prefix(1, rounds))
    }
}

/// Draw both players' permutations of the deck independently and uniformly.
pub fn sample_uniform<G, R>(game: &G, rng: &mut R) -> SolverResult<Trajectory>
where
    G: PayoffOracle,
    R: Rng + ?Sized,
{
    let deck: Vec<Card> = ActionSet::full(game.deck_size()).cards().collect();
    let mut first = deck.clone();
    let mut second = deck;
    first.shuffle(rng);
    second.shuffle(rng);
    Trajectory::new(game, first, second)
}

/// Probability of any single trajectory under uniform sampling, `1/(N!)²`.
pub fn uniform_sampling_probability(deck_size: usize) -> f64 {
    let permutations = factorial(deck_size) as f64;
    1.0 / (permutations * permutations)
}

/// `n!`, saturating at `u64::MAX`.
pub fn factorial(n: usize) -> u64 {
    (1..=n as u64).fold(1u64, |acc, k| acc.saturating_mul(k))
}

/// Binomial coefficient `C(n, k)`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    // Each partial product is itself a binomial coefficient, so the division is exact.
    (0..k).fold(1u64, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}

/// Size of the hidden-history space at prefix `j`: `C(N,j)·(j!)²`.
///
/// Used as the attempt budget of one resample, and, divided by the
/// reduction factor, as the number of averaged trials.
pub fn resample_budget(deck_size: usize, prefix: usize) -> u64 {
    let orders = factorial(prefix);
    binomial(deck_size, prefix)
        .saturating_mul(orders)
        .saturating_mul(orders)
}

/// A trajectory handed to the regret estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The trajectory to evaluate.
    pub trajectory: Trajectory,
    /// True when resampling ran out of attempts and kept the realized prefix.
    pub fell_back: bool,
}

/// Source of the trajectories averaged at one information set.
pub trait TerminalSampler: Clone + Send + Sync {
    /// Estimator this sampler implements.
    fn kind(&self) -> EstimatorKind;

    /// Number of trajectories averaged when the acting player is at round `prefix`.
    fn trials(&self, deck_size: usize, prefix: usize) -> u64;

    /// Draw one trajectory for `seat` at round `prefix`, derived from `realized`.
    fn sample<G, R>(
        &self,
        game: &G,
        realized: &Trajectory,
        seat: usize,
        prefix: usize,
        rng: &mut R,
    ) -> SolverResult<Sample>
    where
        G: PayoffOracle,
        R: Rng + ?Sized;
}

/// Plain outcome sampling: the realized trajectory is the only sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSampler;

impl TerminalSampler for UniformSampler {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::OutcomeSampling
    }

    fn trials(&self, _deck_size: usize, _prefix: usize) -> u64 {
        1
    }

    fn sample<G, R>(
        &self,
        _game: &G,
        realized: &Trajectory,
        _seat: usize,
        _prefix: usize,
        _rng: &mut R,
    ) -> SolverResult<Sample>
    where
        G: PayoffOracle,
        R: Rng + ?Sized,
    {
        Ok(Sample {
            trajectory: realized.clone(),
            fell_back: false,
        })
    }
}

/// Averaged outcome sampling through outcome-preserving resampling.
#[derive(Debug, Clone, Copy)]
pub struct ResamplingSampler {
    /// Divisor applied to the trial count.
    pub reduction_factor: u64,
    /// Optional hard cap on the trial count.
    pub max_trials: Option<u64>,
}

impl Default for ResamplingSampler {
    fn default() -> Self {
        Self {
            reduction_factor: 4,
            max_trials: None,
        }
    }
}

impl ResamplingSampler {
    /// Sampler with the given reduction factor and optional cap.
    ///
    /// A reduction factor of 0 is clamped to 1 (no reduction). Use
    /// [`ResamplingSampler::from_config`] to reject it instead.
    pub fn new(reduction_factor: u64, max_trials: Option<u64>) -> Self {
        Self {
            reduction_factor: reduction_factor.max(1),
            max_trials,
        }
    }

    /// Sampler for a validated configuration.
    pub fn from_config(config: &SolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.reduction_factor, config.max_trials))
    }

    /// Redraw the first `prefix` rounds while keeping their payoff.
    ///
    /// Each attempt shuffles `seat`'s own realized prefix and deals the
    /// opponent `prefix` distinct cards from the whole deck in random order.
    /// The first attempt whose prefix payoff equals the realized one is
    /// returned. `None` means the attempt budget ran out.
    pub fn resample_prefix<G, R>(
        &self,
        game: &G,
        realized: &Trajectory,
        seat: usize,
        prefix: usize,
        rng: &mut R,
    ) -> SolverResult<Option<[Vec<Card>; NUM_PLAYERS]>>
    where
        G: PayoffOracle,
        R: Rng + ?Sized,
    {
        let deck_size = game.deck_size();
        let target = realized.prefix_payoff(game, prefix)?;
        let attempts = resample_budget(deck_size, prefix).saturating_add(1);
        let mut own = realized.prefix(seat, prefix).to_vec();

        for _ in 0..attempts {
            own.shuffle(rng);
            let opponent: Vec<Card> = index::sample(rng, deck_size, prefix)
                .into_iter()
                .map(|i| (i + 1) as Card)
                .collect();

            let plays = if seat == 0 {
                [own.clone(), opponent]
            } else {
                [opponent, own.clone()]
            };
            if game.payoff(&plays[0], &plays[1])? == target {
                return Ok(Some(plays));
            }
        }

        Ok(None)
    }
}

/// Extend both prefixes with each player's unused cards in random order.
pub fn complete_suffix<G, R>(game: &G, mut plays: [Vec<Card>; NUM_PLAYERS], rng: &mut R) -> SolverResult<Trajectory>
where
    G: PayoffOracle,
    R: Rng + ?Sized,
{
    let deck = ActionSet::full(game.deck_size());
    for cards in plays.iter_mut() {
        let used = ActionSet::from_cards(cards);
        let mut rest: Vec<Card> = deck.cards().filter(|&c| !used.contains(c)).collect();
        rest.shuffle(rng);
        cards.extend(rest);
    }
    let [first, second] = plays;
    Trajectory::new(game, first, second)
}

impl TerminalSampler for ResamplingSampler {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::AveragedOutcome
    }

    fn trials(&self, deck_size: usize, prefix: usize) -> u64 {
        if prefix == 0 {
            return 1;
        }
        // The budget saturates at u64::MAX on large decks.
        let reduced = (resample_budget(deck_size, prefix) / self.reduction_factor).saturating_add(1);
        match self.max_trials {
            Some(cap) => reduced.min(cap),
            None => reduced,
        }
    }

    fn sample<G, R>(
        &self,
        game: &G,
        realized: &Trajectory,
        seat: usize,
        prefix: usize,
        rng: &mut R,
    ) -> SolverResult<Sample>
    where
        G: PayoffOracle,
        R: Rng + ?Sized,
    {
        if prefix == 0 {
            return Ok(Sample {
                trajectory: realized.clone(),
                fell_back: false,
            });
        }

        let (plays, fell_back) = match self.resample_prefix(game, realized, seat, prefix, rng)? {
            Some(plays) => (plays, false),
            None => (
                [
                    realized.prefix(0, prefix).to_vec(),
                    realized.prefix(1, prefix).to_vec(),
                ],
                true,
            ),
        };

        Ok(Sample {
            trajectory: complete_suffix(game, plays, rng)?,
            fell_back,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::goofspiel::Goofspiel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn is_permutation(cards: &[Card], n: usize) -> bool {
        let mut sorted = cards.to_vec();
        sorted.sort_unstable();
        sorted == (1..=n as Card).collect::<Vec<_>>()
    }

    #[test]
    fn test_counting_helpers() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 0), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(resample_budget(3, 2), 12);
        assert_eq!(resample_budget(5, 4), 5 * 24 * 24);
        assert_eq!(resample_budget(16, 16), u64::MAX);
        assert_eq!(uniform_sampling_probability(3), 1.0 / 36.0);
    }

    #[test]
    fn test_uniform_draw_is_pair_of_permutations() {
        let game = Goofspiel::new(6);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let t = sample_uniform(&game, &mut rng).unwrap();
            assert!(is_permutation(&t.plays[0], 6));
            assert!(is_permutation(&t.plays[1], 6));
            assert_eq!(t.payoff, game.payoff(&t.plays[0], &t.plays[1]).unwrap());
        }
    }

    #[test]
    fn test_trial_counts() {
        let sampler = ResamplingSampler::default();
        assert_eq!(sampler.trials(5, 0), 1);
        assert_eq!(sampler.trials(5, 1), 5 / 4 + 1);
        assert_eq!(sampler.trials(5, 2), 40 / 4 + 1);
        assert_eq!(ResamplingSampler::new(4, Some(3)).trials(5, 2), 3);
        assert_eq!(UniformSampler.trials(5, 3), 1);
    }

    #[test]
    fn test_trial_counts_saturate_on_large_decks() {
        let config = SolverConfig::averaged(14).with_reduction_factor(1).with_max_trials(10);
        let capped = ResamplingSampler::from_config(&config).unwrap();
        assert_eq!(resample_budget(14, 13), u64::MAX);
        assert_eq!(capped.trials(14, 13), 10);
        assert_eq!(capped.trials(14, 0), 1);

        let uncapped = ResamplingSampler::new(1, None);
        assert_eq!(uncapped.trials(16, 16), u64::MAX);
        assert_eq!(ResamplingSampler::new(2, None).trials(16, 16), u64::MAX / 2 + 1);
    }

    #[test]
    fn test_zero_reduction_factor() {
        assert_eq!(ResamplingSampler::new(0, None).reduction_factor, 1);
        let config = SolverConfig::averaged(4).with_reduction_factor(0);
        assert_eq!(
            ResamplingSampler::from_config(&config).unwrap_err(),
            ConfigError::InvalidReductionFactor
        );
    }

    #[test]
    fn test_resample_preserves_prefix_payoff() {
        let game = Goofspiel::new(5);
        let sampler = ResamplingSampler::default();
        let mut rng = StdRng::seed_from_u64(99);

        for trial in 0..200 {
            let realized = sample_uniform(&game, &mut rng).unwrap();
            let seat = trial % 2;
            let prefix = 1 + trial % 4;
            let target = realized.prefix_payoff(&game, prefix).unwrap();

            if let Some(plays) = sampler
                .resample_prefix(&game, &realized, seat, prefix, &mut rng)
                .unwrap()
            {
                assert_eq!(game.payoff(&plays[0], &plays[1]).unwrap(), target);
                assert_eq!(
                    ActionSet::from_cards(&plays[seat]),
                    ActionSet::from_cards(realized.prefix(seat, prefix))
                );
                assert_eq!(ActionSet::from_cards(&plays[1 - seat]).len(), prefix);
            }
        }
    }

    #[test]
    fn test_resampled_trajectory_is_complete() {
        let game = Goofspiel::new(4);
        let sampler = ResamplingSampler::default();
        let mut rng = StdRng::seed_from_u64(5);
        let realized = sample_uniform(&game, &mut rng).unwrap();

        for prefix in 0..4 {
            let sample = sampler.sample(&game, &realized, 1, prefix, &mut rng).unwrap();
            let t = &sample.trajectory;
            assert!(is_permutation(&t.plays[0], 4));
            assert!(is_permutation(&t.plays[1], 4));
            // The acting player's hand at `prefix` is unchanged.
            assert_eq!(
                ActionSet::from_cards(t.prefix(1, prefix)),
                ActionSet::from_cards(realized.prefix(1, prefix))
            );
            if prefix == 0 {
                assert_eq!(t, &realized);
            }
        }
    }

    #[test]
    fn test_uniform_sampler_returns_realized() {
        let game = Goofspiel::new(4);
        let mut rng = StdRng::seed_from_u64(8);
        let realized = sample_uniform(&game, &mut rng).unwrap();
        let sample = UniformSampler.sample(&game, &realized, 0, 2, &mut rng).unwrap();
        assert_eq!(sample.trajectory, realized);
        assert!(!sample.fell_back);
    }

    /// Oracle that scores the first call differently from every later call,
    /// so no resampled prefix can ever match.
    #[derive(Clone)]
    struct DriftingOracle {
        calls: Arc<AtomicUsize>,
    }

    impl PayoffOracle for DriftingOracle {
        fn deck_size(&self) -> usize {
            3
        }

        fn payoff(&self, _first: &[Card], _second: &[Card]) -> SolverResult<[f64; 2]> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok([1.0, -1.0])
            } else {
                Ok([0.0, 0.0])
            }
        }
    }

    #[test]
    fn test_exhaustion_falls_back_to_realized_prefix() {
        let game = DriftingOracle {
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let realized = Trajectory {
            plays: [vec![3, 1, 2], vec![2, 3, 1]],
            payoff: [1.0, -1.0],
        };
        let mut rng = StdRng::seed_from_u64(3);
        let sample = ResamplingSampler::default()
            .sample(&game, &realized, 0, 2, &mut rng)
            .unwrap();

        assert!(sample.fell_back);
        assert_eq!(sample.trajectory.prefix(0, 2), &[3, 1]);
        assert_eq!(sample.trajectory.prefix(1, 2), &[2, 3]);
        // Budget C(3,2)·(2!)² = 12, plus the target and final scoring calls.
        assert_eq!(game.calls.load(Ordering::SeqCst), 1 + 13 + 1);
    }
}
