//! Monte Carlo Counterfactual Regret Minimization (MCCFR) Solver.
//!
//! Each iteration runs one pass per player. A pass draws a realized terminal
//! trajectory uniformly at random and walks the acting player's own cards
//! round by round. At every round the sampler supplies the trajectories to
//! average (one for plain outcome sampling, many resampled ones for averaged
//! outcome sampling), the estimator turns each into a regret vector, and the
//! mean is folded into the information set the player is in.
//!
//! The solver is generic over the payoff oracle and the terminal sampler.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::cfr::action_set::ActionSet;
use crate::cfr::config::{CFRStats, ConfigError, SolverConfig};
use crate::cfr::estimator::{estimate_regrets, RegretAccumulator};
use crate::cfr::game::PayoffOracle;
use crate::cfr::reach::StrategyTable;
use crate::cfr::sampler::{sample_uniform, uniform_sampling_probability, TerminalSampler, Trajectory};
use crate::cfr::storage::{InformationSetStore, StorageExport, NUM_PLAYERS};
use crate::error::SolverResult;

/// Trial seeds are drawn and evaluated in batches of this size.
const TRIAL_BATCH: usize = 4096;

/// Where resampling trials run.
enum TrialExecutor {
    Sequential,
    GlobalPool,
    Dedicated(ThreadPool),
}

/// Regret estimate of a single trial.
struct TrialOutcome {
    regrets: Vec<f64>,
    fell_back: bool,
}

/// The main CFR solver.
///
/// # Type Parameters
/// - `G`: The payoff oracle of the game being solved
/// - `S`: The terminal sampler selecting the regret estimator
///
/// # Example
/// ```ignore
/// use goofspiel_cfr::cfr::{CFRSolver, SolverConfig, UniformSampler};
/// use goofspiel_cfr::games::goofspiel::Goofspiel;
///
/// let config = SolverConfig::outcome_sampling(4).with_seed(42);
/// let mut solver = CFRSolver::new(Goofspiel::new(4), UniformSampler, config)?;
/// solver.train(10_000)?;
/// let average = solver.average_strategy();
/// ```
pub struct CFRSolver<G: PayoffOracle, S: TerminalSampler> {
    /// The game being solved.
    game: G,

    /// Trajectory source for the regret estimator.
    sampler: S,

    /// Configuration for the solver.
    config: SolverConfig,

    /// Per-information-set regrets and strategies.
    storage: InformationSetStore,

    /// Completed iterations. The next iteration runs with this index.
    iteration: u64,

    /// Statistics tracking.
    stats: CFRStats,

    /// Master random number generator.
    rng: StdRng,

    /// Fixed probability of a uniformly sampled trajectory.
    sampling_probability: f64,

    executor: TrialExecutor,
}

impl<G: PayoffOracle, S: TerminalSampler> CFRSolver<G, S> {
    /// Create a new CFR solver for the given game.
    ///
    /// Validates the configuration and allocates every information set.
    pub fn new(game: G, sampler: S, config: SolverConfig) -> SolverResult<Self> {
        config.validate()?;
        if config.deck_size != game.deck_size() {
            return Err(ConfigError::DeckSizeMismatch {
                config: config.deck_size,
                game: game.deck_size(),
            }
            .into());
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let executor = match config.num_threads {
            Some(0) | Some(1) => TrialExecutor::Sequential,
            Some(threads) => TrialExecutor::Dedicated(ThreadPoolBuilder::new().num_threads(threads).build()?),
            None => TrialExecutor::GlobalPool,
        };

        let deck_size = game.deck_size();
        Ok(Self {
            game,
            sampler,
            config,
            storage: InformationSetStore::new(deck_size),
            iteration: 0,
            stats: CFRStats::new(),
            rng,
            sampling_probability: uniform_sampling_probability(deck_size),
            executor,
        })
    }

    /// Run a single iteration: one pass for each player.
    pub fn run_iteration(&mut self) -> SolverResult<()> {
        let iteration = self.iteration;
        for seat in 0..NUM_PLAYERS {
            let realized = sample_uniform(&self.game, &mut self.rng)?;
            self.update_player(&realized, seat, iteration)?;
        }
        self.iteration += 1;
        Ok(())
    }

    /// Train the solver for a specified number of iterations.
    ///
    /// # Returns
    /// Statistics from the training run.
    pub fn train(&mut self, iterations: u64) -> SolverResult<&CFRStats> {
        self.train_with_callback(iterations, iterations.max(1), |_| {})
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` iterations
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> SolverResult<&CFRStats>
    where
        F: FnMut(&CFRStats),
    {
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        let callback_interval = callback_interval.max(1);

        log::info!(
            "training {} with {} estimator for {} iterations ({} info sets)",
            self.game.name(),
            self.sampler.kind(),
            iterations,
            self.storage.num_info_sets()
        );

        for i in 0..iterations {
            self.run_iteration()?;

            if (i + 1) % callback_interval == 0 {
                self.refresh_stats(elapsed_before + start_time.elapsed().as_secs_f64());
                log::debug!(
                    "iteration {} ({:.0} it/s, {} fallbacks)",
                    self.stats.iterations,
                    self.stats.iterations_per_second,
                    self.stats.resample_fallbacks
                );
                callback(&self.stats);
            }
        }

        // Final stats update
        self.refresh_stats(elapsed_before + start_time.elapsed().as_secs_f64());
        log::info!(
            "finished {} iterations in {:.2}s ({} trials, {} resample fallbacks)",
            self.stats.iterations,
            self.stats.elapsed_seconds,
            self.stats.trials,
            self.stats.resample_fallbacks
        );

        Ok(&self.stats)
    }

    fn refresh_stats(&mut self, elapsed_seconds: f64) {
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.storage.num_info_sets();
        self.stats.elapsed_seconds = elapsed_seconds;
        self.stats.update_rate();
    }

    /// Walk `seat`'s realized cards and update every information set it passes.
    fn update_player(&mut self, realized: &Trajectory, seat: usize, iteration: u64) -> SolverResult<()> {
        let deck_size = self.game.deck_size();
        let mut hand = self.storage.deck();

        for prefix in 0..deck_size {
            let trials = self.sampler.trials(deck_size, prefix);
            log::trace!("seat {} round {} hand {}: {} trials", seat, prefix, hand, trials);

            let mut accumulator = RegretAccumulator::new(hand.len());
            let mut remaining = trials;
            while remaining > 0 {
                let batch = remaining.min(TRIAL_BATCH as u64);
                let seeds: Vec<u64> = (0..batch).map(|_| self.rng.gen()).collect();
                for outcome in self.evaluate_trials(realized, seat, prefix, &seeds)? {
                    accumulator.add(&outcome.regrets);
                    if outcome.fell_back {
                        self.stats.resample_fallbacks += 1;
                    }
                }
                remaining -= batch;
            }
            self.stats.trials += accumulator.count();

            let mean = accumulator.mean();
            self.stats.record_variance(prefix, &mean, accumulator.mean_variance());
            self.storage.apply(hand, seat, iteration, &mean)?;
            hand = hand.without(realized.plays[seat][prefix]);
        }

        Ok(())
    }

    /// Evaluate one batch of trials. Only reads the store.
    fn evaluate_trials(
        &self,
        realized: &Trajectory,
        seat: usize,
        prefix: usize,
        seeds: &[u64],
    ) -> SolverResult<Vec<TrialOutcome>> {
        let run = |seed: &u64| self.run_trial(realized, seat, prefix, *seed);

        if seeds.len() == 1 {
            return seeds.iter().map(run).collect();
        }
        match &self.executor {
            TrialExecutor::Sequential => seeds.iter().map(run).collect(),
            TrialExecutor::GlobalPool => seeds.par_iter().map(run).collect(),
            TrialExecutor::Dedicated(pool) => pool.install(|| seeds.par_iter().map(run).collect()),
        }
    }

    fn run_trial(&self, realized: &Trajectory, seat: usize, prefix: usize, seed: u64) -> SolverResult<TrialOutcome> {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample = self.sampler.sample(&self.game, realized, seat, prefix, &mut rng)?;
        if sample.fell_back {
            log::debug!("resample budget exhausted at seat {} round {}, using realized prefix", seat, prefix);
        }

        let regrets = estimate_regrets(
            &self.storage.view(seat),
            &self.storage.view(1 - seat),
            self.storage.deck(),
            &sample.trajectory,
            seat,
            prefix,
            self.sampling_probability,
        )?;

        Ok(TrialOutcome {
            regrets,
            fell_back: sample.fell_back,
        })
    }

    /// Consistent copy of one player's current strategy.
    pub fn current_strategy(&self, seat: usize) -> StrategyTable {
        self.storage.snapshot(seat)
    }

    /// Normalized average strategy; converges to equilibrium.
    pub fn average_strategy(&self) -> StrategyTable {
        self.storage.average_strategy()
    }

    /// Average strategy at a single information set.
    pub fn get_average_strategy(&self, set: ActionSet) -> Vec<f64> {
        self.storage.read(set).average_strategy()
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Get the number of information sets.
    pub fn num_info_sets(&self) -> usize {
        self.storage.num_info_sets()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CFRStats {
        &self.stats
    }

    /// Get reference to the storage for analysis.
    pub fn storage(&self) -> &InformationSetStore {
        &self.storage
    }

    /// Get reference to the game.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Get reference to the sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Labels of every information set in canonical order.
    pub fn info_set_labels(&self) -> Vec<String> {
        self.storage.info_sets().iter().map(|s| s.label()).collect()
    }

    /// Everything a report needs once training is done.
    pub fn solution(&self) -> Solution {
        Solution {
            tables: self.storage.export(),
            average_strategy: self.storage.average_strategy(),
            stats: self.stats.clone(),
        }
    }
}

/// Final tables of a training run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Labels, current strategies, regrets, cumulative strategies and visits.
    pub tables: StorageExport,
    /// Normalized average strategy.
    pub average_strategy: StrategyTable,
    /// Training statistics.
    pub stats: CFRStats,
}
