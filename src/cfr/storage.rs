//! Storage for CFR regrets and strategies.
//!
//! Every information set (one per subset of the deck) gets a record at
//! construction time. Records are never created or removed afterwards.
//! Each record sits behind its own `RwLock`, so regret estimation can read
//! many records concurrently while a single update mutates one record as a
//! unit.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::action_set::{ActionSet, Card};
use crate::cfr::matching::{normalize_average, regret_match};
use crate::cfr::reach::{StrategySource, StrategyTable};
use crate::error::{SolverError, SolverResult};

/// Number of players. Goofspiel here is strictly heads-up.
pub const NUM_PLAYERS: usize = 2;

/// Per-information-set state.
///
/// All per-action vectors are laid out in ascending card order of
/// `actions`. Regret, cumulative strategy, visit count and last update are
/// shared by both players holding this hand; the current strategy is kept
/// per player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoSetRecord {
    /// Cards still in hand; the identity of this record.
    pub actions: ActionSet,
    /// Cumulative counterfactual regret per action.
    pub regret: Vec<f64>,
    /// Gap-weighted cumulative strategy per action.
    pub cumulative_strategy: Vec<f64>,
    /// Current (regret-matched) strategy of each player.
    pub current_strategy: [Vec<f64>; NUM_PLAYERS],
    /// Iteration at which the record was last updated.
    pub last_update: u64,
    /// Number of updates applied.
    pub visits: u64,
}

impl InfoSetRecord {
    /// Fresh record with zero regret and a uniform strategy for both players.
    pub fn new(actions: ActionSet) -> Self {
        let n = actions.len();
        let uniform = vec![1.0 / n as f64; n];
        Self {
            actions,
            regret: vec![0.0; n],
            cumulative_strategy: vec![0.0; n],
            current_strategy: [uniform.clone(), uniform],
            last_update: 0,
            visits: 0,
        }
    }

    /// Index of `card` in the per-action vectors.
    pub fn position(&self, card: Card) -> SolverResult<usize> {
        self.actions.position(card).ok_or(SolverError::ForeignAction {
            card,
            set: self.actions,
        })
    }

    /// Count a visit and stamp the record with `iteration`.
    ///
    /// Returns the iteration of the previous update.
    pub fn touch(&mut self, iteration: u64) -> u64 {
        self.visits += 1;
        std::mem::replace(&mut self.last_update, iteration)
    }

    /// Fold one iteration's regret estimate into the record for `seat`.
    ///
    /// Adds `deltas` to the regrets, credits the player's current strategy to
    /// the cumulative strategy with weight `iteration - last_update`, then
    /// refreshes that player's strategy by regret matching.
    pub fn apply(&mut self, seat: usize, iteration: u64, deltas: &[f64]) -> SolverResult<()> {
        debug_assert_eq!(deltas.len(), self.regret.len());

        let previous = self.touch(iteration);
        let gap = iteration.saturating_sub(previous) as f64;

        let strategy = &self.current_strategy[seat];
        for (i, &delta) in deltas.iter().enumerate() {
            self.regret[i] += delta;
            self.cumulative_strategy[i] += gap * strategy[i];
        }

        let refreshed = regret_match(&self.regret);
        for (card, &value) in self.actions.cards().zip(refreshed.iter()) {
            if !(0.0..=1.0).contains(&value) {
                return Err(SolverError::NumericDegenerate {
                    set: self.actions,
                    card,
                    value,
                });
            }
        }
        self.current_strategy[seat] = refreshed;
        Ok(())
    }

    /// Average strategy (normalized cumulative strategy).
    pub fn average_strategy(&self) -> Vec<f64> {
        normalize_average(&self.cumulative_strategy)
    }
}

/// Owner of all information-set records, indexed by [`ActionSet::index`].
#[derive(Debug)]
pub struct InformationSetStore {
    deck_size: usize,
    records: Vec<RwLock<InfoSetRecord>>,
}

impl InformationSetStore {
    /// Create one record for every subset of an `n`-card deck.
    pub fn new(deck_size: usize) -> Self {
        let records = (0..1usize << deck_size)
            .map(|index| RwLock::new(InfoSetRecord::new(ActionSet::from_index(index))))
            .collect();
        Self { deck_size, records }
    }

    /// Deck size the store was built for.
    pub fn deck_size(&self) -> usize {
        self.deck_size
    }

    /// The full hand.
    pub fn deck(&self) -> ActionSet {
        ActionSet::full(self.deck_size)
    }

    /// Get the number of information sets stored.
    pub fn num_info_sets(&self) -> usize {
        self.records.len()
    }

    /// Read access to one record.
    pub fn read(&self, set: ActionSet) -> RwLockReadGuard<'_, InfoSetRecord> {
        self.records[set.index()]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to one record.
    pub fn write(&self, set: ActionSet) -> RwLockWriteGuard<'_, InfoSetRecord> {
        self.records[set.index()]
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of one record.
    pub fn get(&self, set: ActionSet) -> InfoSetRecord {
        self.read(set).clone()
    }

    /// Count a visit to `set` at `iteration`, returning the previous update iteration.
    pub fn touch(&self, set: ActionSet, iteration: u64) -> u64 {
        self.write(set).touch(iteration)
    }

    /// Apply a regret estimate to `set` for `seat` as one atomic update.
    pub fn apply(&self, set: ActionSet, seat: usize, iteration: u64, deltas: &[f64]) -> SolverResult<()> {
        self.write(set).apply(seat, iteration, deltas)
    }

    /// Live view of one player's current strategy.
    pub fn view(&self, seat: usize) -> SeatView<'_> {
        SeatView { store: self, seat }
    }

    /// Consistent copy of one player's current strategy.
    pub fn snapshot(&self, seat: usize) -> StrategyTable {
        let distributions = self
            .records
            .iter()
            .map(|r| {
                r.read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .current_strategy[seat]
                    .clone()
            })
            .collect();
        StrategyTable::from_distributions(self.deck_size, distributions)
    }

    /// Normalize every cumulative strategy into the average strategy.
    pub fn average_strategy(&self) -> StrategyTable {
        let distributions = self
            .records
            .iter()
            .map(|r| r.read().unwrap_or_else(PoisonError::into_inner).average_strategy())
            .collect();
        StrategyTable::from_distributions(self.deck_size, distributions)
    }

    /// Information sets in canonical order (by size, then lexicographic).
    pub fn info_sets(&self) -> Vec<ActionSet> {
        ActionSet::all_subsets(self.deck_size)
    }

    /// Export storage to serializable format.
    pub fn export(&self) -> StorageExport {
        let labels: Vec<String> = self.info_sets().iter().map(|s| s.label()).collect();
        let capacity = self.records.len();

        let mut export = StorageExport {
            labels,
            current_strategy: [
                FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
                FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ],
            regrets: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            strategy_sums: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            visits: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        };

        for lock in &self.records {
            let record = lock.read().unwrap_or_else(PoisonError::into_inner);
            let key = record.actions.label();
            for seat in 0..NUM_PLAYERS {
                export.current_strategy[seat].insert(key.clone(), record.current_strategy[seat].clone());
            }
            export.regrets.insert(key.clone(), record.regret.clone());
            export.strategy_sums.insert(key.clone(), record.cumulative_strategy.clone());
            export.visits.insert(key, record.visits);
        }

        export
    }
}

/// Borrowed view of one player's current strategy inside the store.
#[derive(Debug, Clone, Copy)]
pub struct SeatView<'a> {
    store: &'a InformationSetStore,
    seat: usize,
}

impl StrategySource for SeatView<'_> {
    fn probability(&self, set: ActionSet, card: Card) -> SolverResult<f64> {
        let record = self.store.read(set);
        let position = record.position(card)?;
        Ok(record.current_strategy[self.seat][position])
    }
}

/// Serializable export of the solver tables, keyed by action-set label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageExport {
    /// Information-set labels in canonical order.
    pub labels: Vec<String>,
    /// Current strategy of each player.
    pub current_strategy: [FxHashMap<String, Vec<f64>>; NUM_PLAYERS],
    /// Cumulative regrets
    pub regrets: FxHashMap<String, Vec<f64>>,
    /// Cumulative strategy sums
    pub strategy_sums: FxHashMap<String, Vec<f64>>,
    /// Visit counts
    pub visits: FxHashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::reach::reach_probability;
    use approx::assert_relative_eq;

    #[test]
    fn test_records_created_eagerly() {
        let store = InformationSetStore::new(4);
        assert_eq!(store.num_info_sets(), 16);

        let full = store.get(ActionSet::full(4));
        assert_eq!(full.regret, vec![0.0; 4]);
        assert_eq!(full.current_strategy[0], vec![0.25; 4]);
        assert_eq!(full.current_strategy[1], vec![0.25; 4]);
        assert_eq!(full.visits, 0);

        let empty = store.get(ActionSet::empty());
        assert!(empty.regret.is_empty());
    }

    #[test]
    fn test_touch_returns_previous_iteration() {
        let store = InformationSetStore::new(3);
        let set = ActionSet::from_cards(&[1, 3]);
        assert_eq!(store.touch(set, 5), 0);
        assert_eq!(store.touch(set, 12), 5);

        let record = store.get(set);
        assert_eq!(record.last_update, 12);
        assert_eq!(record.visits, 2);
    }

    #[test]
    fn test_visit_gap_weighting() {
        let mut record = InfoSetRecord::new(ActionSet::from_cards(&[1, 2]));
        record.apply(0, 5, &[0.0, 0.0]).unwrap();
        let cumulative_after_first = record.cumulative_strategy.clone();

        // Strategy in force going into iteration 12.
        record.apply(0, 5, &[3.0, 1.0]).unwrap();
        let p = record.current_strategy[0].clone();
        let before = record.cumulative_strategy.clone();

        record.apply(0, 12, &[0.0, 0.0]).unwrap();
        for i in 0..2 {
            assert_relative_eq!(record.cumulative_strategy[i] - before[i], 7.0 * p[i]);
        }
        assert_eq!(cumulative_after_first, vec![2.5, 2.5]);
        assert_eq!(record.last_update, 12);
        assert_eq!(record.visits, 3);
    }

    #[test]
    fn test_apply_refreshes_only_acting_seat() {
        let store = InformationSetStore::new(3);
        let set = ActionSet::full(3);
        store.apply(set, 1, 1, &[4.0, -1.0, 1.0]).unwrap();

        let record = store.get(set);
        assert_eq!(record.current_strategy[0], vec![1.0 / 3.0; 3]);
        assert_relative_eq!(record.current_strategy[1][0], 0.8);
        assert_eq!(record.current_strategy[1][1], 0.0);
        assert_relative_eq!(record.current_strategy[1][2], 0.2);
        assert_relative_eq!(record.current_strategy[1].iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_corrupted_regret_is_numeric_degenerate() {
        let store = InformationSetStore::new(2);
        let err = store
            .apply(ActionSet::full(2), 0, 1, &[f64::INFINITY, 1.0])
            .unwrap_err();
        assert!(matches!(err, SolverError::NumericDegenerate { .. }));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_seat_view_matches_snapshot() {
        let store = InformationSetStore::new(3);
        store.apply(ActionSet::full(3), 0, 1, &[0.0, 2.0, 2.0]).unwrap();

        let live = reach_probability(&store.view(0), store.deck(), &[2, 1]).unwrap();
        let frozen = reach_probability(&store.snapshot(0), store.deck(), &[2, 1]).unwrap();
        assert_relative_eq!(live, 0.5 * 0.5);
        assert_eq!(live, frozen);

        let err = store.view(0).probability(ActionSet::from_cards(&[1, 2]), 3).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_unvisited_average_is_uniform() {
        let store = InformationSetStore::new(3);
        let average = store.average_strategy();
        assert_eq!(average.distribution(ActionSet::full(3)), &[1.0 / 3.0; 3]);
    }

    #[test]
    fn test_export_is_keyed_by_label() {
        let store = InformationSetStore::new(2);
        store.apply(ActionSet::full(2), 0, 3, &[1.0, -1.0]).unwrap();

        let export = store.export();
        assert_eq!(export.labels, vec!["{}", "{1}", "{2}", "{1,2}"]);
        assert_eq!(export.regrets["{1,2}"], vec![1.0, -1.0]);
        assert_eq!(export.visits["{1,2}"], 1);
        assert_eq!(export.current_strategy[0]["{1,2}"], vec![1.0, 0.0]);
        assert_eq!(export.current_strategy[1]["{1,2}"], vec![0.5, 0.5]);
        assert_eq!(export.strategy_sums["{1,2}"], vec![1.5, 1.5]);
    }
}
