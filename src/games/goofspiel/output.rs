//! Output formatting for solved Goofspiel tables.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::action_set::{ActionSet, Card};
use crate::cfr::config::{CFRStats, SolverConfig};
use crate::cfr::evaluation::MatchRecord;
use crate::cfr::solver::Solution;
use crate::cfr::storage::StorageExport;
use crate::error::SolverResult;

/// Complete output of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoofspielReport {
    /// Run parameters.
    pub metadata: ReportMetadata,
    /// Raw tables keyed by action-set label.
    pub tables: StorageExport,
    /// Normalized average strategy keyed by action-set label.
    pub average_strategy: FxHashMap<String, Vec<f64>>,
    /// Training statistics.
    pub stats: CFRStats,
    /// Result against a uniformly random opponent, if one was played.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub evaluation: Option<MatchRecord>,
}

/// Run parameters recorded alongside the tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Game name, e.g. `goofspiel-5`.
    pub game: String,
    /// Configuration the solver ran with.
    pub config: SolverConfig,
    /// Completed iterations.
    pub iterations: u64,
    /// Seconds since the Unix epoch when the report was built.
    pub timestamp: u64,
}

impl GoofspielReport {
    /// Build a report from a finished run.
    pub fn new(config: &SolverConfig, solution: &Solution) -> Self {
        let average = &solution.average_strategy;
        let average_strategy = ActionSet::all_subsets(config.deck_size)
            .into_iter()
            .map(|set| (set.label(), average.distribution(set).to_vec()))
            .collect();

        // Seconds since the epoch; zero if the clock is before it.
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            metadata: ReportMetadata {
                game: format!("goofspiel-{}", config.deck_size),
                config: config.clone(),
                iterations: solution.stats.iterations,
                timestamp,
            },
            tables: solution.tables.clone(),
            average_strategy,
            stats: solution.stats.clone(),
            evaluation: None,
        }
    }

    /// Attach a head-to-head result.
    pub fn with_evaluation(mut self, record: MatchRecord) -> Self {
        self.evaluation = Some(record);
        self
    }

    /// Write the report as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> SolverResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Read a report written by [`GoofspielReport::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> SolverResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Average strategy at the full hand, as `(card, probability)` pairs.
    pub fn opening_strategy(&self) -> Vec<(Card, f64)> {
        let full = ActionSet::full(self.metadata.config.deck_size);
        let probabilities = self.average_strategy.get(&full.label()).cloned().unwrap_or_default();
        full.cards().zip(probabilities).collect()
    }

    /// Print the run statistics and the average strategy table.
    pub fn print_summary(&self) {
        println!("\n========================================");
        println!(
            "  {} | estimator: {}",
            self.metadata.game, self.metadata.config.estimator
        );
        println!(
            "  Iterations: {} | Info sets: {} | {:.2}s ({:.0} it/s)",
            self.stats.iterations, self.stats.info_sets, self.stats.elapsed_seconds, self.stats.iterations_per_second
        );
        println!(
            "  Trials: {} | Resample fallbacks: {} ({:.2}%)",
            self.stats.trials,
            self.stats.resample_fallbacks,
            self.stats.fallback_rate() * 100.0
        );
        println!("========================================\n");

        if !self.stats.regret_variance.is_empty() {
            println!("{:<6} {:>10} {:>16} {:>16}", "round", "updates", "trial var", "estimate var");
            for (round, spread) in self.stats.regret_variance.iter().enumerate() {
                println!(
                    "{:<6} {:>10} {:>16.4e} {:>16.4e}",
                    round,
                    spread.updates,
                    spread.mean_trial_variance(),
                    spread.estimate_variance()
                );
            }
            println!();
        }

        println!("{:<24} {:>8}  average strategy", "hand", "visits");
        for label in &self.tables.labels {
            let Some(strategy) = self.average_strategy.get(label) else { continue };
            if strategy.is_empty() {
                continue;
            }
            let visits = self.tables.visits.get(label).copied().unwrap_or(0);
            let probabilities: Vec<String> = strategy.iter().map(|p| format!("{:.3}", p)).collect();
            println!("{:<24} {:>8}  [{}]", label, visits, probabilities.join(", "));
        }

        if let Some(record) = &self.evaluation {
            println!("\nVs uniform opponent ({} games):", record.games);
            println!(
                "  Win: {:.1}% | Loss: {:.1}% | Tie: {:.1}%",
                record.win_rate() * 100.0,
                record.loss_rate() * 100.0,
                record.tie_rate() * 100.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::goofspiel::run;

    fn sample_report() -> GoofspielReport {
        let config = SolverConfig::outcome_sampling(3).with_seed(5);
        let solution = run(&config, 20).unwrap();
        GoofspielReport::new(&config, &solution)
    }

    #[test]
    fn test_report_keys_every_info_set() {
        let report = sample_report();
        assert_eq!(report.metadata.game, "goofspiel-3");
        assert_eq!(report.metadata.iterations, 20);
        assert_eq!(report.average_strategy.len(), 8);
        assert!(report.average_strategy["{}"].is_empty());
        assert_eq!(report.tables.labels[0], "{}");
        assert_eq!(report.tables.labels[7], "{1,2,3}");

        let opening = report.opening_strategy();
        assert_eq!(opening.iter().map(|(c, _)| *c).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!((opening.iter().map(|(_, p)| p).sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_json_round_trip() {
        let record = MatchRecord {
            games: 10,
            wins: 6,
            losses: 3,
            ties: 1,
        };
        let report = sample_report().with_evaluation(record);
        let path = std::env::temp_dir().join(format!("goofspiel_report_{}.json", std::process::id()));

        report.save_json(&path).unwrap();
        let loaded = GoofspielReport::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.evaluation, Some(record));
        assert_eq!(loaded.tables.labels, report.tables.labels);
        assert_eq!(loaded.tables.visits, report.tables.visits);
        for (label, strategy) in &report.average_strategy {
            for (a, b) in strategy.iter().zip(&loaded.average_strategy[label]) {
                assert!((a - b).abs() < 1e-12);
            }
        }
        assert_eq!(loaded.metadata.config.deck_size, 3);
        assert_eq!(loaded.stats.regret_variance.len(), 3);
        assert_eq!(loaded.stats.regret_variance[0].updates, 40);
    }

    #[test]
    fn test_evaluation_omitted_when_absent() {
        let json = serde_json::to_string(&sample_report()).unwrap();
        assert!(!json.contains("evaluation"));
        assert!(json.contains("\"{1,2,3}\""));
    }
}
