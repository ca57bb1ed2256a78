//! Error types shared by the solver engine and the Goofspiel oracle.

use thiserror::Error;

use crate::cfr::action_set::{ActionSet, Card};
use crate::cfr::config::ConfigError;

/// Errors raised while building or running a solver.
///
/// `MismatchedLengths` and `ForeignAction` are caller defects (invalid input),
/// `NumericDegenerate` means the regret table has been corrupted. None of them
/// are transient, so the training loop stops at the first one.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The payoff oracle was handed sequences of different lengths.
    #[error("action sequences have mismatched lengths: {first} vs {second}")]
    MismatchedLengths {
        /// Length of the first player's sequence.
        first: usize,
        /// Length of the second player's sequence.
        second: usize,
    },

    /// A card was looked up in an information set that does not hold it.
    #[error("card {card} is not playable from information set {set}")]
    ForeignAction {
        /// The offending card.
        card: Card,
        /// The information set it was queried against.
        set: ActionSet,
    },

    /// Regret matching produced a probability outside [0, 1].
    #[error("strategy probability {value} for card {card} at {set} is outside [0, 1]")]
    NumericDegenerate {
        /// Information set whose strategy was refreshed.
        set: ActionSet,
        /// Card with the invalid probability.
        card: Card,
        /// The invalid probability.
        value: f64,
    },

    /// The solver configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading a config file or writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The dedicated trial thread pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SolverError {
    /// True for precondition violations caused by the caller.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SolverError::MismatchedLengths { .. } | SolverError::ForeignAction { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        let mismatch = SolverError::MismatchedLengths { first: 3, second: 2 };
        assert!(mismatch.is_invalid_input());

        let foreign = SolverError::ForeignAction {
            card: 4,
            set: ActionSet::from_cards(&[1, 2]),
        };
        assert!(foreign.is_invalid_input());
        assert_eq!(foreign.to_string(), "card 4 is not playable from information set {1,2}");

        let degenerate = SolverError::NumericDegenerate {
            set: ActionSet::full(2),
            card: 1,
            value: 1.5,
        };
        assert!(!degenerate.is_invalid_input());
    }
}
