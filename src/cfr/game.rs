//! Payoff oracle trait for the CFR solver.
//!
//! The solver never simulates turns itself. It hands two complete (or
//! prefix) card sequences to an oracle and gets the zero-sum payoff back.
//! Any sequential card-bidding game where each player holds one of each
//! value in `1..=N` can plug in here.

use crate::cfr::action_set::Card;
use crate::error::SolverResult;

/// Deterministic payoff function of a two-player, zero-sum card game.
///
/// # Contract
/// - `payoff` is pure and deterministic.
/// - The result is zero-sum: `result[0] + result[1] == 0`.
/// - Swapping the arguments swaps the result.
/// - Sequences of different lengths are rejected with
///   [`SolverError::MismatchedLengths`](crate::error::SolverError::MismatchedLengths).
///
/// # Example
/// ```ignore
/// #[derive(Clone)]
/// struct MyGame { deck: usize }
///
/// impl PayoffOracle for MyGame {
///     fn deck_size(&self) -> usize { self.deck }
///     fn payoff(&self, first: &[Card], second: &[Card]) -> SolverResult<[f64; 2]> {
///         // ... score the rounds
///     }
/// }
/// ```
pub trait PayoffOracle: Clone + Send + Sync {
    /// Number of cards each player holds.
    fn deck_size(&self) -> usize;

    /// Payoff pair for the two players given the cards they played, round by round.
    fn payoff(&self, first: &[Card], second: &[Card]) -> SolverResult<[f64; 2]>;

    /// Human-readable game name for logs and reports.
    fn name(&self) -> String {
        "game".to_string()
    }
}
