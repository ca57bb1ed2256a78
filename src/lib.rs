//! # Goofspiel CFR
//!
//! Monte Carlo Counterfactual Regret Minimization (MCCFR) for two-player
//! Goofspiel, with two regret estimators sharing one update rule:
//!
//! - **Outcome sampling**: one uniformly sampled terminal trajectory per
//!   information-set update, importance weighted.
//! - **Averaged outcome sampling**: many resampled trajectories that preserve
//!   the payoff of the rounds already played, averaged into one estimate.
//!
//! ## Quick Start
//!
//! ```ignore
//! use goofspiel_cfr::cfr::SolverConfig;
//! use goofspiel_cfr::games::goofspiel;
//!
//! let config = SolverConfig::averaged(5).with_seed(42);
//! let solution = goofspiel::run(&config, 1_000)?;
//! let opening = solution.average_strategy.distribution(goofspiel_cfr::cfr::ActionSet::full(5));
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Core MCCFR engine (store, samplers, estimator, solver)
//! - [`games`]: Game implementations (Goofspiel)
//! - [`error`]: Error types shared by the whole crate
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    CFR Solver (Generic)                         │
//! │  - Terminal sampling      - Regret estimation                   │
//! │  - Regret matching        - Gap-weighted average strategy       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements PayoffOracle trait
//!                               ▼
//!                        ┌─────────────┐
//!                        │  Goofspiel  │
//!                        └─────────────┘
//! ```

#![warn(missing_docs)]

/// CFR (Counterfactual Regret Minimization) solver module.
///
/// This is the core module containing the generic MCCFR algorithm.
pub mod cfr;

/// Error types.
pub mod error;

/// Game implementations module.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{ActionSet, CFRSolver, CFRStats, EstimatorKind, PayoffOracle, SolverConfig};
pub use error::{SolverError, SolverResult};
