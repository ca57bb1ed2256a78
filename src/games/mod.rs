//! Game implementations for the CFR solver.
//!
//! ## Available Games
//!
//! - [`goofspiel`]: two-player Goofspiel with an N-card hand per player
//!
//! ## Adding New Games
//!
//! Any game whose information sets are the acting player's remaining cards
//! can be solved by implementing [`PayoffOracle`](crate::cfr::PayoffOracle)
//! for it. See the [`goofspiel`] module for a complete example.

pub mod goofspiel;
