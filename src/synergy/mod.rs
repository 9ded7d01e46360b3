//! Synergy scoring against HSA and Bliss null models.
//!
//! Responsibilities:
//!
//! - summarize per-well excess over a set of wells (`scorer`)
//! - search every k×k window for the most synergistic region (`window`)
//! - bundle both into per-model scores for one matrix (`scores`)

pub mod scorer;
pub mod scores;
pub mod window;

pub use scorer::*;
pub use scores::*;
pub use window::*;
