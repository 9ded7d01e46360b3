//! Combination matrix model.
//!
//! - `reference`: HSA / Bliss expectations from the monotherapy curves
//! - `well_matrix`: the validated, immutable N×N grid of wells

pub mod reference;
pub mod well_matrix;

pub use reference::*;
pub use well_matrix::*;
