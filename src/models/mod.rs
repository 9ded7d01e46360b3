//! Dose-response curve model.
//!
//! Curves are small immutable values; evaluation is pure so matrix scoring and
//! reporting can share them freely.

pub mod curve;

pub use curve::*;
