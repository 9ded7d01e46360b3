//! Reporting utilities: run summaries, excess grids, and curve tables.

pub mod format;

pub use format::*;
