//! `combo-synergy` library crate.
//!
//! The binary (`combo`) is a thin wrapper around this library so that:
//!
//! - the engine (`math`, `models`, `matrix`, `synergy`) is testable without spawning processes
//! - batch scoring, exports, and synthetic screens are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod matrix;
pub mod models;
pub mod report;
pub mod synergy;
