//! Domain types used throughout the engine and pipeline.
//!
//! This module defines:
//!
//! - matrix identity and dose ordinals (`MatrixKey`, `DoseLevel`)
//! - wells and null models (`WellRow`, `WellMeasurement`, `NullModel`)
//! - scoring outputs (`SynergyAggregate`, `Scope`)
//! - run configuration (`ScreenConfig`, `SimulateConfig`)

pub mod types;

pub use types::*;
