//! Input/output helpers.
//!
//! - CSV ingest + validation of wells and curve fits (`ingest`)
//! - score exports (CSV/JSON) and synthetic screen files (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
