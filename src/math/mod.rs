//! Mathematical utilities: the concentration transform and quadrature.

pub mod quadrature;
pub mod transform;

pub use quadrature::*;
pub use transform::*;
