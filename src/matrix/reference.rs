//! Null-model references derived from the two monotherapy curves.
//!
//! For a well at marginal concentrations `(conc_a, conc_b)`:
//!
//! - `E1 = inhibition_A(conc_a)`, `E2 = inhibition_B(conc_b)`
//! - HSA expects `max(E1, E2)`
//! - Bliss expects `E1 + E2 - E1·E2`

use crate::domain::{NullModel, WellMeasurement, WellRow};
use crate::error::EngineError;
use crate::models::DoseResponseCurve;

/// The monotherapy curves of a drug pair, one per matrix axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonotherapyPair {
    pub a: DoseResponseCurve,
    pub b: DoseResponseCurve,
}

impl MonotherapyPair {
    pub fn new(a: DoseResponseCurve, b: DoseResponseCurve) -> Self {
        Self { a, b }
    }

    /// Monotherapy inhibitions `(E1, E2)` at the well's marginal concentrations.
    ///
    /// A concentration of exactly zero means the drug is absent.
    pub fn inhibitions(&self, conc_a: f64, conc_b: f64) -> Result<(f64, f64), EngineError> {
        Ok((
            marginal_inhibition(&self.a, conc_a)?,
            marginal_inhibition(&self.b, conc_b)?,
        ))
    }

    pub fn expected_inhibition(
        &self,
        model: NullModel,
        conc_a: f64,
        conc_b: f64,
    ) -> Result<f64, EngineError> {
        let (e1, e2) = self.inhibitions(conc_a, conc_b)?;
        Ok(model.expected_inhibition(e1, e2))
    }

    /// Attach HSA and Bliss references to a row.
    ///
    /// References already present on the row take precedence.
    pub fn measure(&self, row: &WellRow) -> Result<WellMeasurement, EngineError> {
        if let Some(w) = row.precomputed() {
            return Ok(w);
        }
        let (e1, e2) = self.inhibitions(row.conc_a, row.conc_b)?;
        Ok(row.measure(
            NullModel::Hsa.expected_inhibition(e1, e2),
            NullModel::Bliss.expected_inhibition(e1, e2),
        ))
    }
}

fn marginal_inhibition(curve: &DoseResponseCurve, conc: f64) -> Result<f64, EngineError> {
    if conc == 0.0 {
        return Ok(0.0);
    }
    curve.inhibition_at_conc(conc)
}
