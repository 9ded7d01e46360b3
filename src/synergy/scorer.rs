//! Excess-over-null aggregation.
//!
//! Whole-matrix and window scoring both go through [`ExcessSummary::from_excess`],
//! so the two scopes can never disagree on how a set of wells is summarized.

use serde::{Deserialize, Serialize};

use crate::domain::{NullModel, Scope, SynergyAggregate, WellMeasurement};
use crate::error::EngineError;
use crate::matrix::WellMatrix;

/// Aggregates over one set of per-well excess values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExcessSummary {
    pub well_count: usize,
    pub mean_excess: f64,
    /// `None` when no well has positive excess.
    pub mean_excess_synergistic_only: Option<f64>,
    pub synergistic_well_count: usize,
}

impl ExcessSummary {
    /// Summarize excess values. A well is synergistic when its excess is `> 0`.
    pub fn from_excess<I>(values: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut n = 0usize;
        let mut sum = 0.0;
        let mut n_pos = 0usize;
        let mut sum_pos = 0.0;
        for v in values {
            n += 1;
            sum += v;
            if v > 0.0 {
                n_pos += 1;
                sum_pos += v;
            }
        }
        if n == 0 {
            return Err(EngineError::EmptyWellSet);
        }

        Ok(ExcessSummary {
            well_count: n,
            mean_excess: sum / n as f64,
            mean_excess_synergistic_only: (n_pos > 0).then(|| sum_pos / n_pos as f64),
            synergistic_well_count: n_pos,
        })
    }

    pub fn into_aggregate(self, null_model: NullModel, scope: Scope) -> SynergyAggregate {
        SynergyAggregate {
            null_model,
            scope,
            mean_excess: self.mean_excess,
            mean_excess_synergistic_only: self.mean_excess_synergistic_only,
            synergistic_well_count: self.synergistic_well_count,
        }
    }
}

/// Summarize any set of wells under `model`.
pub fn score_wells<'a, I>(wells: I, model: NullModel) -> Result<ExcessSummary, EngineError>
where
    I: IntoIterator<Item = &'a WellMeasurement>,
{
    ExcessSummary::from_excess(wells.into_iter().map(|w| w.excess(model)))
}

/// Wells with strictly positive excess under `model`, in input order.
pub fn synergistic_wells<'a, I>(wells: I, model: NullModel) -> Vec<&'a WellMeasurement>
where
    I: IntoIterator<Item = &'a WellMeasurement>,
{
    wells.into_iter().filter(|w| w.excess(model) > 0.0).collect()
}

/// Whole-matrix aggregate under `model`.
///
/// Values are summed in the same (column-major) order the window search uses,
/// so a full-size window reproduces this aggregate exactly.
pub fn score_matrix(matrix: &WellMatrix, model: NullModel) -> Result<SynergyAggregate, EngineError> {
    let grid = matrix.excess_grid(model);
    Ok(ExcessSummary::from_excess(grid.iter().copied())?.into_aggregate(model, Scope::WholeMatrix))
}
