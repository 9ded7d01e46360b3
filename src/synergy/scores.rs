//! Per-matrix score bundle: whole-matrix and window aggregates for each null model.

use serde::{Deserialize, Serialize};

use crate::domain::{NullModel, SynergyAggregate};
use crate::error::EngineError;
use crate::matrix::WellMatrix;
use crate::synergy::scorer::score_matrix;
use crate::synergy::window::search_windows;

/// Everything computed for one null model on one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScores {
    pub null_model: NullModel,
    pub whole_matrix: SynergyAggregate,
    pub best_window: SynergyAggregate,
    pub best_synergistic_window: Option<SynergyAggregate>,
}

pub fn score_model(
    matrix: &WellMatrix,
    model: NullModel,
    window_size: usize,
) -> Result<ModelScores, EngineError> {
    let whole_matrix = score_matrix(matrix, model)?;
    let search = search_windows(matrix, model, window_size)?;
    Ok(ModelScores {
        null_model: model,
        whole_matrix,
        best_window: search.best,
        best_synergistic_window: search.best_synergistic,
    })
}

/// Score `matrix` under every null model, in [`NullModel::ALL`] order.
pub fn score_all_models(
    matrix: &WellMatrix,
    window_size: usize,
) -> Result<Vec<ModelScores>, EngineError> {
    NullModel::ALL
        .iter()
        .map(|&model| score_model(matrix, model, window_size))
        .collect()
}
