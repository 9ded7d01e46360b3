//! Sub-window search for the most synergistic region of a matrix.
//!
//! Every `k×k` window is scored independently (parallel), then reduced
//! deterministically:
//!
//! - best window: maximum `mean_excess`
//! - best synergy-only window: maximum `mean_excess_synergistic_only` among
//!   windows with at least one synergistic well
//!
//! Ties go to the lexicographically smallest anchor `(a, b)`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{DoseLevel, NullModel, Scope, SynergyAggregate};
use crate::error::EngineError;
use crate::matrix::WellMatrix;
use crate::synergy::scorer::ExcessSummary;

/// Result of one window search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSearch {
    pub best: SynergyAggregate,
    /// `None` when no window contains a synergistic well.
    pub best_synergistic: Option<SynergyAggregate>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    idx: usize,
    row: usize,
    col: usize,
    summary: ExcessSummary,
}

/// Zero-based top-left positions of every `size×size` window, in lexicographic order.
pub fn window_anchors(dimension: usize, size: usize) -> Result<Vec<(usize, usize)>, EngineError> {
    if size == 0 || size > dimension {
        return Err(EngineError::InvalidWindow { size, dimension });
    }
    let span = dimension - size + 1;
    Ok((0..span)
        .flat_map(|i| (0..span).map(move |j| (i, j)))
        .collect())
}

/// Search all `size×size` windows of `matrix` under `model`.
pub fn search_windows(
    matrix: &WellMatrix,
    model: NullModel,
    size: usize,
) -> Result<WindowSearch, EngineError> {
    let anchors = window_anchors(matrix.dimension(), size)?;
    let grid = matrix.excess_grid(model);

    let candidates: Vec<Candidate> = anchors
        .par_iter()
        .enumerate()
        .map(|(idx, &(row, col))| {
            let window = grid.view((row, col), (size, size));
            ExcessSummary::from_excess(window.iter().copied()).map(|summary| Candidate {
                idx,
                row,
                col,
                summary,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let to_aggregate = |c: &Candidate| {
        c.summary.into_aggregate(
            model,
            Scope::Window {
                size,
                anchor_a: DoseLevel::from_index(c.row),
                anchor_b: DoseLevel::from_index(c.col),
            },
        )
    };

    let Some(best) = select_max(&candidates, |c| Some(c.summary.mean_excess)) else {
        return Err(EngineError::InvalidWindow {
            size,
            dimension: matrix.dimension(),
        });
    };
    let best_synergistic = select_max(&candidates, |c| c.summary.mean_excess_synergistic_only);

    Ok(WindowSearch {
        best: to_aggregate(best),
        best_synergistic: best_synergistic.map(to_aggregate),
    })
}

// Deterministic selection: pick the maximum key; break ties by anchor order.
fn select_max<F>(candidates: &[Candidate], key: F) -> Option<&Candidate>
where
    F: Fn(&Candidate) -> Option<f64>,
{
    let mut best: Option<(&Candidate, f64)> = None;
    for c in candidates {
        let Some(v) = key(c) else { continue };
        best = match best {
            Some((b, bv)) if !(v > bv || (v == bv && c.idx < b.idx)) => Some((b, bv)),
            _ => Some((c, v)),
        };
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WellMeasurement;

    /// Matrix whose per-well excess (under both models) is `excess[a-1][b-1]`.
    fn matrix_from_excess(excess: &[&[f64]]) -> WellMatrix {
        let mut wells = Vec::new();
        for (i, row) in excess.iter().enumerate() {
            for (j, &e) in row.iter().enumerate() {
                wells.push(WellMeasurement {
                    dose_a: DoseLevel::from_index(i),
                    dose_b: DoseLevel::from_index(j),
                    conc_a: 1.0,
                    conc_b: 1.0,
                    viability: 1.0 - e,
                    hsa: 0.0,
                    bliss: 0.0,
                });
            }
        }
        WellMatrix::new(wells).unwrap()
    }

    #[test]
    fn anchors_cover_every_position_in_order() {
        let a = window_anchors(7, 3).unwrap();
        assert_eq!(a.len(), 25);
        assert_eq!(a[0], (0, 0));
        assert_eq!(a[1], (0, 1));
        assert_eq!(a[24], (4, 4));
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert_eq!(
            window_anchors(3, 4),
            Err(EngineError::InvalidWindow { size: 4, dimension: 3 })
        );
        assert!(window_anchors(3, 0).is_err());
    }

    #[test]
    fn ties_go_to_the_smallest_anchor() {
        // Windows at (1,1) and (1,2) both average 0.5; everything else is lower.
        let m = matrix_from_excess(&[
            &[0.5, 0.5, 0.5, 0.0],
            &[0.5, 0.5, 0.5, 0.0],
            &[0.0, 0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0, 0.0],
        ]);
        let s = search_windows(&m, NullModel::Hsa, 2).unwrap();
        assert_eq!(s.best.anchor(), Some((DoseLevel(1), DoseLevel(1))));
        assert_eq!(s.best.mean_excess, 0.5);
        let syn = s.best_synergistic.unwrap();
        assert_eq!(syn.anchor(), Some((DoseLevel(1), DoseLevel(1))));
    }

    #[test]
    fn best_and_synergy_only_windows_can_differ() {
        // (1,1) window: one large spike among negatives -> best synergy-only.
        // (3,3) window: uniformly mildly positive -> best mean excess.
        let m = matrix_from_excess(&[
            &[0.9, -0.4, 0.0, 0.0],
            &[-0.4, -0.4, 0.0, 0.0],
            &[0.0, 0.0, 0.1, 0.1],
            &[0.0, 0.0, 0.1, 0.1],
        ]);
        let s = search_windows(&m, NullModel::Bliss, 2).unwrap();
        assert_eq!(s.best.anchor(), Some((DoseLevel(3), DoseLevel(3))));
        assert_eq!(s.best.window_size(), Some(2));
        let syn = s.best_synergistic.unwrap();
        assert_eq!(syn.anchor(), Some((DoseLevel(1), DoseLevel(1))));
        assert_eq!(syn.synergistic_well_count, 1);
    }

    #[test]
    fn no_synergistic_window_is_absent() {
        let m = matrix_from_excess(&[&[-0.1, -0.2, 0.0], &[0.0, -0.3, -0.1], &[-0.2, 0.0, -0.1]]);
        let s = search_windows(&m, NullModel::Hsa, 2).unwrap();
        assert!(s.best_synergistic.is_none());
        // Best window is still reported even when every mean is negative.
        assert_eq!(s.best.anchor(), Some((DoseLevel(2), DoseLevel(1))));
    }

    #[test]
    fn full_size_window_matches_whole_matrix() {
        let m = matrix_from_excess(&[&[0.2, -0.1, 0.05], &[0.0, 0.3, -0.2], &[0.1, 0.1, 0.0]]);
        let s = search_windows(&m, NullModel::Bliss, 3).unwrap();
        let whole = crate::synergy::score_matrix(&m, NullModel::Bliss).unwrap();
        assert_eq!(s.best.mean_excess, whole.mean_excess);
        assert_eq!(s.best.synergistic_well_count, whole.synergistic_well_count);
        assert_eq!(s.best.anchor(), Some((DoseLevel(1), DoseLevel(1))));
    }
}
