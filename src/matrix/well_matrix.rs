//! Immutable square grid of well measurements.
//!
//! Wells are stored row-major by `(dose_a, dose_b)`, so `all_wells()` always
//! yields the same order: dose A level 1 first, dose B varying fastest.

use nalgebra::DMatrix;

use crate::domain::{DoseLevel, NullModel, WellMeasurement, WellRow};
use crate::error::EngineError;
use crate::matrix::reference::MonotherapyPair;

/// A complete N×N combination matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct WellMatrix {
    dimension: usize,
    wells: Vec<WellMeasurement>,
}

impl WellMatrix {
    /// Build a matrix from measurements that already carry their references.
    ///
    /// Every `(dose_a, dose_b)` in `1..=N × 1..=N` must appear exactly once,
    /// where N is the largest dose level on either axis.
    pub fn new(wells: Vec<WellMeasurement>) -> Result<Self, EngineError> {
        if wells.is_empty() {
            return Err(EngineError::IncompleteMatrix("matrix has no wells".to_string()));
        }
        for w in &wells {
            check_finite("viability", w.viability)?;
            check_finite("HSA reference", w.hsa)?;
            check_finite("Bliss reference", w.bliss)?;
            if w.dose_a.index().is_none() || w.dose_b.index().is_none() {
                return Err(EngineError::IncompleteMatrix(format!(
                    "dose levels are 1-based, found ({}, {})",
                    w.dose_a, w.dose_b
                )));
            }
        }

        let n = wells
            .iter()
            .map(|w| w.dose_a.0.max(w.dose_b.0) as usize)
            .max()
            .unwrap_or(0);
        if wells.len() != n * n {
            return Err(EngineError::IncompleteMatrix(format!(
                "expected {} wells for a {n}x{n} matrix, found {}",
                n * n,
                wells.len()
            )));
        }

        let mut slots: Vec<Option<WellMeasurement>> = vec![None; n * n];
        for w in wells {
            let idx = slot(n, w.dose_a, w.dose_b);
            if slots[idx].is_some() {
                return Err(EngineError::IncompleteMatrix(format!(
                    "duplicate well at dose levels ({}, {})",
                    w.dose_a, w.dose_b
                )));
            }
            slots[idx] = Some(w);
        }

        let wells = slots
            .into_iter()
            .enumerate()
            .map(|(idx, w)| {
                w.ok_or_else(|| {
                    EngineError::IncompleteMatrix(format!(
                        "missing well at dose levels ({}, {})",
                        idx / n + 1,
                        idx % n + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WellMatrix { dimension: n, wells })
    }

    /// Build a matrix from ingested rows, deriving references from `refs`.
    pub fn from_rows(rows: &[WellRow], refs: &MonotherapyPair) -> Result<Self, EngineError> {
        let wells = rows
            .iter()
            .map(|r| refs.measure(r))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(wells)
    }

    /// Levels per axis.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn well_at(&self, dose_a: DoseLevel, dose_b: DoseLevel) -> Option<&WellMeasurement> {
        let (i, j) = (dose_a.index()?, dose_b.index()?);
        if i >= self.dimension || j >= self.dimension {
            return None;
        }
        self.wells.get(i * self.dimension + j)
    }

    /// All wells in row-major dose order.
    pub fn all_wells(&self) -> &[WellMeasurement] {
        &self.wells
    }

    /// Per-well excess over `model`; entry `(i, j)` is dose levels `(i + 1, j + 1)`.
    pub fn excess_grid(&self, model: NullModel) -> DMatrix<f64> {
        let n = self.dimension;
        DMatrix::from_fn(n, n, |i, j| self.wells[i * n + j].excess(model))
    }
}

fn slot(n: usize, a: DoseLevel, b: DoseLevel) -> usize {
    (a.0 as usize - 1) * n + (b.0 as usize - 1)
}

fn check_finite(what: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::Domain { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well(a: u32, b: u32, viability: f64) -> WellMeasurement {
        WellMeasurement {
            dose_a: DoseLevel(a),
            dose_b: DoseLevel(b),
            conc_a: 1.0 / a as f64,
            conc_b: 1.0 / b as f64,
            viability,
            hsa: 0.1,
            bliss: 0.2,
        }
    }

    fn grid(n: u32) -> Vec<WellMeasurement> {
        let mut out = Vec::new();
        // Reverse order on purpose: storage order must not depend on input order.
        for a in (1..=n).rev() {
            for b in (1..=n).rev() {
                out.push(well(a, b, (a * 10 + b) as f64 / 100.0));
            }
        }
        out
    }

    #[test]
    fn indexes_wells_by_dose_levels() {
        let m = WellMatrix::new(grid(7)).unwrap();
        assert_eq!(m.dimension(), 7);
        assert_eq!(m.all_wells().len(), 49);
        let w = m.well_at(DoseLevel(3), DoseLevel(5)).unwrap();
        assert_eq!((w.dose_a, w.dose_b), (DoseLevel(3), DoseLevel(5)));
        assert!(m.well_at(DoseLevel(8), DoseLevel(1)).is_none());
        assert!(m.well_at(DoseLevel(0), DoseLevel(1)).is_none());
    }

    #[test]
    fn all_wells_order_is_row_major() {
        let m = WellMatrix::new(grid(3)).unwrap();
        let order: Vec<(u32, u32)> = m
            .all_wells()
            .iter()
            .map(|w| (w.dose_a.0, w.dose_b.0))
            .collect();
        assert_eq!(
            order,
            vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3), (3, 1), (3, 2), (3, 3)]
        );
    }

    #[test]
    fn missing_well_is_rejected() {
        let mut wells = grid(3);
        wells.retain(|w| !(w.dose_a.0 == 2 && w.dose_b.0 == 2));
        assert!(matches!(
            WellMatrix::new(wells),
            Err(EngineError::IncompleteMatrix(_))
        ));
    }

    #[test]
    fn duplicate_well_is_rejected_even_when_count_matches() {
        let mut wells = grid(3);
        let pos = wells
            .iter()
            .position(|w| w.dose_a.0 == 1 && w.dose_b.0 == 1)
            .unwrap();
        wells[pos] = well(2, 2, 0.5);
        let err = WellMatrix::new(wells).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn non_square_or_zero_levels_are_rejected() {
        let wells: Vec<_> = (1..=3).flat_map(|a| (1..=2).map(move |b| well(a, b, 0.5))).collect();
        assert!(WellMatrix::new(wells).is_err());
        assert!(WellMatrix::new(vec![well(0, 1, 0.5)]).is_err());
        assert!(WellMatrix::new(Vec::new()).is_err());
    }

    #[test]
    fn non_finite_viability_is_rejected() {
        let mut wells = grid(2);
        wells[0].viability = f64::NAN;
        assert!(matches!(
            WellMatrix::new(wells),
            Err(EngineError::Domain { what: "viability", .. })
        ));
    }

    #[test]
    fn excess_grid_matches_wells() {
        let m = WellMatrix::new(grid(4)).unwrap();
        let g = m.excess_grid(NullModel::Bliss);
        for w in m.all_wells() {
            let (i, j) = (w.dose_a.index().unwrap(), w.dose_b.index().unwrap());
            assert_eq!(g[(i, j)], w.excess(NullModel::Bliss));
        }
    }
}
