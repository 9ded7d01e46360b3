//! Shared domain types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - used in-memory by the scoring engine
//! - exported to JSON/CSV
//! - rebuilt from ingested rows without any storage backend

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Ordinal of one discrete concentration on a matrix axis (1..=N).
///
/// Dose level 1 is the **highest** screened concentration; ordinals increase as
/// concentration decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoseLevel(pub u32);

impl DoseLevel {
    /// Zero-based array index, or `None` for the invalid ordinal 0.
    pub fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    pub fn from_index(index: usize) -> Self {
        DoseLevel(index as u32 + 1)
    }
}

impl fmt::Display for DoseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External identity of one combination matrix instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatrixKey {
    pub plate: String,
    pub drug_set: String,
    pub matrix_index: u32,
}

impl fmt::Display for MatrixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.plate, self.drug_set, self.matrix_index)
    }
}

/// Null reference model a combination is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullModel {
    /// Highest single agent.
    Hsa,
    /// Bliss independence.
    Bliss,
}

impl NullModel {
    pub const ALL: [NullModel; 2] = [NullModel::Hsa, NullModel::Bliss];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            NullModel::Hsa => "HSA",
            NullModel::Bliss => "Bliss",
        }
    }

    /// Lowercase label used in export columns.
    pub fn label(self) -> &'static str {
        match self {
            NullModel::Hsa => "hsa",
            NullModel::Bliss => "bliss",
        }
    }

    /// Expected combined inhibition from the two monotherapy inhibitions.
    pub fn expected_inhibition(self, e1: f64, e2: f64) -> f64 {
        match self {
            NullModel::Hsa => e1.max(e2),
            NullModel::Bliss => e1 + e2 - e1 * e2,
        }
    }
}

/// Which axis of the matrix a monotherapy curve belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrugRole {
    A,
    B,
}

impl DrugRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Some(DrugRole::A),
            "b" => Some(DrugRole::B),
            _ => None,
        }
    }
}

/// Fitted logistic parameters for one dose-response curve.
///
/// `xmid` and `scal` come from an external fit; `rmse` is the fit residual and
/// is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    pub maxc: f64,
    pub xmid: f64,
    pub scal: f64,
    pub rmse: f64,
}

/// One ingested well row, before null references are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct WellRow {
    pub dose_a: DoseLevel,
    pub dose_b: DoseLevel,
    pub conc_a: f64,
    pub conc_b: f64,
    pub viability: f64,
    /// Precomputed HSA expected inhibition, if the source supplied one.
    pub hsa: Option<f64>,
    /// Precomputed Bliss expected inhibition, if the source supplied one.
    pub bliss: Option<f64>,
}

impl WellRow {
    /// Attach null-model references to this row.
    pub fn measure(&self, hsa: f64, bliss: f64) -> WellMeasurement {
        WellMeasurement {
            dose_a: self.dose_a,
            dose_b: self.dose_b,
            conc_a: self.conc_a,
            conc_b: self.conc_b,
            viability: self.viability,
            hsa,
            bliss,
        }
    }

    /// The measurement built from the row's own references, when it carries both.
    pub fn precomputed(&self) -> Option<WellMeasurement> {
        Some(self.measure(self.hsa?, self.bliss?))
    }
}

/// One cell of a combination matrix with its two null-model references.
///
/// `hsa` and `bliss` hold expected **inhibition** fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellMeasurement {
    pub dose_a: DoseLevel,
    pub dose_b: DoseLevel,
    pub conc_a: f64,
    pub conc_b: f64,
    pub viability: f64,
    pub hsa: f64,
    pub bliss: f64,
}

impl WellMeasurement {
    pub fn inhibition(&self) -> f64 {
        1.0 - self.viability
    }

    pub fn expected_inhibition(&self, model: NullModel) -> f64 {
        match model {
            NullModel::Hsa => self.hsa,
            NullModel::Bliss => self.bliss,
        }
    }

    /// Observed inhibition minus the null model's expectation.
    pub fn excess(&self, model: NullModel) -> f64 {
        self.inhibition() - self.expected_inhibition(model)
    }
}

/// Region of the matrix an aggregate was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Scope {
    WholeMatrix,
    /// A `size`×`size` window whose top-left well is `(anchor_a, anchor_b)`.
    Window {
        size: usize,
        anchor_a: DoseLevel,
        anchor_b: DoseLevel,
    },
}

/// Synergy aggregate for one null model over one scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynergyAggregate {
    pub null_model: NullModel,
    #[serde(flatten)]
    pub scope: Scope,
    pub mean_excess: f64,
    /// Mean excess over wells with positive excess; `None` when there are none.
    pub mean_excess_synergistic_only: Option<f64>,
    pub synergistic_well_count: usize,
}

impl SynergyAggregate {
    pub fn window_size(&self) -> Option<usize> {
        match self.scope {
            Scope::WholeMatrix => None,
            Scope::Window { size, .. } => Some(size),
        }
    }

    pub fn anchor(&self) -> Option<(DoseLevel, DoseLevel)> {
        match self.scope {
            Scope::WholeMatrix => None,
            Scope::Window {
                anchor_a, anchor_b, ..
            } => Some((anchor_a, anchor_b)),
        }
    }
}

/// Configuration of a `combo score` run as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    pub wells_path: PathBuf,
    pub curves_path: PathBuf,
    /// Side length of the square search window.
    pub window_size: usize,
    /// Curves with RMSE above this are flagged in reports.
    pub rmse_threshold: f64,
    /// Evaluation points for AUC quadrature.
    pub auc_points: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    /// Print per-well excess grids under each matrix.
    pub show_grid: bool,
}

/// Configuration for synthetic screen generation.
#[derive(Debug, Clone)]
pub struct SimulateConfig {
    pub out_dir: PathBuf,
    pub matrices: usize,
    pub dimension: usize,
    pub seed: u64,
    /// Peak extra inhibition added on top of Bliss at the matrix centre.
    pub synergy: f64,
    /// Standard deviation of Gaussian noise on observed inhibition.
    pub noise_sd: f64,
    pub maxc: f64,
    pub xmid_a: f64,
    pub xmid_b: f64,
    pub scal: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dose_level_index_is_one_based() {
        assert_eq!(DoseLevel(1).index(), Some(0));
        assert_eq!(DoseLevel(0).index(), None);
        assert_eq!(DoseLevel::from_index(6), DoseLevel(7));
    }

    #[test]
    fn null_models_combine_monotherapies() {
        assert!((NullModel::Hsa.expected_inhibition(0.2, 0.5) - 0.5).abs() < 1e-12);
        assert!((NullModel::Bliss.expected_inhibition(0.2, 0.5) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn excess_uses_inhibition_not_viability() {
        let w = WellMeasurement {
            dose_a: DoseLevel(1),
            dose_b: DoseLevel(1),
            conc_a: 1.0,
            conc_b: 1.0,
            viability: 0.3,
            hsa: 0.5,
            bliss: 0.6,
        };
        assert!((w.excess(NullModel::Hsa) - 0.2).abs() < 1e-12);
        assert!((w.excess(NullModel::Bliss) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn window_scope_serializes_flat() {
        let agg = SynergyAggregate {
            null_model: NullModel::Bliss,
            scope: Scope::Window {
                size: 3,
                anchor_a: DoseLevel(2),
                anchor_b: DoseLevel(4),
            },
            mean_excess: 0.1,
            mean_excess_synergistic_only: None,
            synergistic_well_count: 0,
        };
        let v = serde_json::to_value(agg).unwrap();
        assert_eq!(v["scope"], "window");
        assert_eq!(v["anchor_a"], 2);
        assert_eq!(v["null_model"], "bliss");
        assert!(v["mean_excess_synergistic_only"].is_null());
    }
}
