//! Shared "score pipeline" logic used by the `score` command and tests.
//!
//! ingest wells + curves -> per-matrix curves and references -> matrix scores
//!
//! Matrices that cannot be scored are skipped with a reason; the run only fails
//! when nothing could be scored.

use serde::Serialize;

use crate::domain::{CurveParams, DrugRole, MatrixKey, ScreenConfig, WellRow};
use crate::error::AppError;
use crate::io::ingest::{CurveRow, CurveRows, IngestedCurves, IngestedWells, RowError};
use crate::matrix::{MonotherapyPair, WellMatrix};
use crate::models::{CurveSummary, DoseResponseCurve};
use crate::synergy::{ModelScores, score_all_models};

/// Summary of one monotherapy curve as shown to the reporting layer.
#[derive(Debug, Clone, Serialize)]
pub struct CurveReport {
    pub role: DrugRole,
    pub drug: Option<String>,
    pub params: CurveParams,
    pub summary: CurveSummary,
    /// RMSE above the configured threshold.
    pub flagged: bool,
}

/// All computed outputs for one combination matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub key: MatrixKey,
    pub dimension: usize,
    pub window_size: usize,
    pub curves: Vec<CurveReport>,
    pub scores: Vec<ModelScores>,
    #[serde(skip)]
    pub matrix: WellMatrix,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedMatrix {
    pub key: MatrixKey,
    pub reason: String,
}

/// All computed outputs of a single `combo score` run.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRun {
    pub rows_read: usize,
    pub rows_used: usize,
    pub reports: Vec<MatrixReport>,
    pub skipped: Vec<SkippedMatrix>,
    pub row_errors: Vec<RowError>,
}

/// Execute the full scoring pipeline from the configured CSV files.
pub fn run_score(config: &ScreenConfig) -> Result<ScoreRun, AppError> {
    validate_config(config)?;
    let wells = crate::io::ingest::load_well_rows(&config.wells_path)?;
    let curves = crate::io::ingest::load_curve_rows(&config.curves_path)?;
    score_ingested(config, wells, curves)
}

/// Score already-ingested rows.
pub fn score_ingested(
    config: &ScreenConfig,
    wells: IngestedWells,
    curves: IngestedCurves,
) -> Result<ScoreRun, AppError> {
    validate_config(config)?;

    let mut reports = Vec::with_capacity(wells.matrices.len());
    let mut skipped = Vec::new();

    for (key, rows) in &wells.matrices {
        match score_one(config, key, rows, curves.curves.get(key)) {
            Ok(report) => {
                tracing::debug!(matrix = %key, dimension = report.dimension, "scored matrix");
                reports.push(report);
            }
            Err(reason) => {
                tracing::warn!(matrix = %key, %reason, "skipping matrix");
                skipped.push(SkippedMatrix {
                    key: key.clone(),
                    reason,
                });
            }
        }
    }

    if reports.is_empty() {
        return Err(AppError::new(
            3,
            format!("No matrices could be scored ({} skipped).", skipped.len()),
        ));
    }
    tracing::info!(scored = reports.len(), skipped = skipped.len(), "scoring finished");

    let mut row_errors = wells.row_errors;
    row_errors.extend(curves.row_errors);

    Ok(ScoreRun {
        rows_read: wells.rows_read,
        rows_used: wells.rows_used,
        reports,
        skipped,
        row_errors,
    })
}

fn validate_config(config: &ScreenConfig) -> Result<(), AppError> {
    if config.window_size == 0 {
        return Err(AppError::new(2, "Window size must be >= 1."));
    }
    if !config.rmse_threshold.is_finite() || config.rmse_threshold < 0.0 {
        return Err(AppError::new(2, "RMSE threshold must be finite and >= 0."));
    }
    if config.auc_points < 2 {
        return Err(AppError::new(2, "AUC evaluation points must be >= 2."));
    }
    Ok(())
}

fn score_one(
    config: &ScreenConfig,
    key: &MatrixKey,
    rows: &[WellRow],
    curves: Option<&CurveRows>,
) -> Result<MatrixReport, String> {
    let empty = CurveRows::default();
    let curves = curves.unwrap_or(&empty);

    let mut reports = Vec::new();
    let mut built = [None, None];
    let mut issues = Vec::new();
    for (slot, role, row) in [(0, DrugRole::A, &curves.a), (1, DrugRole::B, &curves.b)] {
        let Some(row) = row else {
            issues.push(format!("no monotherapy curve for role {role:?}"));
            continue;
        };
        match build_curve(config, role, row) {
            Ok((report, curve)) => {
                if report.flagged {
                    tracing::warn!(matrix = %key, ?role, rmse = row.params.rmse, "curve fit above RMSE threshold");
                }
                reports.push(report);
                built[slot] = Some(curve);
            }
            Err(e) => issues.push(format!("curve {role:?}: {e}")),
        }
    }

    let matrix = match rows.iter().map(WellRow::precomputed).collect::<Option<Vec<_>>>() {
        Some(wells) => WellMatrix::new(wells),
        None => {
            let [Some(a), Some(b)] = built else {
                return Err(issues.join("; "));
            };
            WellMatrix::from_rows(rows, &MonotherapyPair::new(a, b))
        }
    }
    .map_err(|e| e.to_string())?;

    let scores = score_all_models(&matrix, config.window_size).map_err(|e| e.to_string())?;

    Ok(MatrixReport {
        key: key.clone(),
        dimension: matrix.dimension(),
        window_size: config.window_size,
        curves: reports,
        scores,
        matrix,
    })
}

fn build_curve(
    config: &ScreenConfig,
    role: DrugRole,
    row: &CurveRow,
) -> Result<(CurveReport, DoseResponseCurve), crate::error::EngineError> {
    let curve = DoseResponseCurve::with_auc_points(row.params, config.auc_points)?;
    let summary = curve.summary();
    Ok((
        CurveReport {
            role,
            drug: row.drug.clone(),
            params: row.params,
            summary,
            flagged: summary.is_flagged(config.rmse_threshold),
        },
        curve,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::{parse_curve_rows, parse_well_rows};
    use std::path::PathBuf;

    fn config() -> ScreenConfig {
        ScreenConfig {
            wells_path: PathBuf::new(),
            curves_path: PathBuf::new(),
            window_size: 2,
            rmse_threshold: 0.30,
            auc_points: 15,
            export_csv: None,
            export_json: None,
            show_grid: false,
        }
    }

    fn wells_csv(matrix_index: u32, n: u32) -> String {
        let mut s = String::from("plate,drug_set,matrix_index,dose_a,dose_b,conc_a,conc_b,viability\n");
        for a in 1..=n {
            for b in 1..=n {
                let ca = 10.0 / 2f64.powi(a as i32 - 1);
                let cb = 10.0 / 2f64.powi(b as i32 - 1);
                s.push_str(&format!("P1,AxB,{matrix_index},{a},{b},{ca},{cb},0.1\n"));
            }
        }
        s
    }

    const CURVES: &str = "plate,drug_set,matrix_index,role,drug,maxc,xmid,scal,rmse
P1,AxB,0,a,DrugA,1e7,6.0,1.0,0.05
P1,AxB,0,b,DrugB,1e7,5.0,1.0,0.45
";

    #[test]
    fn scores_complete_matrices_and_skips_the_rest() {
        let mut csv = wells_csv(0, 3);
        // Matrix 1 has wells but no curves.
        csv.push_str(wells_csv(1, 3).lines().skip(1).collect::<Vec<_>>().join("\n").as_str());
        csv.push('\n');

        let wells = parse_well_rows(csv.as_bytes()).unwrap();
        let curves = parse_curve_rows(CURVES.as_bytes()).unwrap();
        let run = score_ingested(&config(), wells, curves).unwrap();

        assert_eq!(run.reports.len(), 1);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].key.matrix_index, 1);
        assert!(run.skipped[0].reason.contains("no monotherapy curve"));

        let report = &run.reports[0];
        assert_eq!(report.dimension, 3);
        assert_eq!(report.scores.len(), 2);
        assert!(!report.curves[0].flagged);
        assert!(report.curves[1].flagged);
        // 90% inhibition everywhere beats both null models at most doses.
        assert!(report.scores[0].whole_matrix.synergistic_well_count > 0);
    }

    #[test]
    fn precomputed_references_do_not_need_curves() {
        let csv = "plate,drug_set,matrix_index,dose_a,dose_b,conc_a,conc_b,viability,hsa,bliss
P1,AxB,0,1,1,1,1,0.5,0.4,0.6
P1,AxB,0,1,2,1,1,0.5,0.4,0.6
P1,AxB,0,2,1,1,1,0.5,0.4,0.6
P1,AxB,0,2,2,1,1,0.5,0.4,0.6
";
        let wells = parse_well_rows(csv.as_bytes()).unwrap();
        let run = score_ingested(&config(), wells, IngestedCurves::default()).unwrap();
        let report = &run.reports[0];
        assert!(report.curves.is_empty());
        assert!(report.scores[0].whole_matrix.mean_excess > 0.0);
        assert!(report.scores[1].whole_matrix.mean_excess < 0.0);
    }

    #[test]
    fn nothing_scorable_is_exit_code_3() {
        let wells = parse_well_rows(wells_csv(5, 2).as_bytes()).unwrap();
        let err = score_ingested(&config(), wells, IngestedCurves::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn zero_window_is_rejected() {
        let mut c = config();
        c.window_size = 0;
        let wells = parse_well_rows(wells_csv(0, 2).as_bytes()).unwrap();
        let err = score_ingested(&c, wells, IngestedCurves::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
