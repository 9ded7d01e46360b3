//! Exports: score tables (CSV), full run documents (JSON), and synthetic screens.
//!
//! The score CSV has one row per (matrix, null model) with a fixed column set,
//! so it is easy to consume in spreadsheets or downstream scripts. Absent
//! values (no synergistic well) are empty cells.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::{MatrixReport, ScoreRun};
use crate::data::SyntheticScreen;
use crate::error::AppError;

pub const TOOL_NAME: &str = "combo";

#[derive(Debug, Serialize)]
struct ScoreRecord<'a> {
    plate: &'a str,
    drug_set: &'a str,
    matrix_index: u32,
    null_model: &'static str,
    dimension: usize,
    mean_excess: f64,
    mean_excess_synergistic_only: Option<f64>,
    synergistic_well_count: usize,
    window_size: usize,
    window_anchor_a: Option<u32>,
    window_anchor_b: Option<u32>,
    window_mean_excess: f64,
    window_synergistic_well_count: usize,
    syn_window_anchor_a: Option<u32>,
    syn_window_anchor_b: Option<u32>,
    syn_window_mean_excess_synergistic_only: Option<f64>,
    syn_window_synergistic_well_count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ScoresDocument<'a> {
    tool: ToolInfo,
    generated_at: DateTime<Utc>,
    window_size: usize,
    rmse_threshold: f64,
    #[serde(flatten)]
    run: &'a ScoreRun,
}

#[derive(Debug, Serialize)]
struct WellRecord<'a> {
    plate: &'a str,
    drug_set: &'a str,
    matrix_index: u32,
    dose_a: u32,
    dose_b: u32,
    conc_a: f64,
    conc_b: f64,
    viability: f64,
}

#[derive(Debug, Serialize)]
struct CurveRecord<'a> {
    plate: &'a str,
    drug_set: &'a str,
    matrix_index: u32,
    role: &'static str,
    drug: Option<&'a str>,
    maxc: f64,
    xmid: f64,
    scal: f64,
    rmse: f64,
}

/// Write one row per (matrix, null model).
pub fn write_scores_csv(path: &Path, reports: &[MatrixReport]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create scores CSV '{}': {e}", path.display()),
        )
    })?;

    for report in reports {
        for scores in &report.scores {
            let window = scores.best_window;
            let syn = scores.best_synergistic_window;
            let anchor = window.anchor();
            let syn_anchor = syn.and_then(|s| s.anchor());
            let record = ScoreRecord {
                plate: &report.key.plate,
                drug_set: &report.key.drug_set,
                matrix_index: report.key.matrix_index,
                null_model: scores.null_model.label(),
                dimension: report.dimension,
                mean_excess: scores.whole_matrix.mean_excess,
                mean_excess_synergistic_only: scores.whole_matrix.mean_excess_synergistic_only,
                synergistic_well_count: scores.whole_matrix.synergistic_well_count,
                window_size: report.window_size,
                window_anchor_a: anchor.map(|(a, _)| a.0),
                window_anchor_b: anchor.map(|(_, b)| b.0),
                window_mean_excess: window.mean_excess,
                window_synergistic_well_count: window.synergistic_well_count,
                syn_window_anchor_a: syn_anchor.map(|(a, _)| a.0),
                syn_window_anchor_b: syn_anchor.map(|(_, b)| b.0),
                syn_window_mean_excess_synergistic_only: syn
                    .and_then(|s| s.mean_excess_synergistic_only),
                syn_window_synergistic_well_count: syn.map(|s| s.synergistic_well_count),
            };
            writer
                .serialize(record)
                .map_err(|e| AppError::new(2, format!("Failed to write scores CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush scores CSV: {e}")))?;
    tracing::info!(path = %path.display(), matrices = reports.len(), "wrote scores CSV");
    Ok(())
}

/// Write the full run (reports, skipped matrices, row errors) as pretty JSON.
pub fn write_scores_json(
    path: &Path,
    run: &ScoreRun,
    window_size: usize,
    rmse_threshold: f64,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create scores JSON '{}': {e}", path.display()),
        )
    })?;

    let doc = ScoresDocument {
        tool: ToolInfo {
            name: TOOL_NAME,
            version: env!("CARGO_PKG_VERSION"),
        },
        generated_at: Utc::now(),
        window_size,
        rmse_threshold,
        run,
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write scores JSON: {e}")))?;
    tracing::info!(path = %path.display(), "wrote scores JSON");
    Ok(())
}

/// Write `wells.csv` and `curves.csv` for a synthetic screen into `dir`.
///
/// Returns the two paths written.
pub fn write_screen(dir: &Path, screen: &SyntheticScreen) -> Result<(PathBuf, PathBuf), AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output dir '{}': {e}", dir.display()),
        )
    })?;
    let wells_path = dir.join("wells.csv");
    let curves_path = dir.join("curves.csv");

    let mut wells = csv::Writer::from_path(&wells_path)
        .map_err(|e| AppError::new(2, format!("Failed to create wells CSV: {e}")))?;
    let mut curves = csv::Writer::from_path(&curves_path)
        .map_err(|e| AppError::new(2, format!("Failed to create curves CSV: {e}")))?;

    for m in &screen.matrices {
        for row in &m.rows {
            wells
                .serialize(WellRecord {
                    plate: &m.key.plate,
                    drug_set: &m.key.drug_set,
                    matrix_index: m.key.matrix_index,
                    dose_a: row.dose_a.0,
                    dose_b: row.dose_b.0,
                    conc_a: row.conc_a,
                    conc_b: row.conc_b,
                    viability: row.viability,
                })
                .map_err(|e| AppError::new(2, format!("Failed to write wells CSV row: {e}")))?;
        }
        for (role, curve) in [("a", &m.curve_a), ("b", &m.curve_b)] {
            curves
                .serialize(CurveRecord {
                    plate: &m.key.plate,
                    drug_set: &m.key.drug_set,
                    matrix_index: m.key.matrix_index,
                    role,
                    drug: curve.drug.as_deref(),
                    maxc: curve.params.maxc,
                    xmid: curve.params.xmid,
                    scal: curve.params.scal,
                    rmse: curve.params.rmse,
                })
                .map_err(|e| AppError::new(2, format!("Failed to write curves CSV row: {e}")))?;
        }
    }

    wells
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush wells CSV: {e}")))?;
    curves
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush curves CSV: {e}")))?;

    Ok((wells_path, curves_path))
}
