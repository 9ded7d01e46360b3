//! Formatted terminal output for scoring runs and single curves.
//!
//! We keep formatting code in one place so:
//! - the engine and pipeline stay free of presentation concerns
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{CurveReport, MatrixReport, ScoreRun};
use crate::domain::{NullModel, ScreenConfig, SynergyAggregate};
use crate::matrix::WellMatrix;
use crate::models::DoseResponseCurve;

/// Format the full run summary (ingest stats, per-matrix curves and scores).
pub fn format_run_summary(run: &ScoreRun, config: &ScreenConfig) -> String {
    let mut out = String::new();

    out.push_str("=== combo - Drug Combination Synergy ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} | row errors={}\n",
        run.rows_read,
        run.rows_used,
        run.row_errors.len()
    ));
    out.push_str(&format!(
        "Matrices: scored={} skipped={} | window={}x{} | rmse threshold={:.2}\n",
        run.reports.len(),
        run.skipped.len(),
        config.window_size,
        config.window_size,
        config.rmse_threshold,
    ));

    for report in &run.reports {
        out.push('\n');
        out.push_str(&format_matrix_report(report, config.rmse_threshold));
        if config.show_grid {
            for model in NullModel::ALL {
                out.push_str(&format_excess_grid(&report.matrix, model));
            }
        }
    }

    if !run.skipped.is_empty() {
        out.push_str("\nSkipped matrices:\n");
        for s in &run.skipped {
            out.push_str(&format!("  {}: {}\n", s.key, s.reason));
        }
    }

    if !run.row_errors.is_empty() {
        out.push_str("\nRow errors:\n");
        for e in run.row_errors.iter().take(20) {
            out.push_str(&format!("  {} line {}: {}\n", e.source, e.line, e.message));
        }
        if run.row_errors.len() > 20 {
            out.push_str(&format!("  ... and {} more\n", run.row_errors.len() - 20));
        }
    }

    out
}

/// Curves and per-model aggregates for one matrix.
pub fn format_matrix_report(report: &MatrixReport, rmse_threshold: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Matrix {} ({}x{})\n", report.key, report.dimension, report.dimension));

    for curve in &report.curves {
        out.push_str(&format_curve_line(curve, rmse_threshold));
    }

    out.push_str(
        format!(
            "  {:<6} {:<8} {:>8} {:>12} {:>6}\n",
            "model", "scope", "anchor", "mean_excess", "syn_n"
        )
        .as_str(),
    );
    for scores in &report.scores {
        let model = scores.null_model.display_name();
        out.push_str(&format_aggregate_line(model, "matrix", &scores.whole_matrix));
        out.push_str(&format_aggregate_line(model, "window", &scores.best_window));
        match &scores.best_synergistic_window {
            Some(agg) => out.push_str(&format_aggregate_line(model, "syn-win", agg)),
            None => out.push_str(&format!("  {model:<6} {:<8} (no synergistic wells)\n", "syn-win")),
        }
    }
    out
}

fn format_curve_line(curve: &CurveReport, rmse_threshold: f64) -> String {
    let flag = if curve.flagged {
        format!("  FLAG rmse>{rmse_threshold:.2}")
    } else {
        String::new()
    };
    format!(
        "  curve {:?} {:<12} IC50={} AUC={:.3} Emax={:.3} RMSE={:.3}{flag}\n",
        curve.role,
        truncate(curve.drug.as_deref().unwrap_or("-"), 12),
        fmt_conc(curve.summary.ic50),
        curve.summary.auc,
        curve.summary.emax,
        curve.summary.rmse,
    )
}

fn format_aggregate_line(model: &str, scope: &str, agg: &SynergyAggregate) -> String {
    let anchor = match agg.anchor() {
        Some((a, b)) => format!("({a},{b})"),
        None => "-".to_string(),
    };
    let syn_only = agg
        .mean_excess_synergistic_only
        .map(|v| format!(" syn_only={v:+.4}"))
        .unwrap_or_default();
    format!(
        "  {model:<6} {scope:<8} {anchor:>8} {:>+12.4} {:>6}{syn_only}\n",
        agg.mean_excess, agg.synergistic_well_count
    )
}

/// N×N excess grid, rows = drug A dose level, columns = drug B dose level.
pub fn format_excess_grid(matrix: &WellMatrix, model: NullModel) -> String {
    let grid = matrix.excess_grid(model);
    let n = matrix.dimension();
    let mut out = String::new();

    out.push_str(&format!("  {} excess (rows: dose A, cols: dose B)\n", model.display_name()));
    out.push_str(&format!("  {:>4}", ""));
    for j in 1..=n {
        out.push_str(&format!(" {j:>7}"));
    }
    out.push('\n');
    for i in 0..n {
        out.push_str(&format!("  {:>4}", i + 1));
        for j in 0..n {
            out.push_str(&format!(" {:>+7.3}", grid[(i, j)]));
        }
        out.push('\n');
    }
    out
}

/// Summary and viability table for one curve (`combo curve`).
pub fn format_curve_report(curve: &DoseResponseCurve, rmse_threshold: f64, points: usize) -> String {
    let summary = curve.summary();
    let params = curve.params();
    let mut out = String::new();

    out.push_str("=== combo - Dose-Response Curve ===\n");
    out.push_str(&format!(
        "maxc={} xmid={:.4} scal={:.4}\n",
        params.maxc, params.xmid, params.scal
    ));
    out.push_str(&format!("IC50 : {}\n", fmt_conc(summary.ic50)));
    out.push_str(&format!("AUC  : {:.4}\n", summary.auc));
    out.push_str(&format!("Emax : {:.4}\n", summary.emax));
    out.push_str(&format!("RMSE : {:.4}", summary.rmse));
    if summary.is_flagged(rmse_threshold) {
        out.push_str(&format!("  FLAG rmse>{rmse_threshold:.2}"));
    }
    out.push_str("\n\n");

    out.push_str(&format!("{:>14} {:>10}\n", "conc", "viability"));
    out.push_str(&format!("{:->14} {:->10}\n", "", ""));
    for (conc, viability) in curve.sample(points) {
        out.push_str(&format!("{:>14} {:>10.4}\n", fmt_conc(conc), viability));
    }
    out
}

fn fmt_conc(v: f64) -> String {
    if v != 0.0 && (v.abs() < 1e-3 || v.abs() >= 1e4) {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
