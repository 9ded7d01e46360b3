//! Command-line parsing for the combination synergy scorer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the engine code. Scoring options can also come from the
//! environment (or a `.env` file loaded before parsing).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "combo", version, about = "Drug combination synergy scoring (HSA / Bliss)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score every combination matrix in a wells CSV against HSA and Bliss.
    Score(ScoreArgs),
    /// Summarize a single dose-response curve (IC50, AUC, Emax, viability table).
    Curve(CurveArgs),
    /// Generate a synthetic screen (wells.csv + curves.csv) for `combo score`.
    Simulate(SimulateArgs),
}

/// Options for scoring a screen.
#[derive(Debug, Parser, Clone)]
pub struct ScoreArgs {
    /// Wells CSV (plate, drug_set, matrix_index, dose_a, dose_b, conc_a, conc_b, viability).
    #[arg(long, value_name = "CSV")]
    pub wells: PathBuf,

    /// Monotherapy curve fits CSV (plate, drug_set, matrix_index, role, maxc, xmid, scal, rmse).
    #[arg(long, value_name = "CSV")]
    pub curves: PathBuf,

    /// Side length of the square sub-window searched for the best region.
    #[arg(short = 'w', long, env = "COMBO_WINDOW_SIZE", default_value_t = 3)]
    pub window: usize,

    /// Curves with RMSE above this are flagged in the report.
    #[arg(long, env = "COMBO_RMSE_THRESHOLD", default_value_t = crate::models::DEFAULT_RMSE_THRESHOLD)]
    pub rmse_threshold: f64,

    /// Number of evenly spaced points used for the AUC trapezoid.
    #[arg(long, env = "COMBO_AUC_POINTS", default_value_t = crate::models::AUC_POINTS)]
    pub auc_points: usize,

    /// Print the per-well excess grid for each matrix.
    #[arg(long)]
    pub grid: bool,

    /// Export per-(matrix, model) scores to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full run (curves, scores, skipped matrices) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

/// Options for summarizing one curve.
#[derive(Debug, Parser, Clone)]
pub struct CurveArgs {
    /// Maximum screened concentration in nM (x = 9 at maxc / 1e6).
    #[arg(long)]
    pub maxc: f64,

    /// Logistic midpoint on the x scale.
    #[arg(long, allow_negative_numbers = true)]
    pub xmid: f64,

    /// Logistic slope scale.
    #[arg(long, allow_negative_numbers = true)]
    pub scal: f64,

    /// Fit residual (only used for flagging).
    #[arg(long, default_value_t = 0.0)]
    pub rmse: f64,

    #[arg(long, env = "COMBO_RMSE_THRESHOLD", default_value_t = crate::models::DEFAULT_RMSE_THRESHOLD)]
    pub rmse_threshold: f64,

    #[arg(long, env = "COMBO_AUC_POINTS", default_value_t = crate::models::AUC_POINTS)]
    pub auc_points: usize,

    /// Rows in the viability table.
    #[arg(long, default_value_t = 11)]
    pub points: usize,
}

/// Options for generating a synthetic screen.
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Output directory for wells.csv and curves.csv.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of matrices.
    #[arg(short = 'n', long, default_value_t = 4)]
    pub matrices: usize,

    /// Dose levels per axis.
    #[arg(long, default_value_t = 6)]
    pub dimension: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Peak extra inhibition (fraction of the Bliss remainder) at the matrix centre.
    #[arg(long, default_value_t = 0.3, allow_negative_numbers = true)]
    pub synergy: f64,

    /// Standard deviation of the Gaussian measurement noise on inhibition.
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    #[arg(long, default_value_t = 1e7)]
    pub maxc: f64,

    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    pub xmid_a: f64,

    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub xmid_b: f64,

    #[arg(long, default_value_t = 0.8, allow_negative_numbers = true)]
    pub scal: f64,
}
