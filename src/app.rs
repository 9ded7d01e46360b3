//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the scoring pipeline or one of the helper commands
//! - prints reports and writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CurveArgs, ScoreArgs, SimulateArgs};
use crate::domain::{CurveParams, ScreenConfig, SimulateConfig};
use crate::error::AppError;
use crate::models::DoseResponseCurve;

pub mod pipeline;

/// Entry point for the `combo` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Score(args) => handle_score(args),
        Command::Curve(args) => handle_curve(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

/// Log to stderr so stdout carries only reports. `RUST_LOG` overrides the `info` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = screen_config_from_args(&args);
    let run = pipeline::run_score(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    if let Some(path) = &config.export_csv {
        crate::io::export::write_scores_csv(path, &run.reports)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_scores_json(path, &run, config.window_size, config.rmse_threshold)?;
    }

    Ok(())
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    if args.points < 2 {
        return Err(AppError::new(2, "Viability table needs at least 2 points."));
    }
    let curve = DoseResponseCurve::with_auc_points(
        CurveParams {
            maxc: args.maxc,
            xmid: args.xmid,
            scal: args.scal,
            rmse: args.rmse,
        },
        args.auc_points,
    )?;

    println!(
        "{}",
        crate::report::format_curve_report(&curve, args.rmse_threshold, args.points)
    );
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = simulate_config_from_args(&args);
    let screen = crate::data::generate_screen(&config)?;
    let (wells, curves) = crate::io::export::write_screen(&config.out_dir, &screen)?;

    println!("Wrote {} matrices:", screen.matrices.len());
    println!("  wells : {}", wells.display());
    println!("  curves: {}", curves.display());
    Ok(())
}

pub fn screen_config_from_args(args: &ScoreArgs) -> ScreenConfig {
    ScreenConfig {
        wells_path: args.wells.clone(),
        curves_path: args.curves.clone(),
        window_size: args.window,
        rmse_threshold: args.rmse_threshold,
        auc_points: args.auc_points,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        show_grid: args.grid,
    }
}

pub fn simulate_config_from_args(args: &SimulateArgs) -> SimulateConfig {
    SimulateConfig {
        out_dir: args.out.clone(),
        matrices: args.matrices,
        dimension: args.dimension,
        seed: args.seed,
        synergy: args.synergy,
        noise_sd: args.noise,
        maxc: args.maxc,
        xmid_a: args.xmid_a,
        xmid_b: args.xmid_b,
        scal: args.scal,
    }
}
