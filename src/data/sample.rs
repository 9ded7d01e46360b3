//! Synthetic combination screens for demos and end-to-end tests.
//!
//! Each matrix uses two logistic monotherapies on a 2-fold dilution series
//! (dose level 1 = the screen maximum). Observed inhibition is the Bliss
//! expectation plus a Gaussian-shaped synergy bump centred on the matrix, plus
//! measurement noise. Generation is fully determined by the seed.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{CurveParams, DoseLevel, MatrixKey, NullModel, SimulateConfig, WellRow};
use crate::error::AppError;
use crate::io::ingest::CurveRow;
use crate::math::{X_AT_MAXC, x_to_conc};
use crate::matrix::MonotherapyPair;
use crate::models::DoseResponseCurve;

pub const DRUG_A: &str = "DrugA";
pub const DRUG_B: &str = "DrugB";

/// One generated matrix with the curves used to generate it.
#[derive(Debug, Clone)]
pub struct SyntheticMatrix {
    pub key: MatrixKey,
    pub rows: Vec<WellRow>,
    pub curve_a: CurveRow,
    pub curve_b: CurveRow,
}

#[derive(Debug, Clone)]
pub struct SyntheticScreen {
    pub matrices: Vec<SyntheticMatrix>,
}

pub fn generate_screen(config: &SimulateConfig) -> Result<SyntheticScreen, AppError> {
    if config.matrices == 0 {
        return Err(AppError::new(2, "Matrix count must be > 0."));
    }
    if config.dimension == 0 {
        return Err(AppError::new(2, "Matrix dimension must be > 0."));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(AppError::new(2, "Noise standard deviation must be finite and >= 0."));
    }
    if !config.synergy.is_finite() {
        return Err(AppError::new(2, "Synergy strength must be finite."));
    }

    let params_a = CurveParams {
        maxc: config.maxc,
        xmid: config.xmid_a,
        scal: config.scal,
        rmse: config.noise_sd,
    };
    let params_b = CurveParams {
        xmid: config.xmid_b,
        ..params_a
    };
    let pair = MonotherapyPair::new(
        DoseResponseCurve::new(params_a)?,
        DoseResponseCurve::new(params_b)?,
    );

    let noise = Normal::new(0.0, config.noise_sd)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let mut matrices = Vec::with_capacity(config.matrices);
    for m in 0..config.matrices {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(m as u64));
        let rows = generate_rows(&pair, config, &noise, &mut rng)?;
        matrices.push(SyntheticMatrix {
            key: MatrixKey {
                plate: format!("SIM{:04}", config.seed % 10_000),
                drug_set: format!("{DRUG_A}+{DRUG_B}"),
                matrix_index: m as u32,
            },
            rows,
            curve_a: CurveRow {
                drug: Some(DRUG_A.to_string()),
                params: params_a,
            },
            curve_b: CurveRow {
                drug: Some(DRUG_B.to_string()),
                params: params_b,
            },
        });
    }

    tracing::info!(
        matrices = matrices.len(),
        dimension = config.dimension,
        seed = config.seed,
        "generated synthetic screen"
    );

    Ok(SyntheticScreen { matrices })
}

/// Concentration of dose level `level` on the 2-fold series ending at `maxc`.
pub fn dilution_conc(level: DoseLevel, maxc: f64) -> Result<f64, AppError> {
    let steps = level.index().unwrap_or(0) as f64;
    Ok(x_to_conc(X_AT_MAXC - steps, maxc)?)
}

fn generate_rows(
    pair: &MonotherapyPair,
    config: &SimulateConfig,
    noise: &Normal<f64>,
    rng: &mut StdRng,
) -> Result<Vec<WellRow>, AppError> {
    let n = config.dimension;
    let centre = (n as f64 - 1.0) / 2.0;
    let width = (n as f64 / 4.0).max(0.5);

    let mut rows = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let dose_a = DoseLevel::from_index(i);
            let dose_b = DoseLevel::from_index(j);
            let conc_a = dilution_conc(dose_a, config.maxc)?;
            let conc_b = dilution_conc(dose_b, config.maxc)?;

            let bliss = pair.expected_inhibition(NullModel::Bliss, conc_a, conc_b)?;
            let d2 = (i as f64 - centre).powi(2) + (j as f64 - centre).powi(2);
            let bump = config.synergy * (-d2 / (2.0 * width * width)).exp();
            let inhibition = bliss + bump * (1.0 - bliss) + noise.sample(rng);

            rows.push(WellRow {
                dose_a,
                dose_b,
                conc_a,
                conc_b,
                viability: (1.0 - inhibition).clamp(0.0, 1.0),
                hsa: None,
                bliss: None,
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::WellMatrix;
    use crate::synergy::score_matrix;

    fn config(synergy: f64, noise_sd: f64) -> SimulateConfig {
        SimulateConfig {
            out_dir: std::path::PathBuf::from("."),
            matrices: 2,
            dimension: 7,
            seed: 7,
            synergy,
            noise_sd,
            maxc: 1e7,
            xmid_a: 6.0,
            xmid_b: 5.0,
            scal: 1.0,
        }
    }

    #[test]
    fn same_seed_same_screen() {
        let a = generate_screen(&config(0.2, 0.05)).unwrap();
        let b = generate_screen(&config(0.2, 0.05)).unwrap();
        assert_eq!(a.matrices[1].rows, b.matrices[1].rows);
        assert_ne!(a.matrices[0].rows, a.matrices[1].rows);
    }

    #[test]
    fn dose_level_one_is_the_maximum() {
        assert_eq!(dilution_conc(DoseLevel(1), 1e7).unwrap(), 10.0);
        assert_eq!(dilution_conc(DoseLevel(2), 1e7).unwrap(), 5.0);
    }

    #[test]
    fn noiseless_additive_screen_scores_zero_bliss_excess() {
        let screen = generate_screen(&config(0.0, 0.0)).unwrap();
        let m = &screen.matrices[0];
        let pair = MonotherapyPair::new(
            DoseResponseCurve::new(m.curve_a.params).unwrap(),
            DoseResponseCurve::new(m.curve_b.params).unwrap(),
        );
        let matrix = WellMatrix::from_rows(&m.rows, &pair).unwrap();
        let agg = score_matrix(&matrix, NullModel::Bliss).unwrap();
        assert!(agg.mean_excess.abs() < 1e-12);
    }

    #[test]
    fn synergy_bump_shows_up_as_positive_excess() {
        let screen = generate_screen(&config(0.4, 0.0)).unwrap();
        let m = &screen.matrices[0];
        let pair = MonotherapyPair::new(
            DoseResponseCurve::new(m.curve_a.params).unwrap(),
            DoseResponseCurve::new(m.curve_b.params).unwrap(),
        );
        let matrix = WellMatrix::from_rows(&m.rows, &pair).unwrap();
        let agg = score_matrix(&matrix, NullModel::Bliss).unwrap();
        assert!(agg.mean_excess > 0.0);
        assert_eq!(agg.synergistic_well_count, 49);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut c = config(0.1, 0.05);
        c.dimension = 0;
        assert_eq!(generate_screen(&c).unwrap_err().exit_code(), 2);
        let mut c = config(0.1, -1.0);
        c.matrices = 1;
        assert!(generate_screen(&c).is_err());
        let mut c = config(0.1, 0.05);
        c.scal = 0.0;
        assert_eq!(generate_screen(&c).unwrap_err().exit_code(), 4);
    }
}
