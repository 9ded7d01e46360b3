//! Mapping between the logistic-model coordinate `x` and physical concentration.
//!
//! The screen uses a 2-fold dilution convention:
//!
//! - `conc(x) = maxc · 2^(x − 9) / 1e6`
//! - `x(conc) = log2(conc · 1e6 / maxc) + 9`
//!
//! so `x = 9` is the screen's maximum concentration (`maxc / 1e6`) and each unit
//! step in `x` halves or doubles the concentration.

use crate::error::EngineError;

/// `x` coordinate of the maximum screened concentration.
pub const X_AT_MAXC: f64 = 9.0;

/// Scale between `maxc` units and concentration units.
pub const CONC_SCALE: f64 = 1e6;

/// Convert a model coordinate to a concentration.
pub fn x_to_conc(x: f64, maxc: f64) -> Result<f64, EngineError> {
    ensure_positive("maxc", maxc)?;
    if !x.is_finite() {
        return Err(EngineError::Domain { what: "x", value: x });
    }
    Ok(maxc * (x - X_AT_MAXC).exp2() / CONC_SCALE)
}

/// Convert a concentration to a model coordinate.
pub fn conc_to_x(conc: f64, maxc: f64) -> Result<f64, EngineError> {
    ensure_positive("maxc", maxc)?;
    ensure_positive("concentration", conc)?;
    Ok((conc * CONC_SCALE / maxc).log2() + X_AT_MAXC)
}

pub(crate) fn ensure_positive(what: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::Domain { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_over_many_decades() {
        for &maxc in &[1.0, 1e3, 1e7, 3.3e9] {
            for &conc in &[1e-6, 0.01, 0.5, 10.0, 1e4] {
                let x = conc_to_x(conc, maxc).unwrap();
                let back = x_to_conc(x, maxc).unwrap();
                assert!(
                    ((back - conc) / conc).abs() < 1e-12,
                    "round trip drifted: conc={conc} maxc={maxc} back={back}"
                );
            }
        }
    }

    #[test]
    fn x_nine_is_the_screen_maximum() {
        let c = x_to_conc(9.0, 10_000_000.0).unwrap();
        assert_eq!(c, 10.0);
        assert_eq!(conc_to_x(10.0, 10_000_000.0).unwrap(), 9.0);
    }

    #[test]
    fn unit_step_halves_concentration() {
        let hi = x_to_conc(9.0, 1e6).unwrap();
        let lo = x_to_conc(8.0, 1e6).unwrap();
        assert!((hi / lo - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_or_non_finite() {
        assert!(matches!(
            conc_to_x(0.0, 1e6),
            Err(EngineError::Domain { what: "concentration", .. })
        ));
        assert!(conc_to_x(-1.0, 1e6).is_err());
        assert!(conc_to_x(f64::NAN, 1e6).is_err());
        assert!(conc_to_x(1.0, 0.0).is_err());
        assert!(x_to_conc(f64::INFINITY, 1e6).is_err());
        assert!(x_to_conc(1.0, -5.0).is_err());
    }
}
