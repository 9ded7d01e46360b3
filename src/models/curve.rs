//! Four-parameter logistic dose-response curve and its summaries.
//!
//! The curve is evaluated in the model coordinate `x` (see [`crate::math::transform`]):
//!
//! ```text
//! inhibition(x) = 1 / (1 + exp(-(x - xmid) / scal))
//! viability(x)  = 1 - inhibition(x)
//! ```
//!
//! `xmid` and `scal` come from an external fit. This module only evaluates the
//! fitted function and derives IC50, AUC and Emax from it.

use serde::{Deserialize, Serialize};

use crate::domain::CurveParams;
use crate::error::EngineError;
use crate::math::{X_AT_MAXC, conc_to_x, ensure_positive, lin_space, trapezoid, x_to_conc};

/// Evaluation points used for AUC quadrature.
pub const AUC_POINTS: usize = 15;

/// Fold range below the screen maximum covered by the AUC integral.
pub const AUC_DILUTION_RANGE: f64 = 1000.0;

/// Curves with an RMSE above this are flagged by reports.
pub const DEFAULT_RMSE_THRESHOLD: f64 = 0.30;

/// Scalar summaries handed to the reporting layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSummary {
    pub ic50: f64,
    pub auc: f64,
    pub emax: f64,
    pub rmse: f64,
}

impl CurveSummary {
    /// True when the fit residual is strictly above `threshold`.
    ///
    /// Flagging is advisory; flagged curves are still reported.
    pub fn is_flagged(&self, threshold: f64) -> bool {
        self.rmse > threshold
    }
}

/// A fitted curve with its derived summaries. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseResponseCurve {
    params: CurveParams,
    ic50: f64,
    auc: f64,
    emax: f64,
}

impl DoseResponseCurve {
    /// Build a curve using the default AUC quadrature ([`AUC_POINTS`]).
    pub fn new(params: CurveParams) -> Result<Self, EngineError> {
        Self::with_auc_points(params, AUC_POINTS)
    }

    /// Build a curve, integrating AUC on `auc_points` evaluation points.
    pub fn with_auc_points(params: CurveParams, auc_points: usize) -> Result<Self, EngineError> {
        ensure_positive("maxc", params.maxc)?;
        if !params.xmid.is_finite() {
            return Err(EngineError::Domain {
                what: "xmid",
                value: params.xmid,
            });
        }
        if !params.scal.is_finite() || params.scal == 0.0 {
            return Err(EngineError::FitDegenerate { scal: params.scal });
        }

        let mut curve = DoseResponseCurve {
            params,
            ic50: x_to_conc(params.xmid, params.maxc)?,
            auc: 0.0,
            emax: 0.0,
        };
        curve.emax = curve.inhibition_at(X_AT_MAXC);
        curve.auc = curve.auc_with_points(auc_points)?;
        Ok(curve)
    }

    pub fn params(&self) -> CurveParams {
        self.params
    }

    pub fn maxc(&self) -> f64 {
        self.params.maxc
    }

    pub fn rmse(&self) -> f64 {
        self.params.rmse
    }

    /// Concentration at the logistic midpoint.
    pub fn ic50(&self) -> f64 {
        self.ic50
    }

    /// Area under the inhibition curve over the screened `x` range.
    pub fn auc(&self) -> f64 {
        self.auc
    }

    /// Fitted inhibition at the highest screened concentration.
    pub fn emax(&self) -> f64 {
        self.emax
    }

    pub fn summary(&self) -> CurveSummary {
        CurveSummary {
            ic50: self.ic50,
            auc: self.auc,
            emax: self.emax,
            rmse: self.params.rmse,
        }
    }

    /// Fraction of cells inhibited at model coordinate `x`.
    pub fn inhibition_at(&self, x: f64) -> f64 {
        1.0 / (1.0 + (-(x - self.params.xmid) / self.params.scal).exp())
    }

    /// Fraction of cells viable at model coordinate `x`.
    pub fn viability_at(&self, x: f64) -> f64 {
        1.0 - self.inhibition_at(x)
    }

    pub fn inhibition_at_conc(&self, conc: f64) -> Result<f64, EngineError> {
        Ok(self.inhibition_at(conc_to_x(conc, self.params.maxc)?))
    }

    pub fn viability_at_conc(&self, conc: f64) -> Result<f64, EngineError> {
        Ok(self.viability_at(conc_to_x(conc, self.params.maxc)?))
    }

    /// `x` bounds of the AUC integral: a 1000-fold range ending at the screen maximum.
    pub fn x_range(&self) -> (f64, f64) {
        (X_AT_MAXC - AUC_DILUTION_RANGE.log2(), X_AT_MAXC)
    }

    /// Trapezoid AUC of the inhibition curve on `points` evenly spaced `x` values.
    pub fn auc_with_points(&self, points: usize) -> Result<f64, EngineError> {
        if points < 2 {
            return Err(EngineError::Domain {
                what: "AUC evaluation points",
                value: points as f64,
            });
        }
        let (lo, hi) = self.x_range();
        let xs = lin_space(lo, hi, points);
        let ys: Vec<f64> = xs.iter().map(|&x| self.inhibition_at(x)).collect();
        Ok(trapezoid(&xs, &ys))
    }

    /// `(concentration, viability)` pairs over the AUC range, for plotting.
    pub fn sample(&self, points: usize) -> Vec<(f64, f64)> {
        let (lo, hi) = self.x_range();
        lin_space(lo, hi, points)
            .into_iter()
            .filter_map(|x| {
                let conc = x_to_conc(x, self.params.maxc).ok()?;
                Some((conc, self.viability_at(x)))
            })
            .collect()
    }
}
