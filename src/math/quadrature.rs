//! Evaluation grids and fixed-point quadrature.
//!
//! AUC must be reproducible bit-for-bit across runs, so we integrate on a fixed
//! linear grid with the trapezoid rule rather than an adaptive scheme.

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// Returns an empty vector when `steps < 2` or the bounds are not finite.
pub fn lin_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if steps < 2 || !(min.is_finite() && max.is_finite()) {
        return Vec::new();
    }
    let step = (max - min) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(min + step * i as f64);
    }
    // Pin the last point so the upper bound is hit exactly.
    out[steps - 1] = max;
    out
}

/// Trapezoid integral of `ys` sampled at `xs`.
///
/// # Panics
/// Panics if `xs` and `ys` have different lengths.
pub fn trapezoid(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(xs.len(), ys.len(), "trapezoid: xs and ys must align");
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_space_includes_endpoints() {
        let v = lin_space(-1.0, 9.0, 15);
        assert_eq!(v.len(), 15);
        assert_eq!(v[0], -1.0);
        assert_eq!(v[14], 9.0);
    }

    #[test]
    fn lin_space_rejects_short_grids() {
        assert!(lin_space(0.0, 1.0, 1).is_empty());
        assert!(lin_space(0.0, f64::NAN, 5).is_empty());
    }

    #[test]
    fn trapezoid_is_exact_for_linear_functions() {
        let xs = lin_space(0.0, 2.0, 5);
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x + 1.0).collect();
        assert!((trapezoid(&xs, &ys) - 8.0).abs() < 1e-12);
    }
}
