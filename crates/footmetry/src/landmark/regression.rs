//! Degree-2 least-squares fit and extremum location.
//!
//! The landmark picker fits `f ≈ c0 + c1·t + c2·t²` to an arc of border
//! points through the 3×3 normal equations and reads the parabola's turning
//! point. Accumulation runs in f64 and the system is solved by matrix
//! inverse; anything that cannot produce a finite extremum is reported as
//! [`DegenerateFit`] so the caller can keep its previous smoothed value.

use nalgebra::{Matrix3, Vector3};

use footmetry_core::fold_balanced;

use crate::error::DegenerateFit;

/// Solved quadratic and its extremum `(t*, f*)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticFit {
    /// Coefficients `(c0, c1, c2)`.
    pub coeffs: Vector3<f32>,
    /// Turning point: `t* = -c1 / 2c2`, `f* = c0 + t*·c1 / 2`.
    pub extremum: (f32, f32),
}

/// Fit a parabola to `(t, f)` samples and locate its extremum.
///
/// Fails when fewer than three distinct abscissae are present, when the
/// normal-equations matrix is singular, or when the fitted curve has no
/// turning point (`c2 ≈ 0`).
pub fn fit_extremum(points: &[(f32, f32)]) -> Result<QuadraticFit, DegenerateFit> {
    let degenerate = DegenerateFit {
        points: points.len(),
    };

    let mut distinct: Vec<f32> = Vec::new();
    for &(t, _) in points {
        if !distinct.contains(&t) {
            distinct.push(t);
        }
    }
    if distinct.len() < 3 {
        return Err(degenerate);
    }

    // Per-point contributions to M·c = F summed pairwise; matrix/vector
    // addition is associative, so the balanced fold matches a plain sum.
    let contributions: Vec<(Matrix3<f64>, Vector3<f64>)> = points
        .iter()
        .map(|&(t, f)| {
            let (t, f) = (t as f64, f as f64);
            let t2 = t * t;
            let m = Matrix3::new(
                1.0,
                t,
                t2, //
                t,
                t2,
                t2 * t, //
                t2,
                t2 * t,
                t2 * t2,
            );
            let rhs = Vector3::new(f, f * t, f * t2);
            (m, rhs)
        })
        .collect();
    let (m, rhs) = fold_balanced(
        contributions,
        (Matrix3::zeros(), Vector3::zeros()),
        |a, b| (a.0 + b.0, a.1 + b.1),
    );

    let inv = m.try_inverse().ok_or(degenerate)?;
    let c = inv * rhs;
    if !c.iter().all(|v| v.is_finite()) || c[2].abs() < 1e-12 {
        return Err(degenerate);
    }

    let t_ext = -0.5 * c[1] / c[2];
    let f_ext = c[0] + 0.5 * t_ext * c[1];
    if !t_ext.is_finite() || !f_ext.is_finite() {
        return Err(degenerate);
    }

    Ok(QuadraticFit {
        coeffs: Vector3::new(c[0] as f32, c[1] as f32, c[2] as f32),
        extremum: (t_ext as f32, f_ext as f32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(c0: f32, c1: f32, c2: f32, ts: &[f32]) -> Vec<(f32, f32)> {
        ts.iter().map(|&t| (t, c0 + c1 * t + c2 * t * t)).collect()
    }

    #[test]
    fn recovers_noiseless_coefficients() {
        let points = sample(0.3, -1.2, 2.5, &[-2.0, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0]);
        let fit = fit_extremum(&points).unwrap();
        assert_relative_eq!(fit.coeffs[0], 0.3, epsilon = 1e-4);
        assert_relative_eq!(fit.coeffs[1], -1.2, epsilon = 1e-4);
        assert_relative_eq!(fit.coeffs[2], 2.5, epsilon = 1e-4);
    }

    #[test]
    fn extremum_matches_analytic_turning_point() {
        // f(t) = (t - 1)² + 2  ->  minimum at (1, 2)
        let points = sample(3.0, -2.0, 1.0, &[-1.0, 0.0, 0.5, 1.5, 2.0, 3.0]);
        let fit = fit_extremum(&points).unwrap();
        assert_relative_eq!(fit.extremum.0, 1.0, epsilon = 1e-4);
        assert_relative_eq!(fit.extremum.1, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn two_distinct_abscissae_are_degenerate() {
        let points = vec![(0.0, 1.0), (0.0, 1.1), (1.0, 2.0), (1.0, 2.1)];
        let err = fit_extremum(&points).unwrap_err();
        assert_eq!(err.points, 4);
    }

    #[test]
    fn too_few_points_are_degenerate() {
        assert!(fit_extremum(&[]).is_err());
        assert!(fit_extremum(&[(0.0, 1.0), (1.0, 2.0)]).is_err());
    }

    #[test]
    fn linear_data_has_no_turning_point() {
        let points = sample(1.0, 2.0, 0.0, &[0.0, 1.0, 2.0, 3.0]);
        assert!(fit_extremum(&points).is_err());
    }
}
