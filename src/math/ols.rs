//! Small dense least-squares solves.
//!
//! The Levenberg–Marquardt step and the covariance estimate both reduce to
//! small systems (one row/column per free parameter, rarely more than 7), so
//! we use SVD throughout:
//! - it tolerates rank deficiency when a parameter has no leverage on the data
//!   (e.g. a break energy outside the data range)
//! - it lets us detect a singular covariance instead of returning garbage

use nalgebra::{DMatrix, DVector};

/// Solve `x β ≈ y` in the least-squares sense using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-14, 1e-12, 1e-10] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Invert a symmetric positive (semi-)definite matrix such as `JᵀJ`.
///
/// Cholesky is tried first; if the matrix is not numerically positive definite
/// we return `None` rather than a pseudo-inverse, because a zero singular value
/// means some parameter is unconstrained and its uncertainty is meaningless.
pub fn invert_normal_matrix(a: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let inv = a.clone().cholesky()?.inverse();
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

/// Whether the columns of `j` are (numerically) linearly dependent.
///
/// Columns are scaled to unit norm first so that parameters on very different
/// scales (a normalization of 1e-2 next to a peak energy of 300) do not look
/// degenerate. A zero column is always rank deficient.
pub fn is_rank_deficient(j: &DMatrix<f64>, rcond: f64) -> bool {
    let mut scaled = j.clone();
    for mut col in scaled.column_iter_mut() {
        let norm = col.norm();
        if !(norm.is_finite() && norm > 0.0) {
            return true;
        }
        col /= norm;
    }

    let sv = scaled.singular_values();
    let max = sv.max();
    let min = sv.min();
    !(max > 0.0 && min > rcond * max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn normal_matrix_inverse_round_trips() {
        let a = DMatrix::from_row_slice(2, 2, &[14.0, 6.0, 6.0, 3.0]);
        let inv = invert_normal_matrix(&a).unwrap();
        let eye = &a * &inv;
        assert!((eye[(0, 0)] - 1.0).abs() < 1e-12);
        assert!(eye[(0, 1)].abs() < 1e-12);
        assert!((eye[(1, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rank_deficiency_ignores_column_scale() {
        // Independent columns on wildly different scales.
        let j = DMatrix::from_row_slice(3, 2, &[1e-6, 300.0, 2e-6, 100.0, 3e-6, 50.0]);
        assert!(!is_rank_deficient(&j, 1e-7));

        // Proportional columns.
        let j = DMatrix::from_row_slice(3, 2, &[2.0, 1.0, 4.0, 2.0, 6.0, 3.0]);
        assert!(is_rank_deficient(&j, 1e-7));

        // A parameter with no leverage at all.
        let j = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 2.0, 0.0]);
        assert!(is_rank_deficient(&j, 1e-7));
    }

    #[test]
    fn singular_normal_matrix_is_rejected() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(invert_normal_matrix(&a).is_none());
    }
}
