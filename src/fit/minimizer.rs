//! Nonlinear least-squares minimization.
//!
//! The fitter only talks to the [`Minimizer`] trait; the one concrete solver
//! is a damped Gauss–Newton (Levenberg–Marquardt) iteration over a
//! forward-difference Jacobian.

use nalgebra::{DMatrix, DVector};

use crate::domain::FitFailure;
use crate::math::{invert_normal_matrix, is_rank_deficient, solve_least_squares};

/// Residual callback: fill `out` (length `m`) with the weighted residuals at
/// the free parameters `p`.
pub type ResidualFn<'a> = dyn Fn(&[f64], &mut [f64]) + 'a;

/// A converged least-squares solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub params: Vec<f64>,
    /// `(JᵀJ)⁻¹` of the weighted Jacobian at `params` (not scaled by chi2).
    pub covariance: DMatrix<f64>,
    pub chi2: f64,
    pub iterations: usize,
}

impl Solution {
    /// `sqrt(diag(cov) · scale)`.
    pub fn sigmas(&self, scale: f64) -> Vec<f64> {
        self.covariance
            .diagonal()
            .iter()
            .map(|v| (v * scale).sqrt())
            .collect()
    }
}

/// Minimizes `Σ r_i(p)²`.
pub trait Minimizer {
    fn minimize(
        &self,
        residuals: &ResidualFn<'_>,
        n_residuals: usize,
        initial: &[f64],
    ) -> Result<Solution, FitFailure>;
}

/// Levenberg–Marquardt settings.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Outer iteration budget; each iteration costs one Jacobian.
    pub max_iterations: usize,
    /// Relative chi2 decrease below which the fit is converged.
    pub ftol: f64,
    /// Relative step size below which the fit is converged.
    pub xtol: f64,
    /// Max-norm of `Jᵀr` below which the fit is converged.
    pub gtol: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// Damping at which a rejected step is treated as "no further reduction
    /// possible".
    pub max_lambda: f64,
    /// Reciprocal condition number (of the column-scaled Jacobian) below which
    /// the covariance is reported singular.
    pub rcond: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-14,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e16,
            rcond: 1e-7,
        }
    }
}

/// Chi2 below this is an exact fit.
const CHI2_FLOOR: f64 = 1e-30;

#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    pub config: LmConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: LmConfig) -> Self {
        Self { config }
    }
}

impl Minimizer for LevenbergMarquardt {
    fn minimize(
        &self,
        residuals: &ResidualFn<'_>,
        n_residuals: usize,
        initial: &[f64],
    ) -> Result<Solution, FitFailure> {
        let cfg = &self.config;
        let m = n_residuals;
        let n = initial.len();

        let mut p = initial.to_vec();
        let mut r = vec![0.0; m];
        residuals(&p, &mut r);
        if !all_finite(&r) {
            return Err(FitFailure::NonFiniteResidual);
        }
        let mut chi2 = sum_sq(&r);
        let mut lambda = cfg.initial_lambda;

        let mut trial = vec![0.0; m];
        let mut converged = false;
        let mut iterations = 0;

        while iterations < cfg.max_iterations {
            if chi2 < CHI2_FLOOR {
                converged = true;
                break;
            }
            iterations += 1;

            let j = jacobian(residuals, &p, &r);
            if !j.iter().all(|v| v.is_finite()) {
                return Err(FitFailure::NonFiniteResidual);
            }
            let r_vec = DVector::from_column_slice(&r);
            let grad = j.tr_mul(&r_vec);
            if grad.amax() <= cfg.gtol {
                converged = true;
                break;
            }

            // Marquardt scaling: damp each direction by its own curvature.
            let diag: Vec<f64> = j
                .column_iter()
                .map(|c| c.norm_squared().max(f64::MIN_POSITIVE))
                .collect();

            let mut accepted = None;
            while lambda <= cfg.max_lambda {
                let Some(delta) = damped_step(&j, &r_vec, &diag, lambda) else {
                    lambda *= cfg.lambda_up;
                    continue;
                };
                let p_new: Vec<f64> = p.iter().zip(delta.iter()).map(|(a, d)| a + d).collect();
                residuals(&p_new, &mut trial);
                let chi2_new = sum_sq(&trial);
                if chi2_new.is_finite() && chi2_new < chi2 {
                    accepted = Some((p_new, delta, chi2_new));
                    break;
                }
                lambda *= cfg.lambda_up;
            }

            let Some((p_new, delta, chi2_new)) = accepted else {
                // No downhill step even with heavy damping: we sit in a minimum
                // to within numerical precision.
                converged = true;
                break;
            };

            let rel_decrease = (chi2 - chi2_new) / chi2;
            let step_norm = delta.norm();
            let p_norm = p_new.iter().map(|v| v * v).sum::<f64>().sqrt();

            p = p_new;
            std::mem::swap(&mut r, &mut trial);
            chi2 = chi2_new;
            lambda = (lambda * cfg.lambda_down).max(f64::EPSILON);

            tracing::trace!(iteration = iterations, chi2, lambda, "lm step accepted");

            if rel_decrease <= cfg.ftol || step_norm <= cfg.xtol * (p_norm + cfg.xtol) {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(FitFailure::NonConvergence { iterations });
        }
        if !all_finite(&p) {
            return Err(FitFailure::NonFiniteParameters);
        }

        let j = jacobian(residuals, &p, &r);
        if !j.iter().all(|v| v.is_finite()) {
            return Err(FitFailure::NonFiniteParameters);
        }
        if n > 0 && is_rank_deficient(&j, cfg.rcond) {
            return Err(FitFailure::SingularCovariance);
        }
        let covariance = invert_normal_matrix(&j.tr_mul(&j)).ok_or(FitFailure::SingularCovariance)?;

        Ok(Solution {
            params: p,
            covariance,
            chi2,
            iterations,
        })
    }
}

/// Solve `[J; sqrt(λD)] δ ≈ [−r; 0]`.
///
/// Stacking the damping rows keeps the solve at the conditioning of `J`
/// instead of squaring it through `JᵀJ`.
fn damped_step(
    j: &DMatrix<f64>,
    r: &DVector<f64>,
    diag: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, n) = j.shape();
    let mut a = DMatrix::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(j);
    for (k, d) in diag.iter().enumerate() {
        a[(m + k, k)] = (lambda * d).sqrt();
    }

    let mut b = DVector::zeros(m + n);
    b.rows_mut(0, m).copy_from(&(-r));

    solve_least_squares(&a, &b)
}

/// Forward-difference Jacobian `∂r_i/∂p_k` at `p` (with `r = r(p)` given).
fn jacobian(residuals: &ResidualFn<'_>, p: &[f64], r: &[f64]) -> DMatrix<f64> {
    let m = r.len();
    let n = p.len();
    let sqrt_eps = f64::EPSILON.sqrt();

    let mut j = DMatrix::zeros(m, n);
    let mut shifted = p.to_vec();
    let mut r_shift = vec![0.0; m];
    for k in 0..n {
        let h = sqrt_eps * p[k].abs().max(1.0);
        shifted[k] = p[k] + h;
        // Use the representable step, not the requested one.
        let h_actual = shifted[k] - p[k];
        residuals(&shifted, &mut r_shift);
        for i in 0..m {
            j[(i, k)] = (r_shift[i] - r[i]) / h_actual;
        }
        shifted[k] = p[k];
    }
    j
}

fn sum_sq(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}
