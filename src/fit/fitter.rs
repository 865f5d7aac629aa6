//! Fit orchestration for a single request.
//!
//! Given:
//! - a model and its full parameter vector `θ`
//! - a fixed/free mask over `θ`
//! - observed `x_i`, `y_i` and optional `σ_i`
//!
//! we:
//! - hand only the free parameters to the minimizer
//! - splice the fixed values back in on every model evaluation
//! - reassemble full-length parameters and uncertainties
//!
//! Every ill-posed fit ends up as [`FitResult::Failed`]; nothing here panics or
//! returns `Err` for bad luck with the data.

use rayon::prelude::*;

use super::minimizer::{LevenbergMarquardt, Minimizer};
use crate::domain::{FitEstimate, FitFailure, FitRequest, FitResult};

/// Fit with the default Levenberg–Marquardt settings.
pub fn fit(request: &FitRequest<'_>) -> FitResult {
    fit_with(request, &LevenbergMarquardt::default())
}

/// Fit many independent requests on the rayon pool.
///
/// Results come back in request order.
pub fn fit_batch<M>(requests: &[FitRequest<'_>], minimizer: &M) -> Vec<FitResult>
where
    M: Minimizer + Sync,
{
    requests.par_iter().map(|r| fit_with(r, minimizer)).collect()
}

/// Fit with an explicit minimizer.
pub fn fit_with<M: Minimizer + ?Sized>(request: &FitRequest<'_>, minimizer: &M) -> FitResult {
    let model = request.model();
    let x = request.x();
    let y = request.y();
    let initial = request.initial();
    let n_points = x.len();

    let free_idx: Vec<usize> = request
        .fixed()
        .iter()
        .enumerate()
        .filter_map(|(i, fixed)| (!fixed).then_some(i))
        .collect();
    let n_free = free_idx.len();

    tracing::debug!(
        model = model.name(),
        points = n_points,
        free = n_free,
        weighted = request.y_err().is_some(),
        "starting fit"
    );

    let weights: Vec<f64> = match request.y_err() {
        Some(err) => err.iter().map(|s| 1.0 / s).collect(),
        None => vec![1.0; n_points],
    };

    // Weighted residuals at a full parameter vector.
    let fill_residuals = |theta: &[f64], out: &mut [f64]| {
        for (i, r) in out.iter_mut().enumerate() {
            *r = (model.evaluate(x[i], theta) - y[i]) * weights[i];
        }
    };

    if n_free == 0 {
        let mut r = vec![0.0; n_points];
        fill_residuals(initial, &mut r);
        let chi2: f64 = r.iter().map(|v| v * v).sum();
        if !chi2.is_finite() {
            return failed(model.name(), FitFailure::NonFiniteResidual);
        }
        tracing::debug!(model = model.name(), chi2, "all parameters fixed, nothing to minimize");
        return FitResult::Converged(FitEstimate {
            parameters: initial.to_vec(),
            uncertainties: vec![0.0; initial.len()],
            chi2,
            dof: n_points,
            iterations: 0,
        });
    }

    if n_points < n_free {
        return failed(
            model.name(),
            FitFailure::InsufficientData {
                points: n_points,
                free: n_free,
            },
        );
    }

    let partial = |free: &[f64], out: &mut [f64]| {
        let mut theta = initial.to_vec();
        for (&i, &v) in free_idx.iter().zip(free) {
            theta[i] = v;
        }
        fill_residuals(&theta, out);
    };
    let guess: Vec<f64> = free_idx.iter().map(|&i| initial[i]).collect();

    let solution = match minimizer.minimize(&partial, n_points, &guess) {
        Ok(s) => s,
        Err(reason) => return failed(model.name(), reason),
    };

    let dof = n_points - n_free;
    // Unit weights carry no absolute scale; let the scatter set it.
    let scale = if request.y_err().is_none() && dof > 0 {
        solution.chi2 / dof as f64
    } else {
        1.0
    };
    let sigmas = solution.sigmas(scale);
    if !(solution.params.iter().all(|v| v.is_finite()) && sigmas.iter().all(|v| v.is_finite())) {
        return failed(model.name(), FitFailure::NonFiniteParameters);
    }

    let mut parameters = initial.to_vec();
    let mut uncertainties = vec![0.0; initial.len()];
    for (k, &i) in free_idx.iter().enumerate() {
        parameters[i] = solution.params[k];
        uncertainties[i] = sigmas[k];
    }

    tracing::info!(
        model = model.name(),
        chi2 = solution.chi2,
        dof,
        iterations = solution.iterations,
        "fit converged"
    );

    FitResult::Converged(FitEstimate {
        parameters,
        uncertainties,
        chi2: solution.chi2,
        dof,
        iterations: solution.iterations,
    })
}

fn failed(model: &str, reason: FitFailure) -> FitResult {
    tracing::warn!(model, %reason, "fit failed");
    FitResult::failed(reason)
}
