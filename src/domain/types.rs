//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - rendered by the plotting back ends

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FitError;
use crate::models::ModelSpec;

/// Observed x/y data with optional one-sigma y errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub y_err: Option<Vec<f64>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// `(min, max)` of x, `None` for empty or non-finite data.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.x)
    }

    /// `(min, max)` of y, `None` for empty or non-finite data.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.y)
    }
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min.is_finite() && max.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

/// One fitting job.
///
/// Construction validates every shape invariant, so a `FitRequest` that exists
/// can always be handed to the fitter.
#[derive(Debug, Clone)]
pub struct FitRequest<'a> {
    model: &'a ModelSpec,
    x: Vec<f64>,
    y: Vec<f64>,
    y_err: Option<Vec<f64>>,
    initial: Vec<f64>,
    fixed: Vec<bool>,
}

impl<'a> FitRequest<'a> {
    /// Build a request.
    ///
    /// # Errors
    /// - [`FitError::ShapeMismatch`] when `initial`/`fixed` do not match the
    ///   model's parameter count, or `x`/`y`/`y_err` lengths differ
    /// - [`FitError::NonFiniteData`] for NaN/inf in `x` or `y`
    /// - [`FitError::InvalidUncertainty`] for a `y_err` entry that is not
    ///   finite and strictly positive
    pub fn new(
        model: &'a ModelSpec,
        x: Vec<f64>,
        y: Vec<f64>,
        y_err: Option<Vec<f64>>,
        initial: Vec<f64>,
        fixed: Vec<bool>,
    ) -> Result<Self, FitError> {
        let n_params = model.param_count();
        check_len("initial values", n_params, initial.len())?;
        check_len("fixed mask", n_params, fixed.len())?;
        check_len("y data", x.len(), y.len())?;
        if let Some(err) = &y_err {
            check_len("y errors", x.len(), err.len())?;
        }

        if let Some(index) = x.iter().position(|v| !v.is_finite()) {
            return Err(FitError::NonFiniteData { what: "x", index });
        }
        if let Some(index) = y.iter().position(|v| !v.is_finite()) {
            return Err(FitError::NonFiniteData { what: "y", index });
        }
        if let Some(err) = &y_err {
            if let Some((index, &value)) =
                err.iter().enumerate().find(|(_, e)| !(e.is_finite() && **e > 0.0))
            {
                return Err(FitError::InvalidUncertainty { index, value });
            }
        }

        Ok(Self {
            model,
            x,
            y,
            y_err,
            initial,
            fixed,
        })
    }

    /// Build a request from a [`Dataset`].
    pub fn from_dataset(
        model: &'a ModelSpec,
        data: &Dataset,
        initial: Vec<f64>,
        fixed: Vec<bool>,
    ) -> Result<Self, FitError> {
        Self::new(
            model,
            data.x.clone(),
            data.y.clone(),
            data.y_err.clone(),
            initial,
            fixed,
        )
    }

    pub fn model(&self) -> &'a ModelSpec {
        self.model
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn y_err(&self) -> Option<&[f64]> {
        self.y_err.as_deref()
    }

    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    pub fn fixed(&self) -> &[bool] {
        &self.fixed
    }

    pub fn free_count(&self) -> usize {
        self.fixed.iter().filter(|f| !**f).count()
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), FitError> {
    if expected == actual {
        Ok(())
    } else {
        Err(FitError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Why a fit did not produce an estimate.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitFailure {
    #[error("minimizer did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },
    #[error("{points} data points cannot constrain {free} free parameters")]
    InsufficientData { points: usize, free: usize },
    #[error("model produced non-finite residuals at the starting point")]
    NonFiniteResidual,
    #[error("covariance matrix is singular (a free parameter is unconstrained)")]
    SingularCovariance,
    #[error("minimizer produced non-finite parameters or uncertainties")]
    NonFiniteParameters,
}

/// Best-fit estimate for a converged fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitEstimate {
    pub parameters: Vec<f64>,
    pub uncertainties: Vec<f64>,
    pub chi2: f64,
    /// Degrees of freedom (`N − free`).
    pub dof: usize,
    pub iterations: usize,
}

impl FitEstimate {
    pub fn reduced_chi2(&self) -> Option<f64> {
        (self.dof > 0).then(|| self.chi2 / self.dof as f64)
    }
}

/// Outcome of a fit.
///
/// Non-convergence is an expected outcome and is reported here, never as an
/// `Err` or a panic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitResult {
    Converged(FitEstimate),
    Failed { reason: FitFailure },
}

impl FitResult {
    pub fn failed(reason: FitFailure) -> Self {
        FitResult::Failed { reason }
    }

    pub fn converged(&self) -> bool {
        matches!(self, FitResult::Converged(_))
    }

    pub fn estimate(&self) -> Option<&FitEstimate> {
        match self {
            FitResult::Converged(est) => Some(est),
            FitResult::Failed { .. } => None,
        }
    }

    pub fn parameters(&self) -> Option<&[f64]> {
        self.estimate().map(|e| e.parameters.as_slice())
    }

    pub fn uncertainties(&self) -> Option<&[f64]> {
        self.estimate().map(|e| e.uncertainties.as_slice())
    }

    pub fn failure_reason(&self) -> Option<&FitFailure> {
        match self {
            FitResult::Converged(_) => None,
            FitResult::Failed { reason } => Some(reason),
        }
    }
}

/// A full `fit` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub data_path: PathBuf,
    pub model: String,

    /// `name=value` starting values (override the parameter file).
    pub set: Vec<(String, f64)>,
    /// Parameters held fixed at their starting value.
    pub fix: Vec<String>,
    /// Optional JSON file with starting values / fixed flags.
    pub params_file: Option<PathBuf>,

    pub max_iterations: usize,

    pub log_axes: bool,
    pub show_guess: bool,
    pub grid_points: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub svg: Option<PathBuf>,
    pub export: Option<PathBuf>,
    /// Print the per-point residual table after the report.
    pub show_residuals: bool,

    pub labels: PlotLabels,
}

/// Axis and title labels for rendered overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotLabels {
    pub title: String,
    pub x_name: String,
    pub y_name: String,
}

impl Default for PlotLabels {
    fn default() -> Self {
        Self {
            title: "fit".to_string(),
            x_name: "x".to_string(),
            y_name: "y".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Catalog;

    fn linear() -> &'static ModelSpec {
        Catalog::global().lookup("Linear").unwrap()
    }

    #[test]
    fn request_rejects_wrong_initial_length() {
        let err = FitRequest::new(
            linear(),
            vec![1.0, 2.0, 3.0],
            vec![3.0, 5.0, 7.0],
            None,
            vec![1.0, 0.0, 0.0],
            vec![false, false],
        )
        .unwrap_err();
        assert_eq!(
            err,
            FitError::ShapeMismatch {
                what: "initial values",
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn request_rejects_mismatched_mask_and_data() {
        let mask = FitRequest::new(linear(), vec![1.0], vec![1.0], None, vec![1.0, 0.0], vec![false]);
        assert!(matches!(mask, Err(FitError::ShapeMismatch { what: "fixed mask", .. })));

        let data = FitRequest::new(
            linear(),
            vec![1.0, 2.0],
            vec![1.0],
            None,
            vec![1.0, 0.0],
            vec![false, false],
        );
        assert!(matches!(data, Err(FitError::ShapeMismatch { what: "y data", .. })));
    }

    #[test]
    fn request_rejects_bad_uncertainties() {
        let err = FitRequest::new(
            linear(),
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            Some(vec![0.1, 0.0]),
            vec![1.0, 0.0],
            vec![false, false],
        )
        .unwrap_err();
        assert_eq!(err, FitError::InvalidUncertainty { index: 1, value: 0.0 });
    }

    #[test]
    fn request_rejects_non_finite_data() {
        let err = FitRequest::new(
            linear(),
            vec![1.0, f64::NAN],
            vec![1.0, 2.0],
            None,
            vec![1.0, 0.0],
            vec![false, false],
        )
        .unwrap_err();
        assert_eq!(err, FitError::NonFiniteData { what: "x", index: 1 });
    }

    #[test]
    fn failed_result_has_no_parameters() {
        let r = FitResult::failed(FitFailure::NonConvergence { iterations: 10 });
        assert!(!r.converged());
        assert!(r.parameters().is_none());
        assert!(r.uncertainties().is_none());
        assert!(r.failure_reason().is_some());
    }

    #[test]
    fn fit_result_serializes_with_status_tag() {
        let r = FitResult::failed(FitFailure::SingularCovariance);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"]["kind"], "singular_covariance");
    }
}
