//! Data/guess/fit curves for rendering.
//!
//! Renderers never evaluate models themselves; they draw the arrays built here.

use serde::Serialize;

use crate::domain::FitResult;
use crate::error::FitError;
use crate::models::ModelSpec;

/// Default number of grid points.
pub const DEFAULT_GRID_POINTS: usize = 100;

/// `n` evenly spaced points on `[lo, hi]` (inclusive).
pub fn linear_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
            out[n - 1] = hi;
            out
        }
    }
}

/// `n` log-spaced points on `[lo, hi]` (inclusive); both ends must be `> 0`.
pub fn log_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let mut out: Vec<f64> = linear_grid(lo.ln(), hi.ln(), n)
        .into_iter()
        .map(f64::exp)
        .collect();
    // Pin the endpoints so the grid covers the data exactly.
    if let Some(first) = out.first_mut() {
        *first = lo;
    }
    if n > 1 {
        out[n - 1] = hi;
    }
    out
}

/// Curves to draw over the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub grid: Vec<f64>,
    /// Model at the initial values.
    pub guess: Vec<f64>,
    /// Model at the fitted values (converged fits only).
    pub fit: Option<Vec<f64>>,
    pub log_spaced: bool,
}

impl Overlay {
    /// Build the overlay for `points` grid values spanning the data.
    ///
    /// `log_axes` requests a log-spaced grid; it is only honored when every
    /// x is positive. Grid evaluation runs on the rayon pool.
    pub fn build(
        model: &ModelSpec,
        x: &[f64],
        initial: &[f64],
        result: Option<&FitResult>,
        points: usize,
        log_axes: bool,
    ) -> Result<Self, FitError> {
        let range = x
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });

        let Some((lo, hi)) = range else {
            return Ok(Self {
                grid: Vec::new(),
                guess: Vec::new(),
                fit: None,
                log_spaced: false,
            });
        };

        let log_spaced = log_axes && lo > 0.0;
        let grid = if log_spaced {
            log_grid(lo, hi, points)
        } else {
            linear_grid(lo, hi, points)
        };

        let guess = model.evaluate_grid(&grid, initial)?;
        let fit = match result.and_then(FitResult::parameters) {
            Some(params) => Some(model.evaluate_grid(&grid, params)?),
            None => None,
        };

        Ok(Self {
            grid,
            guess,
            fit,
            log_spaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitEstimate, FitFailure};
    use crate::models::Catalog;

    #[test]
    fn grids_include_endpoints() {
        let lin = linear_grid(1.0, 2.0, 5);
        assert_eq!(lin, vec![1.0, 1.25, 1.5, 1.75, 2.0]);

        let log = log_grid(0.1, 10.0, 5);
        assert_eq!(log[0], 0.1);
        assert_eq!(log[4], 10.0);
        assert!((log[2] - 1.0).abs() < 1e-12);
        assert!(linear_grid(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn overlay_spans_data_with_default_resolution() {
        let m = Catalog::global().lookup("Linear").unwrap();
        let x = [3.0, 1.0, 2.0];
        let result = FitResult::Converged(FitEstimate {
            parameters: vec![2.0, 1.0],
            uncertainties: vec![0.0, 0.0],
            chi2: 0.0,
            dof: 1,
            iterations: 3,
        });
        let o = Overlay::build(m, &x, &[1.0, 0.0], Some(&result), DEFAULT_GRID_POINTS, false).unwrap();
        assert_eq!(o.grid.len(), 100);
        assert_eq!(o.grid[0], 1.0);
        assert_eq!(o.grid[99], 3.0);
        assert_eq!(o.guess[99], 3.0);
        assert_eq!(o.fit.as_ref().unwrap()[99], 7.0);
    }

    #[test]
    fn failed_fit_has_no_fit_curve() {
        let m = Catalog::global().lookup("Linear").unwrap();
        let failed = FitResult::failed(FitFailure::SingularCovariance);
        let o = Overlay::build(m, &[1.0, 2.0], &[1.0, 0.0], Some(&failed), 10, false).unwrap();
        assert!(o.fit.is_none());
        assert_eq!(o.guess.len(), 10);
    }

    #[test]
    fn log_grid_requires_positive_data() {
        let m = Catalog::global().lookup("Linear").unwrap();
        let pos = Overlay::build(m, &[1.0, 100.0], &[1.0, 0.0], None, 3, true).unwrap();
        assert!(pos.log_spaced);
        assert!((pos.grid[1] - 10.0).abs() < 1e-12);

        let mixed = Overlay::build(m, &[-1.0, 1.0], &[1.0, 0.0], None, 3, true).unwrap();
        assert!(!mixed.log_spaced);
        assert_eq!(mixed.grid, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn wrong_initial_length_is_rejected() {
        let m = Catalog::global().lookup("Linear").unwrap();
        assert!(matches!(
            Overlay::build(m, &[1.0], &[1.0], None, 10, false),
            Err(FitError::ShapeMismatch { .. })
        ));
    }
}
