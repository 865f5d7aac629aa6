//! Log-space conversion of values with uncertainties.
//!
//! First-order propagation through `log10`:
//!
//! ```text
//! σ_log = σ / (v · ln 10)
//! ```

use std::f64::consts::LN_10;

use crate::error::FitError;

/// Convert one `(value, err)` pair to `(log10 value, propagated err)`.
pub fn to_log(value: f64, err: f64) -> Result<(f64, f64), FitError> {
    to_log_at(0, value, err)
}

/// Convert paired slices element-wise.
///
/// Fails on the first non-positive (or non-finite) value, reporting its index.
pub fn to_log_many(values: &[f64], errs: &[f64]) -> Result<(Vec<f64>, Vec<f64>), FitError> {
    if values.len() != errs.len() {
        return Err(FitError::ShapeMismatch {
            what: "log transform errors",
            expected: values.len(),
            actual: errs.len(),
        });
    }

    let mut logs = Vec::with_capacity(values.len());
    let mut log_errs = Vec::with_capacity(values.len());
    for (i, (&v, &e)) in values.iter().zip(errs.iter()).enumerate() {
        let (lv, le) = to_log_at(i, v, e)?;
        logs.push(lv);
        log_errs.push(le);
    }
    Ok((logs, log_errs))
}

fn to_log_at(index: usize, value: f64, err: f64) -> Result<(f64, f64), FitError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(FitError::NonPositiveValue { index, value });
    }
    Ok((value.log10(), err / (value * LN_10)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_value() {
        for &v in &[1e-6, 0.3, 1.0, 42.0, 7.5e8] {
            let (lv, _) = to_log(v, 0.0).unwrap();
            let back = 10f64.powf(lv);
            assert!(((back - v) / v).abs() < 1e-12);
        }
    }

    #[test]
    fn propagates_small_relative_errors() {
        let (v, e) = (250.0, 2.5);
        let (lv, le) = to_log(v, e).unwrap();
        // Compare against a finite difference of log10.
        let numeric = ((v + e).log10() - (v - e).log10()) / 2.0;
        assert!((le - numeric).abs() / numeric < 1e-3);
        assert!((lv - v.log10()).abs() < 1e-15);
    }

    #[test]
    fn rejects_non_positive_values() {
        assert_eq!(
            to_log(0.0, 1.0),
            Err(FitError::NonPositiveValue { index: 0, value: 0.0 })
        );
        let err = to_log_many(&[1.0, 2.0, -3.0], &[0.1, 0.1, 0.1]).unwrap_err();
        assert_eq!(err, FitError::NonPositiveValue { index: 2, value: -3.0 });
    }

    #[test]
    fn length_mismatch_is_shape_error() {
        let err = to_log_many(&[1.0, 2.0], &[0.1]).unwrap_err();
        assert!(matches!(err, FitError::ShapeMismatch { .. }));
    }
}
