//! Region selection for piecewise (broken) models.
//!
//! Every broken model in the catalog follows the same rule: the domain is cut
//! into ordered regions by one or more thresholds, and each region formula is
//! written as the previous region's value *at the threshold* times a new factor
//! that equals one there. Continuity therefore holds by construction; this
//! module only decides which region a point belongs to.

/// Which side of a threshold owns the threshold value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `x < t` is below, `x ≥ t` is above.
    UpperClosed,
    /// `x ≤ t` is below, `x > t` is above.
    LowerClosed,
}

impl Boundary {
    fn is_below(self, x: f64, threshold: f64) -> bool {
        match self {
            Boundary::UpperClosed => x < threshold,
            Boundary::LowerClosed => x <= threshold,
        }
    }

    fn is_above(self, x: f64, threshold: f64) -> bool {
        match self {
            Boundary::UpperClosed => x >= threshold,
            Boundary::LowerClosed => x > threshold,
        }
    }
}

/// Index of the region containing `x`.
///
/// Region `i` claims `x` when `x` is above threshold `i - 1` and below
/// threshold `i` (the outer regions only test their single threshold). When
/// several regions claim `x`, which only happens with unordered thresholds,
/// the highest index wins. For ordered thresholds exactly one region claims
/// each point, so the result is `0..=thresholds.len()`.
///
/// A NaN threshold never claims a point; when no region does, the last region
/// is returned.
pub fn region(x: f64, thresholds: &[f64], boundary: Boundary) -> usize {
    let n = thresholds.len();
    (0..=n)
        .rev()
        .find(|&i| {
            let above_lower = i == 0 || boundary.is_above(x, thresholds[i - 1]);
            let below_upper = i == n || boundary.is_below(x, thresholds[i]);
            above_lower && below_upper
        })
        .unwrap_or(n)
}

/// Relative difference `|a - b| / max(|a|, |b|)`, `0` when both are zero.
pub fn relative_gap(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 { 0.0 } else { (a - b).abs() / scale }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_ownership_follows_boundary_kind() {
        assert_eq!(region(2.0, &[2.0], Boundary::UpperClosed), 1);
        assert_eq!(region(2.0, &[2.0], Boundary::LowerClosed), 0);
        assert_eq!(region(1.0, &[2.0, 5.0], Boundary::LowerClosed), 0);
        assert_eq!(region(3.0, &[2.0, 5.0], Boundary::LowerClosed), 1);
        assert_eq!(region(9.0, &[2.0, 5.0], Boundary::LowerClosed), 2);
    }

    #[test]
    fn reversed_thresholds_give_the_last_region_precedence() {
        // Region 1 is empty; everything above the second threshold is region 2.
        assert_eq!(region(1.0, &[5.0, 2.0], Boundary::LowerClosed), 0);
        assert_eq!(region(2.0, &[5.0, 2.0], Boundary::LowerClosed), 0);
        assert_eq!(region(3.0, &[5.0, 2.0], Boundary::LowerClosed), 2);
        assert_eq!(region(6.0, &[5.0, 2.0], Boundary::LowerClosed), 2);
    }

    #[test]
    fn nan_threshold_falls_through_to_last_region() {
        assert_eq!(region(3.0, &[f64::NAN], Boundary::UpperClosed), 1);
        assert_eq!(region(3.0, &[2.0, f64::NAN], Boundary::LowerClosed), 2);
    }

    #[test]
    fn relative_gap_handles_zero() {
        assert_eq!(relative_gap(0.0, 0.0), 0.0);
        assert!((relative_gap(1.0, 1.1) - 0.1 / 1.1).abs() < 1e-15);
    }
}
