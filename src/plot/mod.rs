//! Data/guess/fit overlays: a terminal renderer and an SVG renderer.
//!
//! Both renderers draw in "projected" coordinates: identity for linear axes,
//! `log10` for log-log axes (where non-positive values are dropped).

pub mod ascii;
pub mod svg;

pub use ascii::render_ascii_plot;
pub use svg::{render_svg, write_svg};

use crate::math::to_log;

/// Axis scaling for rendered overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisScale {
    #[default]
    Linear,
    LogLog,
}

impl AxisScale {
    pub fn from_log_flag(log: bool) -> Self {
        if log { AxisScale::LogLog } else { AxisScale::Linear }
    }
}

/// Pair `xs`/`ys` into plottable points in projected space.
///
/// Non-finite pairs are always dropped; under [`AxisScale::LogLog`] so are
/// pairs with a non-positive coordinate.
pub(crate) fn project(xs: &[f64], ys: &[f64], scale: AxisScale) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .filter_map(|(&x, &y)| match scale {
            AxisScale::Linear => Some((x, y)),
            AxisScale::LogLog => log_point(x, y),
        })
        .collect()
}

/// `(log10 x, log10 y)`, or `None` when either coordinate is non-positive.
pub(crate) fn log_point(x: f64, y: f64) -> Option<(f64, f64)> {
    let (lx, _) = to_log(x, 0.0).ok()?;
    let (ly, _) = to_log(y, 0.0).ok()?;
    Some((lx, ly))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_drops_unplottable_points() {
        let xs = [1.0, 10.0, -1.0, f64::NAN];
        let ys = [100.0, 0.0, 5.0, 1.0];
        assert_eq!(
            project(&xs, &ys, AxisScale::Linear),
            vec![(1.0, 100.0), (10.0, 0.0), (-1.0, 5.0)]
        );
        assert_eq!(project(&xs, &ys, AxisScale::LogLog), vec![(0.0, 2.0)]);
    }

    #[test]
    fn log_projection_matches_log_transform() {
        let xs = [10.0, 300.0, 4.5e3];
        let ys = [2.0, 0.07, 1.3e-4];
        let zeros = [0.0; 3];
        let (lx, _) = crate::math::to_log_many(&xs, &zeros).unwrap();
        let (ly, _) = crate::math::to_log_many(&ys, &zeros).unwrap();
        let expected: Vec<(f64, f64)> = lx.into_iter().zip(ly).collect();
        assert_eq!(project(&xs, &ys, AxisScale::LogLog), expected);
        assert_eq!(log_point(0.0, 1.0), None);
    }
}
