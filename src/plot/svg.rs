//! SVG overlay rendering with Plotters.
//!
//! Log-log plots are drawn in `log10` space on linear coordinates, with tick
//! labels formatted back into data units. That keeps one code path for both
//! axis scales.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::{AxisScale, log_point, project};
use crate::domain::{Dataset, PlotLabels};
use crate::error::AppError;
use crate::fit::Overlay;

/// Default canvas size in pixels.
pub const DEFAULT_SVG_SIZE: (u32, u32) = (900, 600);

/// Render the overlay to an SVG document.
pub fn render_svg(
    data: &Dataset,
    overlay: &Overlay,
    show_guess: bool,
    scale: AxisScale,
    labels: &PlotLabels,
    size: (u32, u32),
) -> Result<String, AppError> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, size).into_drawing_area();
        draw_overlay(&root, data, overlay, show_guess, scale, labels)
            .and_then(|()| root.present().map_err(Into::into))
            .map_err(|e| AppError::new(4, format!("SVG rendering failed: {e}")))?;
    }
    Ok(buf)
}

/// Render the overlay and write it to `path`.
pub fn write_svg(
    path: &Path,
    data: &Dataset,
    overlay: &Overlay,
    show_guess: bool,
    scale: AxisScale,
    labels: &PlotLabels,
) -> Result<(), AppError> {
    let svg = render_svg(data, overlay, show_guess, scale, labels, DEFAULT_SVG_SIZE)?;
    std::fs::write(path, svg)
        .map_err(|e| AppError::new(2, format!("Failed to write SVG {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "wrote SVG overlay");
    Ok(())
}

fn draw_overlay(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    data: &Dataset,
    overlay: &Overlay,
    show_guess: bool,
    scale: AxisScale,
    labels: &PlotLabels,
) -> Result<(), Box<dyn Error>> {
    let points = project(&data.x, &data.y, scale);
    let fit = overlay
        .fit
        .as_ref()
        .map(|f| project(&overlay.grid, f, scale))
        .unwrap_or_default();
    let guess = if show_guess {
        project(&overlay.grid, &overlay.guess, scale)
    } else {
        Vec::new()
    };
    let bars = error_bars(data, scale);

    let all = points.iter().chain(&fit).chain(&guess);
    let (x_min, x_max) = padded(all.clone().map(|p| p.0));
    let (y_min, y_max) = padded(all.map(|p| p.1).chain(bars.iter().flat_map(|b| [b.1, b.2])));

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&labels.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let tick = |v: &f64| match scale {
        AxisScale::Linear => format!("{v:.3}"),
        AxisScale::LogLog => format!("{:.2e}", 10f64.powf(*v)),
    };
    chart
        .configure_mesh()
        .x_desc(labels.x_name.as_str())
        .y_desc(labels.y_name.as_str())
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&tick)
        .y_label_formatter(&tick)
        .light_line_style(WHITE)
        .draw()?;

    // Error bars under the markers.
    chart.draw_series(
        bars.iter()
            .map(|&(x, lo, hi)| PathElement::new(vec![(x, lo), (x, hi)], BLACK.stroke_width(1))),
    )?;

    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 3, BLACK.filled())))?
        .label("data")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLACK.filled()));

    if !guess.is_empty() {
        let style = BLUE.mix(0.7).stroke_width(1);
        chart
            .draw_series(LineSeries::new(guess.iter().copied(), style))?
            .label("guess")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    if !fit.is_empty() {
        let style = RED.stroke_width(2);
        chart
            .draw_series(LineSeries::new(fit.iter().copied(), style))?
            .label("fit")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// `(x, y − σ, y + σ)` in projected space.
///
/// On log axes a bar whose lower end is non-positive is clipped to one decade
/// below the point.
fn error_bars(data: &Dataset, scale: AxisScale) -> Vec<(f64, f64, f64)> {
    let Some(err) = &data.y_err else {
        return Vec::new();
    };
    data.x
        .iter()
        .zip(&data.y)
        .zip(err)
        .filter_map(|((&x, &y), &e)| match scale {
            AxisScale::Linear => Some((x, y - e, y + e)),
            AxisScale::LogLog => {
                let (lx, ly) = log_point(x, y)?;
                let (_, hi) = log_point(x, y + e)?;
                let lo = log_point(x, y - e).map_or(ly - 1.0, |(_, lo)| lo);
                Some((lx, lo, hi))
            }
        })
        .filter(|(x, lo, hi)| x.is_finite() && lo.is_finite() && hi.is_finite())
        .collect()
}

/// Finite `(min, max)` padded by 5%; never empty.
fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(hi.abs().max(1.0) * 1e-9);
    (lo - pad, hi + pad)
}
