//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve: `-` line
//! - initial guess: `.` line (optional)

use super::{AxisScale, project};
use crate::domain::{Dataset, PlotLabels};
use crate::fit::Overlay;

/// Render data, the optional guess, and the fit on a `width × height` grid.
pub fn render_ascii_plot(
    data: &Dataset,
    overlay: &Overlay,
    show_guess: bool,
    scale: AxisScale,
    width: usize,
    height: usize,
    labels: &PlotLabels,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

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

    let all = || points.iter().chain(fit.iter()).chain(guess.iter());
    let (x_min, x_max) = widen(range(all().map(|p| p.0)).unwrap_or((0.0, 1.0)));
    let (y_min, y_max) = range(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        x_min,
        x_max,
        y_min,
        y_max,
    };

    // Curves first so points overlay them; the fit wins over the guess.
    draw_curve(&mut grid, &fit, &frame, '-');
    draw_curve(&mut grid, &guess, &frame, '.');
    for &(x, y) in &points {
        let col = map_x(x, frame.x_min, frame.x_max, width);
        let row = map_y(y, frame.y_min, frame.y_max, height);
        grid[row][col] = 'o';
    }

    let (xa, xb, ya, yb) = match scale {
        AxisScale::Linear => (x_min, x_max, y_min, y_max),
        AxisScale::LogLog => (
            10f64.powf(x_min),
            10f64.powf(x_max),
            10f64.powf(y_min),
            10f64.powf(y_max),
        ),
    };
    let mut out = String::new();
    out.push_str(&format!(
        "{}: {}=[{xa:.4e}, {xb:.4e}] | {}=[{ya:.4e}, {yb:.4e}]{}\n",
        labels.title,
        labels.x_name,
        labels.y_name,
        if scale == AxisScale::LogLog { " (log-log)" } else { "" },
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let mut legend = vec!["o data"];
    if overlay.fit.is_some() {
        legend.push("- fit");
    }
    if show_guess {
        legend.push(". guess");
    }
    out.push_str(&format!("Legend: {}\n", legend.join(" | ")));

    out
}

struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() {
        Some((min, max))
    } else {
        None
    }
}

/// A single-valued x range still needs a nonzero width to map onto columns.
fn widen((min, max): (f64, f64)) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], frame: &Frame, ch: char) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, frame.x_min, frame.x_max, width);
        let row = map_y(y, frame.y_min, frame.y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None if grid[row][col] == ' ' => grid[row][col] = ch,
            None => {}
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::linear_grid;

    fn labels() -> PlotLabels {
        PlotLabels {
            title: "Plot".to_string(),
            ..PlotLabels::default()
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let data = Dataset {
            x: vec![1.0, 10.0],
            y: vec![100.0, 110.0],
            y_err: None,
        };
        let overlay = Overlay {
            grid: linear_grid(1.0, 10.0, 10),
            guess: vec![0.0; 10],
            fit: Some(vec![100.0; 10]),
            log_spaced: false,
        };

        let txt = render_ascii_plot(&data, &overlay, false, AxisScale::Linear, 10, 5, &labels());
        let expected = concat!(
            "Plot: x=[1.0000e0, 1.0000e1] | y=[9.9500e1, 1.1050e2]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
            "Legend: o data | - fit\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn guess_is_drawn_under_the_fit() {
        let data = Dataset {
            x: vec![0.0, 9.0],
            y: vec![0.0, 9.0],
            y_err: None,
        };
        let grid = linear_grid(0.0, 9.0, 10);
        let overlay = Overlay {
            guess: grid.iter().map(|x| 9.0 - x).collect(),
            fit: Some(grid.clone()),
            grid,
            log_spaced: false,
        };
        let txt = render_ascii_plot(&data, &overlay, true, AxisScale::Linear, 10, 10, &labels());
        let body: String = txt.lines().skip(1).take(10).collect();
        assert!(body.contains('.'));
        assert!(body.contains('-'));
        assert_eq!(body.matches('o').count(), 2);
        assert!(txt.ends_with("Legend: o data | - fit | . guess\n"));
    }

    #[test]
    fn log_axes_skip_non_positive_points() {
        let data = Dataset {
            x: vec![1.0, 10.0, 100.0, 50.0],
            y: vec![1.0, 10.0, 100.0, -3.0],
            y_err: None,
        };
        let overlay = Overlay {
            grid: vec![1.0, 100.0],
            guess: vec![1.0, 100.0],
            fit: None,
            log_spaced: true,
        };
        let txt = render_ascii_plot(&data, &overlay, false, AxisScale::LogLog, 10, 5, &labels());
        let body: String = txt.lines().skip(1).take(5).collect();
        assert_eq!(body.matches('o').count(), 3);
        assert!(txt.lines().next().unwrap().ends_with("(log-log)"));
        assert!(txt.starts_with("Plot: x=[1.0000e0, 1.0000e2]"));
    }
}
