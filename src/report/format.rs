//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (the snapshot tests below)

use crate::domain::{Dataset, FitResult};
use crate::error::FitError;
use crate::models::{Catalog, ModelSpec};

/// Per-point comparison of data and fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct PointResidual {
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
    /// `residual / σ` when y errors are known.
    pub pull: Option<f64>,
}

/// Evaluate `model` at `params` for every data point.
pub fn compute_residuals(
    model: &ModelSpec,
    data: &Dataset,
    params: &[f64],
) -> Result<Vec<PointResidual>, FitError> {
    let fitted = model.evaluate_many(&data.x, params)?;
    Ok(data
        .x
        .iter()
        .zip(&data.y)
        .zip(fitted)
        .enumerate()
        .map(|(i, ((&x, &y_obs), y_fit))| {
            let residual = y_obs - y_fit;
            PointResidual {
                x,
                y_obs,
                y_fit,
                residual,
                pull: data.y_err.as_ref().map(|e| residual / e[i]),
            }
        })
        .collect())
}

/// `name: value +/- error`.
pub fn format_param_line(name: &str, value: f64, error: f64, fixed: bool) -> String {
    let mut line = format!("{name}: {value} +/- {error}");
    if fixed {
        line.push_str(" (fixed)");
    }
    line
}

/// Full fit report: header, parameters (or the failure), fit statistics.
pub fn format_fit_report(
    model: &ModelSpec,
    data: &Dataset,
    initial: &[f64],
    fixed: &[bool],
    result: &FitResult,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Fitting with {}\n", model.name()));
    let n_free = fixed.iter().filter(|f| !**f).count();
    out.push_str(&format!(
        "Points: n={} | free={} | fixed={} | weighted={}\n",
        data.len(),
        n_free,
        fixed.len() - n_free,
        if data.y_err.is_some() { "yes" } else { "no" },
    ));
    if let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (data.x_range(), data.y_range()) {
        out.push_str(&format!(
            "Range: x=[{x_lo:.4e}, {x_hi:.4e}] | y=[{y_lo:.4e}, {y_hi:.4e}]\n"
        ));
    }

    out.push_str("\nInitial values:\n");
    for ((p, v), f) in model.params().iter().zip(initial).zip(fixed) {
        let mark = if *f { " (fixed)" } else { "" };
        out.push_str(&format!("{}: {v}{mark}\n", p.name));
    }

    out.push_str("\nFit results:\n");
    match result {
        FitResult::Converged(est) => {
            for (((p, v), e), f) in model
                .params()
                .iter()
                .zip(&est.parameters)
                .zip(&est.uncertainties)
                .zip(fixed)
            {
                out.push_str(&format_param_line(p.name, *v, *e, *f));
                out.push('\n');
            }
            out.push_str(&format!("\nchi2 = {:.6} | dof = {}", est.chi2, est.dof));
            if let Some(red) = est.reduced_chi2() {
                out.push_str(&format!(" | reduced chi2 = {red:.6}"));
            }
            out.push_str(&format!(" | iterations = {}\n", est.iterations));
        }
        FitResult::Failed { reason } => {
            out.push_str(&format!("FIT FAILED: {reason}\n"));
        }
    }

    out
}

/// Residual table (one row per data point).
pub fn format_residuals(rows: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>12} {:>12} {:>12} {:>12} {:>8}",
            "x", "y_obs", "y_fit", "residual", "pull"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<12} {:-<12} {:-<12} {:-<12} {:-<8}", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        let pull = r.pull.map(|p| format!("{p:.2}")).unwrap_or_default();
        out.push_str(
            format!(
                "{:>12.4e} {:>12.4e} {:>12.4e} {:>12.4e} {:>8}",
                r.x, r.y_obs, r.y_fit, r.residual, pull
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// `specfit models` listing.
pub fn format_model_list(catalog: &Catalog) -> String {
    let mut out = String::new();
    for m in catalog.iter() {
        out.push_str(&format!("{:<16} {}\n", m.name(), m.description()));
        let params: Vec<String> = m
            .params()
            .iter()
            .map(|p| format!("{}={}", p.name, p.default))
            .collect();
        out.push_str(&format!("{:<16} params: {}\n", "", params.join(", ")));
        if !m.aliases().is_empty() {
            let aliases: Vec<String> = m.aliases().iter().map(|a| format!("\"{a}\"")).collect();
            out.push_str(&format!("{:<16} aliases: {}\n", "", aliases.join(", ")));
        }
    }
    out
}

/// Two-column `x  y` table for `specfit eval`.
pub fn format_eval_table(x: &[f64], y: &[f64]) -> String {
    let mut out = format!("{:>14} {:>14}\n", "x", "y");
    for (a, b) in x.iter().zip(y) {
        out.push_str(&format!("{a:>14.6e} {b:>14.6e}\n"));
    }
    out
}
