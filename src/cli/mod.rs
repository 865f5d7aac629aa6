//! Command-line parsing for the spectral model fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! modeling/math code; `app` turns these structs into plain configs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::io::parse_assignment;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "specfit", version, about = "Spectral model fitter (Levenberg–Marquardt)")]
pub struct Cli {
    /// Diagnostic log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value_t = Level::WARN)]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the model catalog with parameter names and defaults.
    Models,
    /// Evaluate a model at explicit x values.
    Eval(EvalArgs),
    /// Fit a model to a data table, print the report and optionally plot/export.
    Fit(FitArgs),
    /// Write a synthetic noisy dataset drawn from a model.
    Simulate(SimulateArgs),
}

/// Options for `specfit eval`.
#[derive(Debug, Parser, Clone)]
pub struct EvalArgs {
    /// Model name (or alias).
    #[arg(short = 'm', long)]
    pub model: String,

    /// Parameter value, `name=value` (repeatable).
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    /// Comma-separated x values.
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    pub x: Vec<f64>,
}

/// Options for `specfit fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Data table: `x, y[, yerr]` columns, CSV or whitespace separated.
    #[arg(short = 'd', long, value_name = "FILE")]
    pub data: PathBuf,

    /// Model name (or alias).
    #[arg(short = 'm', long)]
    pub model: String,

    /// Starting value, `name=value` (repeatable).
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    /// Hold a parameter fixed at its starting value (repeatable).
    #[arg(long = "fix", value_name = "NAME")]
    pub fix: Vec<String>,

    /// JSON parameter file with starting values and fixed flags.
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,

    /// Use log-log axes (and a log-spaced overlay grid when x > 0).
    #[arg(long)]
    pub log: bool,

    /// Draw the initial-guess curve as well.
    #[arg(long)]
    pub guess: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write an SVG overlay.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,

    /// Export the fit (parameters, result, overlay) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Print the per-point residual table.
    #[arg(long)]
    pub residuals: bool,

    /// Minimizer iteration budget.
    #[arg(long = "max-iter", default_value_t = 200)]
    pub max_iter: usize,

    /// Overlay grid size.
    #[arg(long, default_value_t = crate::fit::DEFAULT_GRID_POINTS)]
    pub grid_points: usize,

    /// Plot title (defaults to "<model> fit").
    #[arg(long)]
    pub title: Option<String>,

    /// x axis label.
    #[arg(long, default_value = "x")]
    pub x_name: String,

    /// y axis label.
    #[arg(long, default_value = "y")]
    pub y_name: String,
}

/// Options for `specfit simulate`.
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Model name (or alias).
    #[arg(short = 'm', long)]
    pub model: String,

    /// True parameter value, `name=value` (repeatable).
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, f64)>,

    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 1000.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Number of points.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub points: usize,

    /// Log-spaced x grid (needs x-min > 0).
    #[arg(long)]
    pub log_grid: bool,

    /// Relative noise level (0 for exact model values).
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (stdout when omitted).
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}
