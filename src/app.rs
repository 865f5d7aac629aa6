//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the tracing subscriber
//! - dispatches to `models`, `eval`, `fit`, `simulate`
//! - prints reports/plots and writes optional exports

use clap::Parser;

use crate::cli::{Cli, Command, EvalArgs, FitArgs, SimulateArgs};
use crate::data::{SimulateConfig, simulate};
use crate::domain::{FitConfig, PlotLabels};
use crate::error::AppError;
use crate::io::{resolve_params, write_dataset_csv, write_dataset_file};
use crate::models::Catalog;
use crate::plot::AxisScale;

pub mod pipeline;

/// Entry point for the `specfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Models => handle_models(),
        Command::Eval(args) => handle_eval(args),
        Command::Fit(args) => handle_fit(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_models() -> Result<(), AppError> {
    print!("{}", crate::report::format_model_list(Catalog::global()));
    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let model = Catalog::global().lookup(&args.model)?;
    let params = resolve_params(model, None, &args.set, &[])?;
    let y = model.evaluate_many(&args.x, &params.initial)?;
    print!("{}", crate::report::format_eval_table(&args.x, &y));
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_fit_report(
            run.model,
            &run.ingest.data,
            &run.params.initial,
            &run.params.fixed,
            &run.result,
        )
    );
    if !run.ingest.row_errors.is_empty() {
        println!(
            "Skipped {} of {} data rows.\n",
            run.ingest.row_errors.len(),
            run.ingest.rows_read
        );
    }

    if config.show_residuals {
        if let Some(params) = run.result.parameters() {
            let rows = crate::report::compute_residuals(run.model, &run.ingest.data, params)?;
            println!("{}", crate::report::format_residuals(&rows));
        }
    }

    let scale = AxisScale::from_log_flag(config.log_axes);
    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.ingest.data,
            &run.overlay,
            config.show_guess,
            scale,
            config.plot_width,
            config.plot_height,
            &config.labels,
        );
        println!("{plot}");
    }

    // Optional outputs.
    if let Some(path) = &config.svg {
        crate::plot::write_svg(
            path,
            &run.ingest.data,
            &run.overlay,
            config.show_guess,
            scale,
            &config.labels,
        )?;
    }
    if let Some(path) = &config.export {
        let export = crate::io::FitExport::new(
            run.model,
            &run.ingest.data,
            &run.params.initial,
            &run.params.fixed,
            &run.result,
            &run.overlay,
        );
        crate::io::write_fit_json(path, &export)?;
    }

    match run.result.failure_reason() {
        None => Ok(()),
        Some(reason) => Err(AppError::new(4, format!("Fit did not converge: {reason}"))),
    }
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let model = Catalog::global().lookup(&args.model)?;
    let params = resolve_params(model, None, &args.set, &[])?;
    let config = SimulateConfig {
        x_min: args.x_min,
        x_max: args.x_max,
        points: args.points,
        log_grid: args.log_grid,
        noise: args.noise,
        seed: args.seed,
    };
    let data = simulate(model, &params.initial, &config)?;

    match &args.out {
        Some(path) => write_dataset_file(path, &data),
        None => write_dataset_csv(std::io::stdout().lock(), &data),
    }
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        data_path: args.data.clone(),
        model: args.model.clone(),
        set: args.set.clone(),
        fix: args.fix.clone(),
        params_file: args.params.clone(),
        max_iterations: args.max_iter,
        log_axes: args.log,
        show_guess: args.guess,
        grid_points: args.grid_points,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg: args.svg.clone(),
        export: args.export.clone(),
        show_residuals: args.residuals,
        labels: PlotLabels {
            title: args
                .title
                .clone()
                .unwrap_or_else(|| format!("{} fit", args.model)),
            x_name: args.x_name.clone(),
            y_name: args.y_name.clone(),
        },
    }
}
