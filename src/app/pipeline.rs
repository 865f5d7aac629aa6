//! Shared "fit pipeline" logic behind `specfit fit`.
//!
//! Keeping this in one place keeps the core workflow testable without a
//! terminal:
//! ingest -> resolve parameters -> fit -> overlay
//!
//! The CLI front-end then only deals with presentation (printing, files).

use crate::domain::{FitConfig, FitRequest, FitResult};
use crate::error::AppError;
use crate::fit::{LevenbergMarquardt, LmConfig, Overlay, fit_with};
use crate::io::{IngestedData, ResolvedParams, load_dataset, read_param_file, resolve_params};
use crate::models::{Catalog, ModelSpec};

/// All computed outputs of a single `specfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub model: &'static ModelSpec,
    pub ingest: IngestedData,
    pub params: ResolvedParams,
    pub result: FitResult,
    pub overlay: Overlay,
}

/// Execute the full fitting pipeline for a data file.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = load_dataset(&config.data_path)?;
    run_fit_with_data(config, ingest)
}

/// Execute the fitting pipeline on already-ingested data.
pub fn run_fit_with_data(config: &FitConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    // 1) Model and starting point.
    let model = Catalog::global().lookup(&config.model)?;
    let file = match &config.params_file {
        Some(path) => Some(read_param_file(path)?),
        None => None,
    };
    let params = resolve_params(model, file.as_ref(), &config.set, &config.fix)?;

    // 2) Fit.
    let request = FitRequest::from_dataset(
        model,
        &ingest.data,
        params.initial.clone(),
        params.fixed.clone(),
    )?;
    let minimizer = LevenbergMarquardt::new(LmConfig {
        max_iterations: config.max_iterations,
        ..LmConfig::default()
    });
    let result = fit_with(&request, &minimizer);

    // 3) Overlay curves for plots and exports.
    let overlay = Overlay::build(
        model,
        &ingest.data.x,
        &params.initial,
        Some(&result),
        config.grid_points,
        config.log_axes,
    )?;

    Ok(RunOutput {
        model,
        ingest,
        params,
        result,
        overlay,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{FitFailure, PlotLabels};
    use crate::io::parse_dataset;

    fn config(model: &str) -> FitConfig {
        FitConfig {
            data_path: PathBuf::from("unused.csv"),
            model: model.to_string(),
            set: Vec::new(),
            fix: Vec::new(),
            params_file: None,
            max_iterations: 200,
            log_axes: false,
            show_guess: false,
            grid_points: 20,
            plot: false,
            plot_width: 60,
            plot_height: 15,
            svg: None,
            export: None,
            show_residuals: false,
            labels: PlotLabels::default(),
        }
    }

    #[test]
    fn linear_pipeline_converges() {
        let ingest = parse_dataset("x,y\n1,3\n2,5\n3,7\n4,9.1\n").unwrap();
        let mut cfg = config("Linear");
        cfg.set = vec![("m".to_string(), 1.0), ("b".to_string(), 0.0)];

        let run = run_fit_with_data(&cfg, ingest).unwrap();
        let p = run.result.parameters().unwrap();
        assert!((p[0] - 2.03).abs() < 1e-6, "slope {}", p[0]);
        assert!((p[1] - 0.95).abs() < 1e-6, "intercept {}", p[1]);
        assert_eq!(run.overlay.grid.len(), 20);
        assert!(run.overlay.fit.is_some());
    }

    #[test]
    fn fixed_parameter_is_held() {
        let ingest = parse_dataset("1 3\n2 5\n3 7\n").unwrap();
        let mut cfg = config("Linear");
        cfg.set = vec![("b".to_string(), 0.5)];
        cfg.fix = vec!["b".to_string()];

        let run = run_fit_with_data(&cfg, ingest).unwrap();
        let est = run.result.estimate().unwrap();
        assert_eq!(est.parameters[1], 0.5);
        assert_eq!(est.uncertainties[1], 0.0);
        assert_eq!(est.dof, 2);
    }

    #[test]
    fn unknown_model_and_parameter_are_exit_code_2() {
        let ingest = parse_dataset("1,2\n2,3\n").unwrap();
        let err = run_fit_with_data(&config("NotAModel"), ingest.clone()).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let mut cfg = config("Linear");
        cfg.fix = vec!["slope".to_string()];
        let err = run_fit_with_data(&cfg, ingest).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn failed_fit_is_a_result_not_an_error() {
        let ingest = parse_dataset("1,2\n").unwrap();
        let run = run_fit_with_data(&config("Linear"), ingest).unwrap();
        assert_eq!(
            run.result.failure_reason(),
            Some(&FitFailure::InsufficientData { points: 1, free: 2 })
        );
        assert!(run.overlay.fit.is_none());
    }
}
