//! Export fit results and datasets.
//!
//! The fit export is pretty JSON meant to be easy to consume in notebooks or
//! downstream scripts; datasets are written as `x,y[,yerr]` CSV that
//! [`crate::io::parse_dataset`] reads back.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{Dataset, FitResult};
use crate::error::AppError;
use crate::fit::Overlay;
use crate::models::ModelSpec;

/// Everything a `fit` run produced, in export form.
#[derive(Debug, Clone, Serialize)]
pub struct FitExport<'a> {
    pub tool: &'static str,
    pub model: &'static str,
    pub param_names: Vec<&'static str>,
    pub initial: &'a [f64],
    pub fixed: &'a [bool],
    pub points: usize,
    pub result: &'a FitResult,
    pub overlay: &'a Overlay,
}

impl<'a> FitExport<'a> {
    pub fn new(
        model: &ModelSpec,
        data: &Dataset,
        initial: &'a [f64],
        fixed: &'a [bool],
        result: &'a FitResult,
        overlay: &'a Overlay,
    ) -> Self {
        Self {
            tool: "specfit",
            model: model.name(),
            param_names: model.param_names(),
            initial,
            fixed,
            points: data.len(),
            result,
            overlay,
        }
    }
}

/// Write the fit export as pretty JSON.
pub fn write_fit_json(path: &Path, export: &FitExport<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    tracing::info!(path = %path.display(), "wrote fit export");
    Ok(())
}

/// Write `data` as CSV with an `x,y[,yerr]` header.
pub fn write_dataset_csv<W: Write>(out: W, data: &Dataset) -> Result<(), AppError> {
    let io_err = |e: csv::Error| AppError::new(2, format!("Failed to write CSV: {e}"));
    let mut writer = csv::Writer::from_writer(out);

    match &data.y_err {
        Some(_) => writer.write_record(["x", "y", "yerr"]).map_err(io_err)?,
        None => writer.write_record(["x", "y"]).map_err(io_err)?,
    }
    for i in 0..data.len() {
        let mut row = vec![format!("{:e}", data.x[i]), format!("{:e}", data.y[i])];
        if let Some(err) = &data.y_err {
            row.push(format!("{:e}", err[i]));
        }
        writer.write_record(&row).map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))?;
    Ok(())
}

/// Write `data` as CSV to `path`.
pub fn write_dataset_file(path: &Path, data: &Dataset) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    write_dataset_csv(file, data)?;
    tracing::info!(path = %path.display(), rows = data.len(), "wrote dataset");
    Ok(())
}
