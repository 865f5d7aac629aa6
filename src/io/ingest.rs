//! Data table ingest.
//!
//! Turns an `x, y[, yerr]` table into a [`Dataset`] that is safe to fit.
//!
//! Accepted input:
//! - comma- or whitespace-separated columns (sniffed from the first data line)
//! - an optional header row naming the columns (`x`, `y`, `yerr`/`y_err`/`err`/`sigma`)
//! - `#` comment lines and blank lines
//!
//! Design goals:
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::StringRecord;

use crate::domain::Dataset;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the usable rows plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub data: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub has_header: bool,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.data.len()
    }
}

/// Column positions for x, y and the optional y error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    x: usize,
    y: usize,
    y_err: Option<usize>,
}

/// Load a data file from disk.
pub fn load_dataset(path: &Path) -> Result<IngestedData, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read data file '{}': {e}", path.display())))?;
    let ingested = parse_dataset(&text)?;
    tracing::info!(
        path = %path.display(),
        rows_read = ingested.rows_read,
        rows_used = ingested.rows_used(),
        skipped = ingested.row_errors.len(),
        "loaded data"
    );
    Ok(ingested)
}

/// Parse table text.
pub fn parse_dataset(text: &str) -> Result<IngestedData, AppError> {
    let normalized = normalize_delimiters(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(normalized.as_bytes());

    let mut columns: Option<Columns> = None;
    let mut has_header = false;
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut y_err = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows_read += 1;
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(str::is_empty) {
            continue;
        }

        let cols = match columns {
            Some(c) => c,
            None => {
                // The first non-comment line decides the layout.
                let c = if looks_like_header(&record) {
                    has_header = true;
                    columns = Some(columns_from_header(&record)?);
                    continue;
                } else {
                    positional_columns(&record)
                };
                columns = Some(c);
                c
            }
        };

        rows_read += 1;
        match parse_row(&record, cols) {
            Ok((xv, yv, ev)) => {
                x.push(xv);
                y.push(yv);
                if let Some(e) = ev {
                    y_err.push(e);
                }
            }
            Err(message) => {
                tracing::warn!(line, %message, "skipping data row");
                row_errors.push(RowError { line, message });
            }
        }
    }

    if x.is_empty() {
        return Err(AppError::new(3, "No usable data rows (need numeric x and y columns)."));
    }

    let y_err = columns.and_then(|c| c.y_err).map(|_| y_err);
    Ok(IngestedData {
        data: Dataset { x, y, y_err },
        row_errors,
        rows_read,
        has_header,
    })
}

/// Rewrite whitespace-separated lines as comma-separated ones.
///
/// Line structure is preserved so csv positions still match file lines.
fn normalize_delimiters(text: &str) -> String {
    let first_data = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'));
    let comma = first_data.is_some_and(|l| l.contains(','));
    if comma {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            out.push_str(trimmed);
        } else {
            out.push_str(&line.split_whitespace().collect::<Vec<_>>().join(","));
        }
        out.push('\n');
    }
    out
}

fn looks_like_header(record: &StringRecord) -> bool {
    record
        .get(0)
        .is_some_and(|f| f.parse::<f64>().is_err())
}

fn columns_from_header(record: &StringRecord) -> Result<Columns, AppError> {
    let header_map: HashMap<String, usize> = record
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let find = |names: &[&str]| names.iter().find_map(|n| header_map.get(*n).copied());
    let x = find(&["x", "energy", "e", "time", "t"])
        .ok_or_else(|| AppError::new(2, "Missing required column: `x`"))?;
    let y = find(&["y", "flux", "rate"])
        .ok_or_else(|| AppError::new(2, "Missing required column: `y`"))?;
    let y_err = find(&["yerr", "y_err", "err", "error", "sigma", "dy"]);
    Ok(Columns { x, y, y_err })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn positional_columns(record: &StringRecord) -> Columns {
    Columns {
        x: 0,
        y: 1,
        y_err: (record.len() >= 3).then_some(2),
    }
}

fn parse_row(record: &StringRecord, cols: Columns) -> Result<(f64, f64, Option<f64>), String> {
    let x = parse_field(record, cols.x, "x")?;
    let y = parse_field(record, cols.y, "y")?;
    let err = match cols.y_err {
        Some(idx) => Some(parse_field(record, idx, "yerr")?),
        None => None,
    };
    Ok((x, y, err))
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{name}` value."))?;
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid `{name}` value: '{raw}'."))?;
    if !v.is_finite() {
        return Err(format!("Non-finite `{name}` value: '{raw}'."));
    }
    Ok(v)
}
