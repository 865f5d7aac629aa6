//! Starting values and fixed flags for a model's parameters.
//!
//! Values are resolved in layers, later layers winning:
//! 1. the catalog defaults
//! 2. an optional JSON parameter file
//! 3. `--set name=value` assignments
//!
//! `--fix name` (or `"fixed": true` in the file) holds a parameter at its
//! resolved value.
//!
//! Parameter file format, keyed by parameter name:
//!
//! ```json
//! { "A": 5.0, "Epiv": { "value": 100.0, "fixed": true } }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, FitError};
use crate::models::ModelSpec;

/// One entry of a parameter file: a bare number or `{ value, fixed }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamEntry {
    Value(f64),
    Detailed {
        #[serde(default)]
        value: Option<f64>,
        #[serde(default)]
        fixed: bool,
    },
}

/// A parsed parameter file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ParamFile {
    pub entries: BTreeMap<String, ParamEntry>,
}

/// Resolved starting point for a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub initial: Vec<f64>,
    pub fixed: Vec<bool>,
}

/// Read a JSON parameter file.
pub fn read_param_file(path: &Path) -> Result<ParamFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open parameter file '{}': {e}", path.display())))?;
    let params: ParamFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid parameter file '{}': {e}", path.display())))?;
    Ok(params)
}

/// Parse a `name=value` assignment.
///
/// Used as a clap value parser, hence the `String` error.
pub fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number in '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("parameter value must be finite in '{raw}'"));
    }
    Ok((name.to_string(), value))
}

/// Combine defaults, an optional file, and CLI overrides into a starting point.
///
/// # Errors
/// [`FitError::UnknownParameter`] when any layer names a parameter the model
/// does not have.
pub fn resolve_params(
    model: &ModelSpec,
    file: Option<&ParamFile>,
    set: &[(String, f64)],
    fix: &[String],
) -> Result<ResolvedParams, FitError> {
    let mut initial = model.defaults();
    let mut fixed = vec![false; model.param_count()];

    let index = |name: &str| {
        model.param_index(name).ok_or_else(|| FitError::UnknownParameter {
            model: model.name().to_string(),
            name: name.to_string(),
        })
    };

    if let Some(file) = file {
        for (name, entry) in &file.entries {
            let i = index(name)?;
            match *entry {
                ParamEntry::Value(v) => initial[i] = v,
                ParamEntry::Detailed { value, fixed: f } => {
                    if let Some(v) = value {
                        initial[i] = v;
                    }
                    fixed[i] |= f;
                }
            }
        }
    }
    for (name, value) in set {
        initial[index(name)?] = *value;
    }
    for name in fix {
        fixed[index(name)?] = true;
    }

    tracing::debug!(model = model.name(), ?initial, ?fixed, "resolved parameters");
    Ok(ResolvedParams { initial, fixed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Catalog;

    fn power_law() -> &'static ModelSpec {
        Catalog::global().lookup("PowerLaw").unwrap()
    }

    #[test]
    fn assignment_parsing() {
        assert_eq!(parse_assignment("A=5"), Ok(("A".to_string(), 5.0)));
        assert_eq!(parse_assignment(" index = -2.5e0 "), Ok(("index".to_string(), -2.5)));
        assert!(parse_assignment("A").is_err());
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("A=abc").is_err());
        assert!(parse_assignment("A=inf").is_err());
    }

    #[test]
    fn layers_apply_in_order() {
        let file: ParamFile =
            serde_json::from_str(r#"{ "A": 2.0, "Epiv": { "value": 100.0, "fixed": true } }"#).unwrap();
        let set = vec![("A".to_string(), 7.0)];
        let fix = vec!["index".to_string()];

        let r = resolve_params(power_law(), Some(&file), &set, &fix).unwrap();
        assert_eq!(r.initial, vec![7.0, 100.0, -1.0]);
        assert_eq!(r.fixed, vec![false, true, true]);
    }

    #[test]
    fn defaults_when_nothing_given() {
        let r = resolve_params(power_law(), None, &[], &[]).unwrap();
        assert_eq!(r.initial, power_law().defaults());
        assert!(r.fixed.iter().all(|f| !f));
    }

    #[test]
    fn fixed_flag_without_value_keeps_default() {
        let file: ParamFile = serde_json::from_str(r#"{ "index": { "fixed": true } }"#).unwrap();
        let r = resolve_params(power_law(), Some(&file), &[], &[]).unwrap();
        assert_eq!(r.initial[2], -1.0);
        assert!(r.fixed[2]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let set = vec![("gamma".to_string(), 1.0)];
        let err = resolve_params(power_law(), None, &set, &[]).unwrap_err();
        assert_eq!(
            err,
            FitError::UnknownParameter {
                model: "PowerLaw".to_string(),
                name: "gamma".to_string()
            }
        );

        let file: ParamFile = serde_json::from_str(r#"{ "norm": 1.0 }"#).unwrap();
        assert!(resolve_params(power_law(), Some(&file), &[], &[]).is_err());
        assert!(resolve_params(power_law(), None, &[], &["nope".to_string()]).is_err());
    }

    #[test]
    fn missing_param_file_is_exit_code_2() {
        let err = read_param_file(Path::new("/definitely/not/params.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
