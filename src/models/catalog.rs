//! The model catalog: every fittable model, keyed by name.
//!
//! A [`ModelSpec`] binds a name and an ordered parameter list to a pure
//! evaluation function `f(x, θ)`. The catalog is built once and never mutated;
//! fits borrow specs from it.

use std::sync::OnceLock;

use rayon::prelude::*;
use serde::Serialize;

use super::powerlaw::{
    BrokenPl, PowerLaw2Breaks, RydeBpl, Sbpl, broken_pl, linear, power_law, power_law_2breaks,
    power_law_t0, ryde_bpl, sbpl,
};
use super::spectral::{Band, band, black_body, compt, exponential, gaussian};
use super::synchrotron::{Synchrotron, synchrotron};
use crate::error::FitError;

/// Evaluation function shared by all catalog entries.
///
/// `θ` is guaranteed to have the length of the model's parameter list.
pub type ModelFn = fn(f64, &[f64]) -> f64;

/// A named model parameter with the starting value used when a caller does not
/// provide one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f64,
}

const fn param(name: &'static str) -> ParamSpec {
    ParamSpec { name, default: 1.0 }
}

const fn param_or(name: &'static str, default: f64) -> ParamSpec {
    ParamSpec { name, default }
}

/// One fittable model.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    params: &'static [ParamSpec],
    func: ModelFn,
}

impl ModelSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Alternate lookup keys (display names used in spectral plot tables).
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        self.params
    }

    pub fn param_names(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn defaults(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.default).collect()
    }

    /// Evaluate at a single point.
    ///
    /// # Panics
    /// Panics if `theta.len() != self.param_count()`. Use
    /// [`ModelSpec::try_evaluate`] for unchecked input.
    pub fn evaluate(&self, x: f64, theta: &[f64]) -> f64 {
        assert_eq!(
            theta.len(),
            self.params.len(),
            "model {} takes {} parameters",
            self.name,
            self.params.len()
        );
        (self.func)(x, theta)
    }

    /// Evaluate at a single point, validating the parameter count.
    pub fn try_evaluate(&self, x: f64, theta: &[f64]) -> Result<f64, FitError> {
        self.check_arity(theta)?;
        Ok((self.func)(x, theta))
    }

    /// Evaluate at every point of `xs`, in order.
    pub fn evaluate_many(&self, xs: &[f64], theta: &[f64]) -> Result<Vec<f64>, FitError> {
        self.check_arity(theta)?;
        Ok(xs.iter().map(|&x| (self.func)(x, theta)).collect())
    }

    /// Like [`ModelSpec::evaluate_many`], spread over the rayon pool.
    ///
    /// Worth it for plotting grids of the integral models, where a single point
    /// costs thousands of kernel evaluations.
    pub fn evaluate_grid(&self, xs: &[f64], theta: &[f64]) -> Result<Vec<f64>, FitError> {
        self.check_arity(theta)?;
        Ok(xs.par_iter().map(|&x| (self.func)(x, theta)).collect())
    }

    fn check_arity(&self, theta: &[f64]) -> Result<(), FitError> {
        if theta.len() != self.params.len() {
            return Err(FitError::ShapeMismatch {
                what: "model parameters",
                expected: self.params.len(),
                actual: theta.len(),
            });
        }
        Ok(())
    }

    fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }

    fn matches_ignore_case(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(key))
    }
}

/// Read-only registry of models.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<ModelSpec>,
}

impl Catalog {
    /// Build the standard catalog.
    pub fn standard() -> Self {
        Self {
            models: STANDARD_MODELS.to_vec(),
        }
    }

    /// Process-wide standard catalog, built on first use.
    pub fn global() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(Catalog::standard)
    }

    /// Resolve a name or alias. Exact matches win over case-insensitive ones.
    pub fn lookup(&self, name: &str) -> Result<&ModelSpec, FitError> {
        let key = name.trim();
        self.models
            .iter()
            .find(|m| m.matches(key))
            .or_else(|| self.models.iter().find(|m| m.matches_ignore_case(key)))
            .ok_or_else(|| FitError::UnknownModel(name.to_string()))
    }

    /// Canonical names in catalog order.
    pub fn list_names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

const STANDARD_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "Linear",
        aliases: &[],
        description: "m·x + b",
        params: &[param("m"), param("b")],
        func: eval_linear,
    },
    ModelSpec {
        name: "PowerLaw",
        aliases: &["Power Law"],
        description: "A·(x/Epiv)^index",
        params: &[param("A"), param("Epiv"), param_or("index", -1.0)],
        func: eval_power_law,
    },
    ModelSpec {
        name: "PowerLawT0",
        aliases: &[],
        description: "norm·((x − t0)/pivot)^index",
        params: &[
            param("norm"),
            param_or("index", -1.0),
            param_or("t0", 0.0),
            param_or("pivot", 1.0),
        ],
        func: eval_power_law_t0,
    },
    ModelSpec {
        name: "BrokenPL",
        aliases: &[],
        description: "power law with one sharp break at breakPoint",
        params: &[
            param("norm"),
            param_or("indx1", -1.0),
            param("breakPoint"),
            param_or("indx2", -2.0),
            param_or("t0", 0.0),
            param_or("pivot", 1.0),
        ],
        func: eval_broken_pl,
    },
    ModelSpec {
        name: "PowerLaw2Breaks",
        aliases: &["Power Law w. 2 Breaks"],
        description: "power law with sharp breaks at breakE1 < breakE2",
        params: &[
            param("A"),
            param("pivot"),
            param_or("index1", -1.0),
            param("breakE1"),
            param_or("index1to2", -2.0),
            param_or("breakE2", 10.0),
            param_or("index2", -3.0),
        ],
        func: eval_power_law_2breaks,
    },
    ModelSpec {
        name: "Gaussian",
        aliases: &[],
        description: "norm·exp(−(x − mu)²/(2·sigma²))",
        params: &[param("norm"), param_or("mu", 0.0), param("sigma")],
        func: eval_gaussian,
    },
    ModelSpec {
        name: "Exponential",
        aliases: &[],
        description: "norm·exp(a·(x − x0)^b)",
        params: &[
            param("norm"),
            param_or("x0", 0.0),
            param_or("a", 1.0),
            param_or("b", -1.0),
        ],
        func: eval_exponential,
    },
    ModelSpec {
        name: "Band",
        aliases: &["Band's GRB, Epeak"],
        description: "Band GRB function (100 keV pivot)",
        params: &[
            param("A"),
            param_or("Ep", 300.0),
            param_or("alpha", -1.0),
            param_or("beta", -2.5),
        ],
        func: eval_band,
    },
    ModelSpec {
        name: "BlackBody",
        aliases: &["Black Body", "BlackBody2"],
        description: "A·x²/(exp(x/kT) − 1)",
        params: &[param("A"), param_or("kT", 30.0)],
        func: eval_black_body,
    },
    ModelSpec {
        name: "Compt",
        aliases: &["Comptonized, Epeak"],
        description: "A·exp(−x(2+index)/Ep)·(x/Epiv)^index",
        params: &[
            param("A"),
            param_or("Ep", 300.0),
            param_or("index", -1.0),
            param_or("Epiv", 100.0),
        ],
        func: eval_compt,
    },
    ModelSpec {
        name: "RydeBPL",
        aliases: &[],
        description: "smoothly broken power law in log-time (cosh blend)",
        params: &[
            param("norm"),
            param_or("indx1", -1.0),
            param_or("indx2", -2.0),
            param("breakTime"),
            param_or("delta", 0.3),
            param_or("tn", 1.0),
            param_or("t0", 0.0),
        ],
        func: eval_ryde_bpl,
    },
    ModelSpec {
        name: "sbpl",
        aliases: &["Smoothly Broken Power Law"],
        description: "smoothly broken power law (log-cosh break, energy domain)",
        params: &[
            param("logN"),
            param_or("pivot", 100.0),
            param_or("indx1", -1.0),
            param_or("breakE", 300.0),
            param_or("breakScale", 0.3),
            param_or("indx2", -2.5),
        ],
        func: eval_sbpl,
    },
    ModelSpec {
        name: "Synchrotron",
        aliases: &["Total Test Synchrotron", "TotalSynchrotron"],
        description: "synchrotron from a Maxwellian + power-law electron population",
        params: &[
            param("A"),
            param("eCrit"),
            param_or("eta", 30.0),
            param_or("index", 3.0),
            param_or("gammaTh", 10.0),
        ],
        func: eval_synchrotron,
    },
];

fn eval_linear(x: f64, p: &[f64]) -> f64 {
    linear(x, p[0], p[1])
}

fn eval_power_law(x: f64, p: &[f64]) -> f64 {
    power_law(x, p[0], p[1], p[2])
}

fn eval_power_law_t0(x: f64, p: &[f64]) -> f64 {
    power_law_t0(x, p[0], p[1], p[2], p[3])
}

fn eval_broken_pl(x: f64, p: &[f64]) -> f64 {
    broken_pl(
        x,
        &BrokenPl {
            norm: p[0],
            indx1: p[1],
            break_point: p[2],
            indx2: p[3],
            t0: p[4],
            pivot: p[5],
        },
    )
}

fn eval_power_law_2breaks(x: f64, p: &[f64]) -> f64 {
    power_law_2breaks(
        x,
        &PowerLaw2Breaks {
            a: p[0],
            pivot: p[1],
            index1: p[2],
            break_e1: p[3],
            index1to2: p[4],
            break_e2: p[5],
            index2: p[6],
        },
    )
}

fn eval_gaussian(x: f64, p: &[f64]) -> f64 {
    gaussian(x, p[0], p[1], p[2])
}

fn eval_exponential(x: f64, p: &[f64]) -> f64 {
    exponential(x, p[0], p[1], p[2], p[3])
}

fn eval_band(x: f64, p: &[f64]) -> f64 {
    band(
        x,
        &Band {
            a: p[0],
            ep: p[1],
            alpha: p[2],
            beta: p[3],
        },
    )
}

fn eval_black_body(x: f64, p: &[f64]) -> f64 {
    black_body(x, p[0], p[1])
}

fn eval_compt(x: f64, p: &[f64]) -> f64 {
    compt(x, p[0], p[1], p[2], p[3])
}

fn eval_ryde_bpl(x: f64, p: &[f64]) -> f64 {
    ryde_bpl(
        x,
        &RydeBpl {
            norm: p[0],
            indx1: p[1],
            indx2: p[2],
            break_time: p[3],
            delta: p[4],
            tn: p[5],
            t0: p[6],
        },
    )
}

fn eval_sbpl(x: f64, p: &[f64]) -> f64 {
    sbpl(
        x,
        &Sbpl {
            log_n: p[0],
            pivot: p[1],
            indx1: p[2],
            break_e: p[3],
            break_scale: p[4],
            indx2: p[5],
        },
    )
}

fn eval_synchrotron(x: f64, p: &[f64]) -> f64 {
    synchrotron(
        x,
        &Synchrotron {
            a: p[0],
            e_crit: p[1],
            eta: p[2],
            index: p[3],
            gamma_th: p[4],
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_resolves_names_and_aliases() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.lookup("Band").unwrap().name(), "Band");
        assert_eq!(catalog.lookup("Band's GRB, Epeak").unwrap().name(), "Band");
        assert_eq!(catalog.lookup("blackbody").unwrap().name(), "BlackBody");
        assert_eq!(catalog.lookup("Smoothly Broken Power Law").unwrap().name(), "sbpl");
    }

    #[test]
    fn lookup_unknown_model_fails() {
        let catalog = Catalog::standard();
        assert_eq!(
            catalog.lookup("NotAModel").unwrap_err(),
            FitError::UnknownModel("NotAModel".to_string())
        );
    }

    #[test]
    fn names_and_aliases_are_unique() {
        let catalog = Catalog::standard();
        let mut seen = HashSet::new();
        for m in catalog.iter() {
            assert!(seen.insert(m.name().to_ascii_lowercase()), "duplicate {}", m.name());
            for a in m.aliases() {
                assert!(seen.insert(a.to_ascii_lowercase()), "duplicate alias {a}");
            }
        }
        assert_eq!(catalog.list_names().len(), catalog.len());
    }

    #[test]
    fn both_power_law_forms_are_registered() {
        let catalog = Catalog::standard();
        let pl = catalog.lookup("PowerLaw").unwrap();
        let pl_t0 = catalog.lookup("PowerLawT0").unwrap();
        assert_eq!(pl.param_names(), vec!["A", "Epiv", "index"]);
        assert_eq!(pl_t0.param_names(), vec!["norm", "index", "t0", "pivot"]);
        assert!((pl.evaluate(10.0, &[5.0, 1.0, -2.0]) - 0.05).abs() < 1e-15);
        assert!((pl_t0.evaluate(10.0, &[5.0, -2.0, 0.0, 1.0]) - 0.05).abs() < 1e-15);
    }

    #[test]
    fn linear_evaluates_example() {
        let linear = Catalog::global().lookup("Linear").unwrap();
        let ys = linear.evaluate_many(&[1.0, 2.0, 3.0], &[2.0, 1.0]).unwrap();
        assert_eq!(ys, vec![3.0, 5.0, 7.0]);
        let grid = linear.evaluate_grid(&[1.0, 2.0, 3.0], &[2.0, 1.0]).unwrap();
        assert_eq!(grid, ys);
    }

    #[test]
    fn arity_is_checked() {
        let linear = Catalog::global().lookup("Linear").unwrap();
        assert!(matches!(
            linear.try_evaluate(1.0, &[1.0, 2.0, 3.0]),
            Err(FitError::ShapeMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn every_model_is_finite_at_its_defaults_on_a_typical_grid() {
        // Defaults are only starting values, but they should not produce NaN
        // on an ordinary positive energy grid.
        let catalog = Catalog::standard();
        let xs = [2.0, 5.0, 20.0, 50.0, 200.0];
        for m in catalog.iter() {
            let ys = m.evaluate_many(&xs, &m.defaults()).unwrap();
            for (x, y) in xs.iter().zip(ys.iter()) {
                assert!(!y.is_nan(), "{} at {x}: {y}", m.name());
            }
        }
    }
}
